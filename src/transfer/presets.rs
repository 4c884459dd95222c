//! Export columns and import mappings for each record type

use crate::domain::{Faq, FromDraft, Lead, Record, StatusKind, Subscriber, Testimonial};

use super::export::ColumnSpec;
use super::import::HeaderMapping;

/// A record that can be exported to and imported from delimited text
pub trait Transferable: Record + FromDraft {
    fn columns() -> Vec<ColumnSpec<Self>>;

    fn mapping() -> HeaderMapping;
}

fn date(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

impl Transferable for Subscriber {
    fn columns() -> Vec<ColumnSpec<Self>> {
        vec![
            ColumnSpec::new("Email", |s: &Self| s.email.clone()),
            ColumnSpec::new("Name", |s: &Self| s.name.clone().unwrap_or_default()),
            ColumnSpec::new("Status", |s: &Self| s.status.as_str().to_string()),
            ColumnSpec::new("Source", |s: &Self| s.source.clone()),
            ColumnSpec::new("Tags", |s: &Self| s.tags.join(";")),
            ColumnSpec::new("Subscribed", |s: &Self| date(s.created_at)),
        ]
    }

    fn mapping() -> HeaderMapping {
        HeaderMapping::new(&["email", "name", "status", "source", "tags"], &["email"])
            .with_alias("email", "email address")
            .with_alias("name", "full name")
    }
}

impl Transferable for Lead {
    fn columns() -> Vec<ColumnSpec<Self>> {
        vec![
            ColumnSpec::new("Name", |l: &Self| l.name.clone()),
            ColumnSpec::new("Email", |l: &Self| l.email.clone()),
            ColumnSpec::new("Phone", |l: &Self| l.phone.clone().unwrap_or_default()),
            ColumnSpec::new("Source", |l: &Self| l.source.clone()),
            ColumnSpec::new("Product", |l: &Self| l.product.clone()),
            ColumnSpec::new("State", |l: &Self| l.state.clone().unwrap_or_default()),
            ColumnSpec::new("Status", |l: &Self| l.status.label().to_string()),
            ColumnSpec::new("Created", |l: &Self| date(l.created_at)),
        ]
    }

    fn mapping() -> HeaderMapping {
        HeaderMapping::new(
            &["name", "email", "phone", "source", "product", "state", "notes"],
            &["name", "email"],
        )
        .with_alias("name", "full name")
        .with_alias("phone", "phone number")
    }
}

impl Transferable for Faq {
    fn columns() -> Vec<ColumnSpec<Self>> {
        vec![
            ColumnSpec::new("Question", |f: &Self| f.question.clone()),
            ColumnSpec::new("Answer", |f: &Self| f.answer.clone()),
            ColumnSpec::new("Category", |f: &Self| f.category.clone()),
            ColumnSpec::new("Status", |f: &Self| f.status.as_str().to_string()),
        ]
    }

    fn mapping() -> HeaderMapping {
        HeaderMapping::new(&["question", "answer", "category", "status"], &["question", "answer"])
    }
}

impl Transferable for Testimonial {
    fn columns() -> Vec<ColumnSpec<Self>> {
        vec![
            ColumnSpec::new("Name", |t: &Self| t.name.clone()),
            ColumnSpec::new("Location", |t: &Self| t.location.clone().unwrap_or_default()),
            ColumnSpec::new("Product", |t: &Self| t.product.clone()),
            ColumnSpec::new("Quote", |t: &Self| t.quote.clone()),
            ColumnSpec::new("Rating", |t: &Self| t.rating.to_string()),
            ColumnSpec::new("Status", |t: &Self| t.status.as_str().to_string()),
        ]
    }

    fn mapping() -> HeaderMapping {
        HeaderMapping::new(
            &["name", "location", "product", "quote", "rating"],
            &["name", "quote", "rating"],
        )
    }
}
