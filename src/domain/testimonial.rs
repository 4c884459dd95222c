//! Testimonial Entity
//!
//! Customer quotes awaiting moderation before they appear on product pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draft::{Draft, FromDraft};
use super::entity::{DomainError, DomainResult, Entity, FieldValue, Record, Searchable, StatusKind};
use super::validation::{optional, require};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestimonialStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl StatusKind for TestimonialStatus {
    const ALL: &'static [Self] = &[
        TestimonialStatus::Pending,
        TestimonialStatus::Approved,
        TestimonialStatus::Rejected,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TestimonialStatus::Pending => "pending",
            TestimonialStatus::Approved => "approved",
            TestimonialStatus::Rejected => "rejected",
        }
    }

    fn bulk_action(&self) -> &'static str {
        match self {
            TestimonialStatus::Pending => "reset",
            TestimonialStatus::Approved => "approve",
            TestimonialStatus::Rejected => "reject",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub product: String,
    pub quote: String,
    /// Star rating, 1 to 5
    pub rating: u8,
    pub status: TestimonialStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Testimonial {
    pub const MAX_RATING: u8 = 5;

    pub fn new(id: &str, name: &str, product: &str, quote: &str, rating: u8) -> DomainResult<Self> {
        if !(1..=Self::MAX_RATING).contains(&rating) {
            return Err(DomainError::InvalidInput(format!("Rating out of range: {}", rating)));
        }
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            location: None,
            product: product.to_string(),
            quote: quote.to_string(),
            rating,
            status: TestimonialStatus::Pending,
            created_at: None,
        })
    }
}

impl Entity for Testimonial {
    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Searchable for Testimonial {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.location.as_deref());
        fields.push(&self.product);
        fields.push(&self.quote);
        fields
    }

    fn filter_value(&self, key: &str) -> FieldValue<'_> {
        match key {
            "status" => FieldValue::One(self.status.as_str()),
            "product" => FieldValue::from(Some(self.product.as_str())),
            _ => FieldValue::Missing,
        }
    }
}

impl Record for Testimonial {
    type Status = TestimonialStatus;
    const COLLECTION: &'static str = "testimonials";

    fn status(&self) -> TestimonialStatus {
        self.status
    }

    fn set_status(&mut self, status: TestimonialStatus) {
        self.status = status;
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn touch_created(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
    }
}

impl FromDraft for Testimonial {
    fn from_draft(draft: &Draft) -> DomainResult<Self> {
        let name = require("name", draft.get("name"))?;
        let quote = require("quote", draft.get("quote"))?;
        let product = optional(draft.get("product")).unwrap_or_else(|| "general".to_string());
        let rating = draft.get("rating").parse::<u8>().map_err(|_| {
            DomainError::InvalidInput(format!("Invalid rating: {:?}", draft.get("rating")))
        })?;

        let mut testimonial = Testimonial::new("", &name, &product, &quote, rating)?;
        testimonial.location = optional(draft.get("location"));
        Ok(testimonial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(Testimonial::new("1", "Cy", "annuity", "Great", 0).is_err());
        assert!(Testimonial::new("1", "Cy", "annuity", "Great", 6).is_err());
        let t = Testimonial::new("1", "Cy", "annuity", "Great", 5).unwrap();
        assert_eq!(t.status, TestimonialStatus::Pending);
    }

    #[test]
    fn test_from_draft_rating() {
        let draft = Draft::new().with("name", "Cy").with("quote", "Helpful").with("rating", "4");
        assert_eq!(Testimonial::from_draft(&draft).unwrap().rating, 4);
        let bad = Draft::new().with("name", "Cy").with("quote", "Helpful").with("rating", "great");
        assert!(Testimonial::from_draft(&bad).is_err());
    }
}
