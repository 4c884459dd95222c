//! Wire Format
//!
//! Typed shapes of the REST API and the mapping to domain records.
//! Every response is validated here, so nothing past this module looks at
//! raw field names.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::validation::normalize_email;
use crate::domain::{
    DomainError, DomainResult, Faq, Lead, Record, StatusKind, Subscriber, Testimonial,
};
use crate::repository::stats::CollectionStats;
use crate::repository::traits::{BulkOutcome, PageResult};

/// A record with an API representation
pub trait WireRecord: Record {
    type Wire: Serialize + DeserializeOwned + Send + Sync + 'static;

    fn from_wire(wire: Self::Wire) -> DomainResult<Self>;

    fn to_wire(&self) -> Self::Wire;
}

/// Ids arrive as strings from some endpoints and numbers from others
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl Default for WireId {
    fn default() -> Self {
        WireId::Text(String::new())
    }
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

fn parse_status<S: StatusKind>(raw: &str) -> DomainResult<S> {
    S::parse(raw).ok_or_else(|| DomainError::InvalidInput(format!("Unknown status: {:?}", raw)))
}

fn parse_time(raw: Option<String>) -> DomainResult<Option<DateTime<Utc>>> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            DateTime::parse_from_rfc3339(s.trim())
                .map(|at| at.with_timezone(&Utc))
                .map_err(|e| DomainError::InvalidInput(format!("Bad timestamp {:?}: {}", s, e)))
        })
        .transpose()
}

fn format_time(at: Option<DateTime<Utc>>) -> Option<String> {
    at.map(|at| at.to_rfc3339())
}

// ========================
// Envelopes
// ========================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationDto {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "W: DeserializeOwned"))]
pub struct ListEnvelope<W> {
    pub items: Vec<W>,
    pub pagination: PaginationDto,
}

/// Mutation responses come bare or wrapped in `{ "item": ... }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged, bound(deserialize = "W: DeserializeOwned"))]
pub enum ItemEnvelope<W> {
    Wrapped {
        #[serde(alias = "data")]
        item: W,
    },
    Bare(W),
}

impl<W> ItemEnvelope<W> {
    pub fn into_inner(self) -> W {
        match self {
            ItemEnvelope::Wrapped { item } => item,
            ItemEnvelope::Bare(item) => item,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkRequest<'a> {
    pub ids: &'a [String],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkResponseDto {
    #[serde(alias = "deleted", alias = "updated", alias = "count")]
    pub affected: usize,
    #[serde(default)]
    pub failed: Option<usize>,
}

impl BulkResponseDto {
    pub fn into_outcome(self, requested: usize) -> BulkOutcome {
        let succeeded = self.affected.min(requested);
        BulkOutcome {
            succeeded,
            failed: self.failed.unwrap_or(requested - succeeded),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsDto {
    pub total: usize,
    #[serde(default)]
    pub by_status: BTreeMap<String, usize>,
    #[serde(default)]
    pub new_last_7_days: usize,
    #[serde(default)]
    pub new_last_30_days: usize,
}

impl StatsDto {
    /// Every known status is present in the result, unknown ones dropped
    pub fn into_stats<S: StatusKind>(self) -> CollectionStats {
        let by_status = S::ALL
            .iter()
            .map(|s| {
                let count = self.by_status.get(s.as_str()).copied().unwrap_or(0);
                (s.as_str().to_string(), count)
            })
            .collect();
        CollectionStats {
            total: self.total,
            by_status,
            new_last_7_days: self.new_last_7_days,
            new_last_30_days: self.new_last_30_days,
        }
    }
}

/// Convert a list envelope, dropping rows that fail validation
pub fn page_from_wire<T: WireRecord>(envelope: ListEnvelope<T::Wire>) -> PageResult<T> {
    let mut items = Vec::with_capacity(envelope.items.len());
    for wire in envelope.items {
        match T::from_wire(wire) {
            Ok(item) => items.push(item),
            Err(e) => log::warn!("Skipping invalid {} row: {}", T::COLLECTION, e),
        }
    }
    PageResult {
        items,
        page: envelope.pagination.page.max(1),
        limit: envelope.pagination.limit,
        total: envelope.pagination.total,
        total_pages: envelope.pagination.total_pages.max(1),
    }
}

// ========================
// Record DTOs
// ========================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriberDto {
    #[serde(default)]
    pub id: WireId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl WireRecord for Subscriber {
    type Wire = SubscriberDto;

    fn from_wire(wire: SubscriberDto) -> DomainResult<Self> {
        Ok(Subscriber {
            id: wire.id.into_string(),
            email: normalize_email(&wire.email)?,
            name: wire.name.filter(|n| !n.trim().is_empty()),
            status: parse_status(&wire.status)?,
            source: wire.source.unwrap_or_default(),
            tags: wire.tags,
            created_at: parse_time(wire.created_at)?,
        })
    }

    fn to_wire(&self) -> SubscriberDto {
        SubscriberDto {
            id: WireId::Text(self.id.clone()),
            email: self.email.clone(),
            name: self.name.clone(),
            status: self.status.as_str().to_string(),
            source: Some(self.source.clone()),
            tags: self.tags.clone(),
            created_at: format_time(self.created_at),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadDto {
    #[serde(default)]
    pub id: WireId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl WireRecord for Lead {
    type Wire = LeadDto;

    fn from_wire(wire: LeadDto) -> DomainResult<Self> {
        if wire.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("Lead without name".to_string()));
        }
        Ok(Lead {
            id: wire.id.into_string(),
            name: wire.name.trim().to_string(),
            email: normalize_email(&wire.email)?,
            phone: wire.phone,
            source: wire.source.unwrap_or_default(),
            product: wire.product.unwrap_or_default(),
            state: wire.state,
            notes: wire.notes,
            status: parse_status(&wire.status)?,
            created_at: parse_time(wire.created_at)?,
        })
    }

    fn to_wire(&self) -> LeadDto {
        LeadDto {
            id: WireId::Text(self.id.clone()),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            source: Some(self.source.clone()),
            product: Some(self.product.clone()),
            state: self.state.clone(),
            notes: self.notes.clone(),
            status: self.status.as_str().to_string(),
            created_at: format_time(self.created_at),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaqDto {
    #[serde(default)]
    pub id: WireId,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl WireRecord for Faq {
    type Wire = FaqDto;

    fn from_wire(wire: FaqDto) -> DomainResult<Self> {
        let status = match wire.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => Default::default(),
        };
        Ok(Faq {
            id: wire.id.into_string(),
            question: wire.question,
            answer: wire.answer,
            category: wire.category.unwrap_or_else(|| "general".to_string()),
            keywords: wire.keywords,
            status,
        })
    }

    fn to_wire(&self) -> FaqDto {
        FaqDto {
            id: WireId::Text(self.id.clone()),
            question: self.question.clone(),
            answer: self.answer.clone(),
            category: Some(self.category.clone()),
            keywords: self.keywords.clone(),
            status: Some(self.status.as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestimonialDto {
    #[serde(default)]
    pub id: WireId,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    pub quote: String,
    pub rating: u8,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl WireRecord for Testimonial {
    type Wire = TestimonialDto;

    fn from_wire(wire: TestimonialDto) -> DomainResult<Self> {
        let mut testimonial = Testimonial::new(
            &wire.id.into_string(),
            &wire.name,
            wire.product.as_deref().unwrap_or("general"),
            &wire.quote,
            wire.rating,
        )?;
        testimonial.location = wire.location;
        testimonial.status = parse_status(&wire.status)?;
        testimonial.created_at = parse_time(wire.created_at)?;
        Ok(testimonial)
    }

    fn to_wire(&self) -> TestimonialDto {
        TestimonialDto {
            id: WireId::Text(self.id.clone()),
            name: self.name.clone(),
            location: self.location.clone(),
            product: Some(self.product.clone()),
            quote: self.quote.clone(),
            rating: self.rating,
            status: self.status.as_str().to_string(),
            created_at: format_time(self.created_at),
        }
    }
}
