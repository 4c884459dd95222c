//! Domain Layer - Core Entity Traits
//!
//! Every record shown in a collection view implements these traits:
//! a stable string id, searchable text, discrete filter fields and a
//! closed status enum.

use std::fmt::Debug;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// Returns the entity's unique identifier
    fn id(&self) -> &str;

    /// Set the identifier (used by stores that assign ids on create)
    fn assign_id(&mut self, id: String);
}

/// Value of a filterable field on one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// The record has no value for this key
    Missing,
    One(&'a str),
    /// Multi-valued field (tags); matches when any value matches
    Many(&'a [String]),
}

impl<'a> FieldValue<'a> {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            FieldValue::Missing => false,
            FieldValue::One(v) => *v == value,
            FieldValue::Many(vs) => vs.iter().any(|v| v == value),
        }
    }

    /// All values, in field order
    pub fn values(&self) -> Vec<&'a str> {
        match *self {
            FieldValue::Missing => Vec::new(),
            FieldValue::One(v) => vec![v],
            FieldValue::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

impl<'a> From<Option<&'a str>> for FieldValue<'a> {
    fn from(value: Option<&'a str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => FieldValue::One(v),
            _ => FieldValue::Missing,
        }
    }
}

/// Text search and discrete filtering over a record
pub trait Searchable {
    /// Fields concatenated for free-text search
    fn search_fields(&self) -> Vec<&str>;

    /// Value of a filter key (`status`, `source`, `tag`, ...)
    fn filter_value(&self, key: &str) -> FieldValue<'_>;
}

/// Closed status enum carried by a record
pub trait StatusKind:
    Copy + Eq + Hash + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Every variant, in display order
    const ALL: &'static [Self];

    /// Stable lowercase name used on the wire and in filters
    fn as_str(&self) -> &'static str;

    /// Action name for `bulk-<action>` routes
    fn bulk_action(&self) -> &'static str;

    fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

/// A record managed by a collection view
pub trait Record: Entity + Searchable + Serialize + DeserializeOwned + Debug + 'static {
    type Status: StatusKind;

    /// Collection name, also the REST path segment and storage key
    const COLLECTION: &'static str;

    fn status(&self) -> Self::Status;

    fn set_status(&mut self, status: Self::Status);

    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Stamp a creation time if the record has none
    fn touch_created(&mut self, _now: DateTime<Utc>) {}
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainError {
    NotFound(String),
    InvalidInput(String),
    Conflict(String),
    /// Transport failure talking to the collaborator
    Network(String),
    Internal(String),
}

impl DomainError {
    /// Whether the collaborator could not be reached or failed as a whole
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DomainError::Network(_) | DomainError::Internal(_))
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::Network(msg) => write!(f, "Network error: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_contains() {
        let tags = vec!["vip".to_string(), "webinar".to_string()];
        assert!(FieldValue::Many(&tags).contains("webinar"));
        assert!(!FieldValue::Many(&tags).contains("web"));
        assert!(FieldValue::One("active").contains("active"));
        assert!(!FieldValue::Missing.contains(""));
    }

    #[test]
    fn test_empty_option_is_missing() {
        assert_eq!(FieldValue::from(Some("")), FieldValue::Missing);
        assert_eq!(FieldValue::from(None), FieldValue::Missing);
        assert_eq!(FieldValue::from(Some("web")), FieldValue::One("web"));
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::Network("timed out".to_string());
        assert_eq!(err.to_string(), "Network error: timed out");
        assert!(err.is_unavailable());
        assert!(!DomainError::NotFound("x".into()).is_unavailable());
    }
}
