//! Item drafts
//!
//! Untyped field bags produced by imports and add-forms, converted into
//! typed records with validation.

use std::collections::BTreeMap;

use super::entity::DomainResult;

/// Field name -> raw text value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    fields: BTreeMap<String, String>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: &str) {
        self.fields.insert(field.to_string(), value.to_string());
    }

    /// Trimmed value, empty when absent
    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(|v| v.trim()).unwrap_or("")
    }

    /// Value as entered, empty when absent
    pub fn raw(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Typed conversion from a draft
pub trait FromDraft: Sized {
    fn from_draft(draft: &Draft) -> DomainResult<Self>;
}
