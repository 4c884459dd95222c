//! Field validation shared by forms, imports and the wire boundary

use std::sync::OnceLock;

use regex::Regex;

use super::entity::{DomainError, DomainResult};

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

/// Trimmed, lowercased email or `InvalidInput`
pub fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim();
    if !is_valid_email(email) {
        return Err(DomainError::InvalidInput(format!("Invalid email: {:?}", email)));
    }
    Ok(email.to_lowercase())
}

/// Trimmed non-empty text or `InvalidInput` naming the field
pub fn require(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// `None` for blank input
pub fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
