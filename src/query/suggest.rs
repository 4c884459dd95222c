//! Search suggestions for the FAQ search box

use crate::domain::Searchable;

use super::engine::{matches_search, SearchPolicy};

pub const DEFAULT_SUGGESTIONS: usize = 5;

/// First `limit` items matching every token of `term`, source order.
/// A blank term suggests nothing.
pub fn suggest<'a, T: Searchable>(items: &'a [T], term: &str, limit: usize) -> Vec<&'a T> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return vec![];
    }
    items
        .iter()
        .filter(|item| matches_search(*item, &term, SearchPolicy::AllTokens))
        .take(limit)
        .collect()
}
