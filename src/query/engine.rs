//! Filter/Search Engine
//!
//! Pure functions from (collection, query) to the filtered subset.
//! Source order is preserved; there is no ranking.

use serde::{Deserialize, Serialize};

use crate::domain::Searchable;

use super::state::QueryState;

/// Joins searchable fields. Never produced by typing, so a term cannot
/// match across a field boundary.
const FIELD_SEPARATOR: char = '\u{1f}';

/// How the search term is matched against a record.
/// Each view picks exactly one in its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchPolicy {
    /// The whole trimmed term must be a substring (list views)
    #[default]
    Substring,
    /// Every whitespace-separated token must be a substring (site search)
    AllTokens,
}

/// Case-folded concatenation of a record's searchable fields
pub fn haystack<T: Searchable>(item: &T) -> String {
    let mut text = String::new();
    for (i, field) in item.search_fields().into_iter().enumerate() {
        if i > 0 {
            text.push(FIELD_SEPARATOR);
        }
        text.push_str(&field.to_lowercase());
    }
    text
}

/// Whether `item` satisfies every active filter (AND)
pub fn matches_filters<T: Searchable>(item: &T, query: &QueryState) -> bool {
    query
        .active_filters()
        .all(|(key, value)| item.filter_value(key).contains(value))
}

/// Whether `item` matches an already normalized search term
pub fn matches_search<T: Searchable>(item: &T, term: &str, policy: SearchPolicy) -> bool {
    if term.is_empty() {
        return true;
    }
    let text = haystack(item);
    match policy {
        SearchPolicy::Substring => text.contains(term),
        SearchPolicy::AllTokens => term.split_whitespace().all(|token| text.contains(token)),
    }
}

pub fn matches<T: Searchable>(item: &T, query: &QueryState, policy: SearchPolicy) -> bool {
    matches_filters(item, query) && matches_search(item, &query.normalized_search(), policy)
}

/// Filtered view of `items` under `query`, in source order
pub fn filter<'a, T: Searchable>(
    items: &'a [T],
    query: &QueryState,
    policy: SearchPolicy,
) -> Vec<&'a T> {
    let term = query.normalized_search();
    items
        .iter()
        .filter(|item| matches_filters(*item, query))
        .filter(|item| matches_search(*item, &term, policy))
        .collect()
}

/// Distinct values of a filter key, first-seen order.
/// Empty when no record carries the key.
pub fn filter_options<T: Searchable>(items: &[T], key: &str) -> Vec<String> {
    let mut options: Vec<String> = Vec::new();
    for item in items {
        for value in item.filter_value(key).values() {
            if !options.iter().any(|o| o == value) {
                options.push(value.to_string());
            }
        }
    }
    options
}
