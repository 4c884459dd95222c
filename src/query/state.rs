//! Query State
//!
//! Search term, filter selections and pagination cursor for one view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Filter value meaning "no constraint"
pub const ALL: &str = "all";

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    /// Raw user input; trimmed and case-folded at match time
    pub search_term: String,
    /// Filter key -> selected value. Absent keys are unconstrained.
    pub filters: BTreeMap<String, String>,
    /// 1-indexed
    pub page: usize,
    pub page_size: usize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl QueryState {
    pub fn new(page_size: usize) -> Self {
        Self {
            search_term: String::new(),
            filters: BTreeMap::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn with_search(mut self, term: &str) -> Self {
        self.set_search(term);
        self
    }

    pub fn with_filter(mut self, key: &str, value: &str) -> Self {
        self.set_filter(key, value);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    /// Update the search term; returns to the first page
    pub fn set_search(&mut self, term: &str) {
        self.search_term = term.to_string();
        self.page = 1;
    }

    /// Select a filter value; `"all"` or an empty value clears the key.
    /// Returns to the first page.
    pub fn set_filter(&mut self, key: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(ALL) {
            self.filters.remove(key);
        } else {
            self.filters.insert(key.to_string(), value.to_string());
        }
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page = 1;
    }

    /// Selected value for a key, `"all"` when unconstrained
    pub fn filter(&self, key: &str) -> &str {
        self.filters.get(key).map(String::as_str).unwrap_or(ALL)
    }

    /// Filters that actually constrain the result
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .filter(|(_, v)| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Trimmed, case-folded search term
    pub fn normalized_search(&self) -> String {
        self.search_term.trim().to_lowercase()
    }

    /// Change the page size; returns to the first page
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }
}
