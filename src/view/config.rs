//! Per-view configuration presets

use crate::domain::{Faq, Lead, Subscriber, Testimonial};
use crate::query::{SearchPolicy, DEFAULT_PAGE_SIZE};
use crate::transfer::{ColumnSpec, HeaderMapping, Transferable};

#[derive(Debug, Clone)]
pub struct ViewConfig<T> {
    pub name: &'static str,
    pub policy: SearchPolicy,
    /// Filter dropdowns, in display order
    pub filter_keys: Vec<&'static str>,
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    pub columns: Vec<ColumnSpec<T>>,
    pub mapping: HeaderMapping,
}

impl<T: Transferable> ViewConfig<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            policy: SearchPolicy::Substring,
            filter_keys: vec!["status"],
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: vec![10, 25, 50],
            columns: T::columns(),
            mapping: T::mapping(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

impl ViewConfig<Subscriber> {
    pub fn subscriber_table() -> Self {
        Self {
            filter_keys: vec!["status", "source", "tag"],
            ..Self::new("subscribers")
        }
    }
}

impl ViewConfig<Lead> {
    pub fn lead_table() -> Self {
        Self {
            filter_keys: vec!["status", "source", "product", "state"],
            ..Self::new("leads")
        }
    }

    /// Kanban columns are statuses, so the board has no status dropdown
    pub fn lead_board() -> Self {
        Self {
            filter_keys: vec!["source", "product", "state"],
            page_size: 100,
            page_size_options: vec![100],
            ..Self::new("lead-board")
        }
    }
}

impl ViewConfig<Faq> {
    pub fn faq_list() -> Self {
        Self {
            policy: SearchPolicy::AllTokens,
            filter_keys: vec!["category", "status"],
            page_size: 8,
            page_size_options: vec![8, 16],
            ..Self::new("faqs")
        }
    }
}

impl ViewConfig<Testimonial> {
    pub fn testimonial_table() -> Self {
        Self {
            filter_keys: vec!["status", "product"],
            page_size: 6,
            page_size_options: vec![6, 12, 24],
            ..Self::new("testimonials")
        }
    }
}
