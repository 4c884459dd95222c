//! Query Layer
//!
//! Query state, the filter/search engine, the pager and search suggestions.
//! Everything here is pure and synchronous.

pub mod engine;
pub mod pager;
mod state;
mod suggest;

pub use engine::{filter, filter_options, matches, SearchPolicy};
pub use pager::{paginate, Page};
pub use state::{QueryState, ALL, DEFAULT_PAGE_SIZE};
pub use suggest::{suggest, DEFAULT_SUGGESTIONS};
