//! Agency Desk
//!
//! Searchable collection views for the agency back office: newsletter
//! subscribers, agent leads, FAQs and testimonials.
//!
//! Layered architecture:
//! - domain: Records, status enums and validation
//! - query: Query state, filter/search engine, pager and suggestions
//! - repository: Data access traits and the memory, SQLite and REST backends
//! - transfer: CSV import and export
//! - view: Stateful collection views, selection, bulk actions, lead board
//! - config: JSON configuration and desk bootstrap

pub mod config;
pub mod domain;
pub mod query;
pub mod repository;
pub mod transfer;
pub mod view;

pub use config::{init_logging, load_config, save_config, BackendConfig, Desk, DeskConfig};
