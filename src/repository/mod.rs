//! Repository Layer
//!
//! Data access abstractions and implementations.

mod memory;
mod stats;
mod traits;
pub mod http;
pub mod sqlite;


pub use memory::InMemoryRepository;
pub use stats::{compute_stats, CollectionStats};
pub use traits::{
    BulkOutcome, BulkRepository, CollectionRepository, PageResult, Repository, SearchableRepository,
    StatsRepository,
};
pub use http::{HttpRepository, WireRecord};
pub use sqlite::{init_db, DbState, SqliteRepository};
