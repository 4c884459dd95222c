//! SQLite Backend
//!
//! Local persistence for every collection in a single database file.

mod db;
mod record_repo;

pub use db::{init_db, DbState, SharedConnection};
pub use record_repo::SqliteRepository;
