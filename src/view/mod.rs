//! View Layer
//!
//! Stateful collection views over a repository: query, selection, bulk
//! dispatch, import/export and the lead board.

mod board;
mod bulk;
mod collection_view;
mod config;
mod selection;
mod status;

#[cfg(test)]
mod tests;

pub use board::{BoardColumn, LeadBoard, MoveOutcome};
pub use bulk::{apply as apply_bulk, BulkOperation};
pub use collection_view::{CollectionView, FetchTicket, ImportOutcome, PageView, PendingAction};
pub use config::ViewConfig;
pub use selection::SelectionSet;
pub use status::{LoadState, Notice, NoticeLevel};
