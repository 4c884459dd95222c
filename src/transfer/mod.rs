//! Import/Export Layer
//!
//! Delimited text in and out of a collection.

mod export;
mod import;
mod presets;

pub use export::{to_delimited_text, ColumnSpec};
pub use import::{import_records, parse, HeaderMapping, ImportReport, ParseReport};
pub use presets::Transferable;
