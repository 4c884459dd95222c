//! Delimited text export

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::{DomainError, DomainResult};

/// One exported column: header text and how to read the cell from an item
pub struct ColumnSpec<T> {
    pub header: &'static str,
    pub value: fn(&T) -> String,
}

impl<T> ColumnSpec<T> {
    pub const fn new(header: &'static str, value: fn(&T) -> String) -> Self {
        Self { header, value }
    }
}

impl<T> Clone for ColumnSpec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ColumnSpec<T> {}

impl<T> std::fmt::Debug for ColumnSpec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnSpec").field("header", &self.header).finish()
    }
}

/// Header row plus one row per item. Every cell is quoted, embedded quotes
/// are doubled, rows are joined with `\n` and there is no trailing newline.
pub fn to_delimited_text<'a, T: 'a, I>(items: I, columns: &[ColumnSpec<T>]) -> DomainResult<String>
where
    I: IntoIterator<Item = &'a T>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let csv_err = |e: csv::Error| DomainError::Internal(format!("CSV write failed: {}", e));

    writer.write_record(columns.iter().map(|c| c.header)).map_err(csv_err)?;
    for item in items {
        writer
            .write_record(columns.iter().map(|c| (c.value)(item)))
            .map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DomainError::Internal(format!("CSV flush failed: {}", e)))?;
    let mut text = String::from_utf8(bytes).map_err(|e| DomainError::Internal(e.to_string()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}
