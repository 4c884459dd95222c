//! Delimited text import
//!
//! Turns an uploaded file into drafts. Bad rows are counted, never fatal.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

use crate::domain::{Draft, FromDraft};

/// How file headers map onto draft fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMapping {
    /// Draft field -> accepted header names (case-insensitive). The field
    /// name itself always matches.
    pub fields: Vec<(String, Vec<String>)>,
    /// Rows lacking any of these are rejected
    pub required: Vec<String>,
}

impl HeaderMapping {
    pub fn new(fields: &[&str], required: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| (f.to_string(), Vec::new())).collect(),
            required: required.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn with_alias(mut self, field: &str, alias: &str) -> Self {
        if let Some((_, aliases)) = self.fields.iter_mut().find(|(f, _)| f == field) {
            aliases.push(alias.to_string());
        }
        self
    }

    /// Field name for a header cell, if mapped
    pub fn field_for(&self, header: &str) -> Option<&str> {
        let header = header.trim().to_lowercase();
        self.fields
            .iter()
            .find(|(field, aliases)| {
                field.to_lowercase() == header || aliases.iter().any(|a| a.to_lowercase() == header)
            })
            .map(|(field, _)| field.as_str())
    }
}

/// Outcome of parsing a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub valid: Vec<Draft>,
    pub rejected: usize,
}

/// Outcome of converting drafts into typed records
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport<T> {
    pub records: Vec<T>,
    pub rejected: usize,
}

impl<T> ImportReport<T> {
    pub fn summary(&self) -> String {
        format!("{} imported, {} rejected", self.records.len(), self.rejected)
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

/// Parse delimited text. The first non-blank row is the header.
pub fn parse(text: &str, mapping: &HeaderMapping) -> ParseReport {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());

    let mut report = ParseReport::default();
    // Column index -> draft field
    let mut columns: Option<Vec<Option<String>>> = None;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Unreadable import row: {}", e);
                if columns.is_some() {
                    report.rejected += 1;
                }
                continue;
            }
        };
        if is_blank(&record) {
            continue;
        }

        if columns.is_none() {
            columns = Some(
                record.iter().map(|h| mapping.field_for(h).map(str::to_string)).collect(),
            );
            continue;
        }
        let Some(fields) = columns.as_ref() else {
            continue;
        };

        let mut draft = Draft::new();
        for (index, field) in fields.iter().enumerate() {
            if let Some(field) = field {
                // Short rows read as empty trailing cells
                draft.set(field, record.get(index).unwrap_or(""));
            }
        }

        if mapping.required.iter().all(|f| draft.has(f)) {
            report.valid.push(draft);
        } else {
            report.rejected += 1;
        }
    }

    report
}

/// Convert parsed drafts; drafts that fail validation are rejected too
pub fn import_records<T: FromDraft>(report: ParseReport) -> ImportReport<T> {
    let mut rejected = report.rejected;
    let mut records = Vec::with_capacity(report.valid.len());
    for draft in &report.valid {
        match T::from_draft(draft) {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("Rejected import row: {}", e);
                rejected += 1;
            }
        }
    }
    ImportReport { records, rejected }
}
