//! Bulk Operation Dispatcher

use crate::domain::{DomainResult, Record, StatusKind};
use crate::repository::{BulkOutcome, BulkRepository};

/// A mutation applied to every selected id. Export is not a mutation and
/// lives on the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOperation<S> {
    Delete,
    SetStatus(S),
}

impl<S: StatusKind> BulkOperation<S> {
    /// Destructive operations go through a confirmation gate first
    pub fn is_destructive(&self) -> bool {
        matches!(self, BulkOperation::Delete)
    }

    pub fn describe(&self) -> String {
        match self {
            BulkOperation::Delete => "delete".to_string(),
            BulkOperation::SetStatus(status) => format!("mark {}", status.as_str()),
        }
    }
}

/// Dispatch one operation over `ids`. No confirmation happens here.
pub async fn apply<T, R>(
    repo: &R,
    operation: BulkOperation<T::Status>,
    ids: &[String],
) -> DomainResult<BulkOutcome>
where
    T: Record,
    R: ?Sized + BulkRepository<T>,
{
    if ids.is_empty() {
        return Ok(BulkOutcome::default());
    }
    log::info!("Bulk {} on {} {}", operation.describe(), ids.len(), T::COLLECTION);
    match operation {
        BulkOperation::Delete => repo.bulk_delete(ids).await,
        BulkOperation::SetStatus(status) => repo.bulk_set_status(ids, status).await,
    }
}
