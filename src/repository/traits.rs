//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Implementations can use SQLite, in-memory, a REST API, etc.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult, Entity, Record};
use crate::query::{self, QueryState, SearchPolicy};

use super::stats::{compute_stats, CollectionStats};

/// Core repository trait for CRUD operations
///
/// Generic over any Entity type.
/// All operations are async to support various backends.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Create a new entity; stores assign an id when it is empty
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<T>>;

    /// List all entities, in collection order
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID
    async fn delete(&self, id: &str) -> DomainResult<()>;
}

/// Result of a bulk mutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

impl BulkOutcome {
    pub fn is_partial(&self) -> bool {
        self.succeeded > 0 && self.failed > 0
    }
}

/// Tallies per-id results of a bulk mutation done one call at a time.
///
/// Ids that fail with `NotFound`/`InvalidInput` count as failed. If nothing
/// succeeded and the store itself was unavailable, the whole call failed.
#[derive(Debug, Default)]
struct BulkTally {
    outcome: BulkOutcome,
    unavailable: Option<DomainError>,
}

impl BulkTally {
    fn record(&mut self, result: DomainResult<()>) {
        match result {
            Ok(()) => self.outcome.succeeded += 1,
            Err(e) => {
                self.outcome.failed += 1;
                if e.is_unavailable() {
                    self.unavailable.get_or_insert(e);
                }
            }
        }
    }

    fn finish(self) -> DomainResult<BulkOutcome> {
        match self.unavailable {
            Some(e) if self.outcome.succeeded == 0 => Err(e),
            _ => Ok(self.outcome),
        }
    }
}

/// Bulk mutations over a set of ids.
///
/// The defaults issue one call per id; backends with a native bulk call
/// override them.
#[async_trait]
pub trait BulkRepository<T: Record>: Repository<T> {
    async fn bulk_delete(&self, ids: &[String]) -> DomainResult<BulkOutcome> {
        let mut tally = BulkTally::default();
        for id in ids {
            tally.record(self.delete(id).await);
        }
        tally.finish()
    }

    async fn bulk_set_status(
        &self,
        ids: &[String],
        status: T::Status,
    ) -> DomainResult<BulkOutcome> {
        let mut tally = BulkTally::default();
        for id in ids {
            let result = match self.find_by_id(id).await {
                Ok(Some(mut entity)) => {
                    entity.set_status(status);
                    self.update(&entity).await.map(|_| ())
                }
                Ok(None) => Err(DomainError::NotFound(format!("{} {}", T::COLLECTION, id))),
                Err(e) => Err(e),
            };
            tally.record(result);
        }
        tally.finish()
    }
}

/// Aggregate counts for dashboard cards
#[async_trait]
pub trait StatsRepository<T: Record>: Repository<T> {
    async fn stats(&self) -> DomainResult<CollectionStats> {
        let items = self.list().await?;
        Ok(compute_stats(&items, chrono::Utc::now()))
    }
}

/// One page of a server-side query
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Extension for repositories that support text search
#[async_trait]
pub trait SearchableRepository<T: Record>: Repository<T> {
    /// Filter, search and paginate. The default runs the local engine over
    /// `list()`; remote backends push the query to the server.
    async fn search(
        &self,
        query: &QueryState,
        policy: SearchPolicy,
    ) -> DomainResult<PageResult<T>> {
        let items = self.list().await?;
        let filtered: Vec<T> = query::filter(&items, query, policy).into_iter().cloned().collect();
        let requested = i64::try_from(query.page).unwrap_or(i64::MAX);
        let page = query::paginate(&filtered, requested, query.page_size);
        Ok(PageResult {
            items: page.items.to_vec(),
            page: page.clamped_page,
            limit: page.page_size,
            total: page.total_items,
            total_pages: page.total_pages,
        })
    }
}

/// Everything a collection view needs from its collaborator
pub trait CollectionRepository<T: Record>:
    BulkRepository<T> + StatsRepository<T> + SearchableRepository<T>
{
}

impl<T, R> CollectionRepository<T> for R
where
    T: Record,
    R: BulkRepository<T> + StatsRepository<T> + SearchableRepository<T>,
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_missing_ids_as_failed() {
        let mut tally = BulkTally::default();
        tally.record(Ok(()));
        tally.record(Err(DomainError::NotFound("x".into())));
        assert_eq!(tally.finish().unwrap(), BulkOutcome { succeeded: 1, failed: 1 });
    }

    #[test]
    fn test_tally_total_outage_is_error() {
        let mut tally = BulkTally::default();
        tally.record(Err(DomainError::Network("down".into())));
        tally.record(Err(DomainError::Network("down".into())));
        assert_eq!(tally.finish(), Err(DomainError::Network("down".into())));
    }

    #[test]
    fn test_tally_outage_after_success_is_partial() {
        let mut tally = BulkTally::default();
        tally.record(Ok(()));
        tally.record(Err(DomainError::Network("down".into())));
        let outcome = tally.finish().unwrap();
        assert!(outcome.is_partial());
    }
}
