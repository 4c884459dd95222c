//! In-Memory Repository
//!
//! Vector-backed store standing in for a backend in tests and offline use.
//! Keeps insertion order.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, Record};

use super::traits::{BulkRepository, Repository, SearchableRepository, StatsRepository};

pub struct InMemoryRepository<T> {
    items: Mutex<Vec<T>>,
    next_id: AtomicU64,
}

impl<T: Record> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Seed the store. Items keep their ids.
    pub fn with_items(items: Vec<T>) -> Self {
        let next = items
            .iter()
            .filter_map(|i| i.id().parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        Self {
            items: Mutex::new(items),
            next_id: AtomicU64::new(next),
        }
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }
}

impl<T: Record> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> Repository<T> for InMemoryRepository<T> {
    async fn create(&self, entity: &T) -> DomainResult<T> {
        let mut items = self.items.lock().await;

        let mut created = entity.clone();
        if created.id().is_empty() {
            // Skip ids already taken by explicit creates
            let id = loop {
                let candidate = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
                if !items.iter().any(|i| i.id() == candidate) {
                    break candidate;
                }
            };
            created.assign_id(id);
        } else if items.iter().any(|i| i.id() == created.id()) {
            return Err(DomainError::Conflict(format!(
                "{} {} already exists",
                T::COLLECTION,
                created.id()
            )));
        }
        created.touch_created(chrono::Utc::now());

        items.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<T>> {
        let items = self.items.lock().await;
        Ok(items.iter().find(|i| i.id() == id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<T>> {
        Ok(self.items.lock().await.clone())
    }

    async fn update(&self, entity: &T) -> DomainResult<T> {
        let mut items = self.items.lock().await;
        let slot = items
            .iter_mut()
            .find(|i| i.id() == entity.id())
            .ok_or_else(|| DomainError::NotFound(format!("{} {}", T::COLLECTION, entity.id())))?;
        *slot = entity.clone();
        Ok(entity.clone())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let mut items = self.items.lock().await;
        let before = items.len();
        items.retain(|i| i.id() != id);
        if items.len() == before {
            return Err(DomainError::NotFound(format!("{} {}", T::COLLECTION, id)));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Record> BulkRepository<T> for InMemoryRepository<T> {}

#[async_trait]
impl<T: Record> StatsRepository<T> for InMemoryRepository<T> {}

#[async_trait]
impl<T: Record> SearchableRepository<T> for InMemoryRepository<T> {}
