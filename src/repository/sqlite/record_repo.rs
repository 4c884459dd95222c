//! SQLite Record Repository
//!
//! Stores any `Record` as a JSON document in the `records` table, one
//! collection per record type. Deletes are soft.

use std::marker::PhantomData;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{DomainError, DomainResult, Record};
use crate::repository::traits::{
    BulkOutcome, BulkRepository, Repository, SearchableRepository, StatsRepository,
};

use super::db::SharedConnection;

fn internal(e: impl std::fmt::Display) -> DomainError {
    DomainError::Internal(e.to_string())
}

fn not_initialized() -> DomainError {
    DomainError::Internal("Database not initialized".to_string())
}

/// SQLite implementation of a record repository
pub struct SqliteRepository<T> {
    conn: SharedConnection,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> SqliteRepository<T> {
    pub fn new(conn: SharedConnection) -> Self {
        Self {
            conn,
            _marker: PhantomData,
        }
    }
}

/// Next position at the end of a collection
fn next_position(conn: &Connection, collection: &str) -> DomainResult<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1 FROM records WHERE collection = ?",
        params![collection],
        |row| row.get(0),
    )
    .map_err(internal)
}

/// Next numeric id, one past the highest all-digit id in the collection
fn next_id(conn: &Connection, collection: &str) -> DomainResult<String> {
    conn.query_row(
        "SELECT COALESCE(MAX(CAST(id AS INTEGER)), 0) + 1 FROM records
         WHERE collection = ? AND id <> '' AND id NOT GLOB '*[^0-9]*'",
        params![collection],
        |row| row.get::<_, i64>(0),
    )
    .map(|id| id.to_string())
    .map_err(internal)
}

fn decode<T: Record>(body: &str) -> DomainResult<T> {
    serde_json::from_str(body)
        .map_err(|e| DomainError::Internal(format!("Corrupt {} row: {}", T::COLLECTION, e)))
}

fn encode<T: Record>(entity: &T) -> DomainResult<String> {
    serde_json::to_string(entity).map_err(internal)
}

fn soft_delete(conn: &Connection, collection: &str, id: &str, now: i64) -> DomainResult<bool> {
    let changed = conn
        .execute(
            "UPDATE records SET deleted_at = ?, updated_at = ?
             WHERE collection = ? AND id = ? AND deleted_at IS NULL",
            params![now, now, collection, id],
        )
        .map_err(internal)?;
    Ok(changed > 0)
}

#[async_trait]
impl<T: Record> Repository<T> for SqliteRepository<T> {
    async fn create(&self, entity: &T) -> DomainResult<T> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = chrono::Utc::now();
        let mut record = entity.clone();
        if record.id().is_empty() {
            record.assign_id(next_id(conn, T::COLLECTION)?);
        }
        record.touch_created(now);

        // A soft-deleted row may still hold this id
        conn.execute(
            "DELETE FROM records WHERE collection = ? AND id = ? AND deleted_at IS NOT NULL",
            params![T::COLLECTION, record.id()],
        )
        .map_err(internal)?;

        let position = next_position(conn, T::COLLECTION)?;
        let created_at = record.created_at().map(|at| at.timestamp_millis());
        let result = conn.execute(
            "INSERT INTO records (collection, id, position, body, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                T::COLLECTION,
                record.id(),
                position,
                encode(&record)?,
                created_at,
                now.timestamp_millis()
            ],
        );

        match result {
            Ok(_) => Ok(record),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(DomainError::Conflict(format!(
                    "{} {} already exists",
                    T::COLLECTION,
                    record.id()
                )))
            }
            Err(e) => Err(internal(e)),
        }
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<T>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM records WHERE collection = ? AND id = ? AND deleted_at IS NULL",
                params![T::COLLECTION, id],
                |row| row.get(0),
            )
            .optional()
            .map_err(internal)?;

        body.as_deref().map(decode::<T>).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<T>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let mut stmt = conn
            .prepare(
                "SELECT body FROM records WHERE collection = ? AND deleted_at IS NULL
                 ORDER BY position ASC",
            )
            .map_err(internal)?;
        let mut rows = stmt.query(params![T::COLLECTION]).map_err(internal)?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(internal)? {
            let body: String = row.get(0).map_err(internal)?;
            records.push(decode(&body)?);
        }
        Ok(records)
    }

    async fn update(&self, entity: &T) -> DomainResult<T> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute(
                "UPDATE records SET body = ?, updated_at = ?
                 WHERE collection = ? AND id = ? AND deleted_at IS NULL",
                params![
                    encode(entity)?,
                    chrono::Utc::now().timestamp_millis(),
                    T::COLLECTION,
                    entity.id()
                ],
            )
            .map_err(internal)?;

        if changed == 0 {
            return Err(DomainError::NotFound(format!("{} {}", T::COLLECTION, entity.id())));
        }
        Ok(entity.clone())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        if !soft_delete(conn, T::COLLECTION, id, chrono::Utc::now().timestamp_millis())? {
            return Err(DomainError::NotFound(format!("{} {}", T::COLLECTION, id)));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Record> BulkRepository<T> for SqliteRepository<T> {
    /// Single transaction; ids that are missing count as failed
    async fn bulk_delete(&self, ids: &[String]) -> DomainResult<BulkOutcome> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        let tx = conn.transaction().map_err(internal)?;
        let now = chrono::Utc::now().timestamp_millis();
        let mut outcome = BulkOutcome::default();
        for id in ids {
            if soft_delete(&tx, T::COLLECTION, id, now)? {
                outcome.succeeded += 1;
            } else {
                outcome.failed += 1;
            }
        }
        tx.commit().map_err(internal)?;

        Ok(outcome)
    }
}

#[async_trait]
impl<T: Record> StatsRepository<T> for SqliteRepository<T> {}

#[async_trait]
impl<T: Record> SearchableRepository<T> for SqliteRepository<T> {}
