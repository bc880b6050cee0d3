//! Pending-record persistence
//!
//! Repository surface over the `pending_records` table. Records enter with
//! status `pending` under caller-assigned identifiers, leave by
//! identifier-list deletion after the remote endpoint acknowledges them,
//! and are never mutated in between.

use crate::error::Result;
use crate::models::{PendingRecord, RecordId, SyncStatus};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Repository trait for pending-record operations.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a record under its caller-assigned identifier. A row already
    /// holding that identifier is replaced wholesale; identifiers are
    /// caller-unique, so a collision is a rewrite of the same record.
    async fn insert(&self, record: &PendingRecord) -> Result<()>;

    /// All records currently in `pending` status. Order is unspecified;
    /// callers sort by the timestamp field where display order matters.
    async fn list_pending(&self) -> Result<Vec<PendingRecord>>;

    /// Every record, newest first. Rows carrying an unknown status value
    /// (written under an older schema) read as `pending`.
    async fn list_all(&self) -> Result<Vec<PendingRecord>>;

    /// Find a record by identifier.
    async fn find_by_id(&self, id: RecordId) -> Result<Option<PendingRecord>>;

    /// Delete the named records in one transaction, returning the number of
    /// rows removed. If any deletion fails the whole transaction rolls back
    /// and no record is removed.
    async fn delete_by_ids(&self, ids: &[RecordId]) -> Result<u64>;
}

/// SQLite implementation of [`RecordStore`].
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &SqliteRow) -> PendingRecord {
        // Unknown status values read as pending (older-schema rows)
        let sync_status = row
            .get::<String, _>("sync_status")
            .parse()
            .unwrap_or(SyncStatus::Pending);

        PendingRecord {
            id: RecordId(row.get("id")),
            title: row.get("title"),
            description: row.get("description"),
            created_at: row.get("created_at"),
            sync_status,
        }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: &PendingRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO pending_records
                (id, title, description, created_at, sync_status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.as_i64())
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.created_at)
        .bind(record.sync_status.as_str())
        .execute(&self.pool)
        .await?;

        debug!(record_id = %record.id, "Inserted pending record");
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<PendingRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, created_at, sync_status
            FROM pending_records
            WHERE sync_status = ?
            "#,
        )
        .bind(SyncStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_record).collect())
    }

    async fn list_all(&self) -> Result<Vec<PendingRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, created_at, sync_status
            FROM pending_records
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_record).collect())
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<PendingRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, created_at, sync_status
            FROM pending_records
            WHERE id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::row_to_record))
    }

    async fn delete_by_ids(&self, ids: &[RecordId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut deleted = 0u64;

        for id in ids {
            let result = sqlx::query("DELETE FROM pending_records WHERE id = ?")
                .bind(id.as_i64())
                .execute(&mut *tx)
                .await?;
            deleted += result.rows_affected();
        }

        tx.commit().await?;

        debug!(requested = ids.len(), deleted, "Deleted pending records");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn record(id: i64, title: &str, created_at: &str) -> PendingRecord {
        PendingRecord::new(id, title, format!("{} description", title), created_at)
    }

    #[tokio::test]
    async fn test_insert_preserves_caller_assigned_id() {
        let pool = create_test_pool().await.unwrap();
        let store = SqliteRecordStore::new(pool);

        store
            .insert(&record(1001, "First", "2025-01-15T10:00:00.000Z"))
            .await
            .unwrap();

        let found = store.find_by_id(RecordId(1001)).await.unwrap().unwrap();
        assert_eq!(found.id, RecordId(1001));
        assert_eq!(found.title, "First");
        assert_eq!(found.sync_status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn test_insert_same_id_replaces_the_row() {
        let pool = create_test_pool().await.unwrap();
        let store = SqliteRecordStore::new(pool);

        store
            .insert(&record(1001, "Original", "2025-01-15T10:00:00.000Z"))
            .await
            .unwrap();
        store
            .insert(&record(1001, "Rewritten", "2025-01-15T10:05:00.000Z"))
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Rewritten");
        assert_eq!(all[0].created_at, "2025-01-15T10:05:00.000Z");
    }

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let pool = create_test_pool().await.unwrap();
        let store = SqliteRecordStore::new(pool);

        let inserted = record(7, "Find me", "2025-01-15T10:00:00.000Z");
        store.insert(&inserted).await.unwrap();

        let found = store.find_by_id(inserted.id).await.unwrap();
        assert_eq!(found, Some(inserted));

        let missing = store.find_by_id(RecordId(9999)).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_pending_filters_by_status() {
        let pool = create_test_pool().await.unwrap();
        let store = SqliteRecordStore::new(pool.clone());

        let kept = record(1, "Still pending", "2025-01-15T10:00:00.000Z");
        let acked = record(2, "Already synced", "2025-01-15T10:01:00.000Z");
        store.insert(&kept).await.unwrap();
        store.insert(&acked).await.unwrap();

        // Flip one row by hand; nothing in the public API writes `synced`
        sqlx::query("UPDATE pending_records SET sync_status = 'synced' WHERE id = ?")
            .bind(acked.id.as_i64())
            .execute(&pool)
            .await
            .unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_list_all_orders_newest_first() {
        let pool = create_test_pool().await.unwrap();
        let store = SqliteRecordStore::new(pool);

        store
            .insert(&record(1, "Oldest", "2025-01-15T09:00:00.000Z"))
            .await
            .unwrap();
        store
            .insert(&record(2, "Newest", "2025-01-15T11:00:00.000Z"))
            .await
            .unwrap();
        store
            .insert(&record(3, "Middle", "2025-01-15T10:00:00.000Z"))
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        let titles: Vec<&str> = all.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest", "Middle", "Oldest"]);
    }

    #[tokio::test]
    async fn test_list_all_defaults_unknown_status_to_pending() {
        let pool = create_test_pool().await.unwrap();
        let store = SqliteRecordStore::new(pool.clone());

        let odd = record(1, "Odd row", "2025-01-15T10:00:00.000Z");
        store.insert(&odd).await.unwrap();

        sqlx::query("UPDATE pending_records SET sync_status = 'mystery' WHERE id = ?")
            .bind(odd.id.as_i64())
            .execute(&pool)
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all[0].sync_status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn test_delete_by_ids_removes_exactly_named() {
        let pool = create_test_pool().await.unwrap();
        let store = SqliteRecordStore::new(pool);

        let a = record(1, "A", "2025-01-15T10:00:00.000Z");
        let b = record(2, "B", "2025-01-15T10:01:00.000Z");
        let c = record(3, "C", "2025-01-15T10:02:00.000Z");
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();
        store.insert(&c).await.unwrap();

        let deleted = store.delete_by_ids(&[a.id, c.id]).await.unwrap();
        assert_eq!(deleted, 2);

        let remaining = store.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b.id);
    }

    #[tokio::test]
    async fn test_delete_by_ids_empty_is_noop() {
        let pool = create_test_pool().await.unwrap();
        let store = SqliteRecordStore::new(pool);

        let deleted = store.delete_by_ids(&[]).await.unwrap();
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn test_delete_by_ids_tolerates_missing_ids() {
        let pool = create_test_pool().await.unwrap();
        let store = SqliteRecordStore::new(pool);

        let a = record(1, "A", "2025-01-15T10:00:00.000Z");
        store.insert(&a).await.unwrap();

        let deleted = store.delete_by_ids(&[a.id, RecordId(555)]).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
