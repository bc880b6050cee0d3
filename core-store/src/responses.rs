//! Cached-response persistence
//!
//! Repository surface over the `cached_responses` table. Rows are keyed by
//! (bucket, method, URL); re-storing the same identity overwrites in place.
//! Eviction happens at bucket granularity only.

use crate::error::Result;
use crate::models::CachedResponse;
use async_trait::async_trait;
use bytes::Bytes;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Repository trait for cached response storage.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Look up the stored response for a request identity.
    async fn get(&self, bucket: &str, method: &str, url: &str)
        -> Result<Option<CachedResponse>>;

    /// Store a response copy, replacing any previous entry for the same
    /// identity.
    async fn put(
        &self,
        bucket: &str,
        method: &str,
        url: &str,
        response: &CachedResponse,
    ) -> Result<()>;

    /// Store a batch of (method, url, response) entries in one transaction;
    /// a failure on any entry leaves the bucket untouched.
    async fn put_all(
        &self,
        bucket: &str,
        entries: &[(String, String, CachedResponse)],
    ) -> Result<()>;

    /// Delete every entry in the named bucket, returning the number of rows
    /// removed.
    async fn delete_bucket(&self, bucket: &str) -> Result<u64>;

    /// All bucket names currently holding at least one entry.
    async fn list_bucket_names(&self) -> Result<Vec<String>>;
}

/// SQLite implementation of [`ResponseCache`].
pub struct SqliteResponseCache {
    pool: SqlitePool,
}

impl SqliteResponseCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_response(row: &SqliteRow) -> Result<CachedResponse> {
        let headers: Vec<(String, String)> =
            serde_json::from_str(row.get::<&str, _>("headers"))?;
        let body: Vec<u8> = row.get("body");

        Ok(CachedResponse {
            status: row.get::<i64, _>("status") as u16,
            headers,
            body: Bytes::from(body),
            stored_at: row.get("stored_at"),
        })
    }
}

#[async_trait]
impl ResponseCache for SqliteResponseCache {
    async fn get(
        &self,
        bucket: &str,
        method: &str,
        url: &str,
    ) -> Result<Option<CachedResponse>> {
        let row = sqlx::query(
            r#"
            SELECT status, headers, body, stored_at
            FROM cached_responses
            WHERE bucket = ? AND method = ? AND url = ?
            "#,
        )
        .bind(bucket)
        .bind(method)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_response).transpose()
    }

    async fn put(
        &self,
        bucket: &str,
        method: &str,
        url: &str,
        response: &CachedResponse,
    ) -> Result<()> {
        let headers = serde_json::to_string(&response.headers)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO cached_responses
                (bucket, method, url, status, headers, body, stored_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(bucket)
        .bind(method)
        .bind(url)
        .bind(response.status as i64)
        .bind(headers)
        .bind(response.body.as_ref())
        .bind(response.stored_at)
        .execute(&self.pool)
        .await?;

        debug!(bucket, method, url, status = response.status, "Stored response copy");
        Ok(())
    }

    async fn put_all(
        &self,
        bucket: &str,
        entries: &[(String, String, CachedResponse)],
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for (method, url, response) in entries {
            let headers = serde_json::to_string(&response.headers)?;

            sqlx::query(
                r#"
                INSERT OR REPLACE INTO cached_responses
                    (bucket, method, url, status, headers, body, stored_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(bucket)
            .bind(method)
            .bind(url)
            .bind(response.status as i64)
            .bind(headers)
            .bind(response.body.as_ref())
            .bind(response.stored_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(bucket, entries = entries.len(), "Stored response batch");
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cached_responses WHERE bucket = ?")
            .bind(bucket)
            .execute(&self.pool)
            .await?;

        debug!(bucket, deleted = result.rows_affected(), "Deleted bucket");
        Ok(result.rows_affected())
    }

    async fn list_bucket_names(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar("SELECT DISTINCT bucket FROM cached_responses")
            .fetch_all(&self.pool)
            .await?;

        Ok(names)
    }
}
