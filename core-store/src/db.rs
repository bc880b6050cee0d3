//! # Database Connection Pool Module
//!
//! Provides SQLite connection pooling with optimal configuration for the
//! local store.
//!
//! ## Features
//!
//! - **WAL Mode**: Enabled for better concurrency (multiple readers, one writer)
//! - **Connection Pooling**: Configurable min/max connections with timeouts
//! - **Statement Caching**: Automatic prepared statement caching
//! - **Foreign Keys**: Enforced for referential integrity
//! - **Stepwise Migrations**: Runs on initialization from any prior version
//! - **Health Checks**: Connection validation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_store::db::{DatabaseConfig, create_pool};
//!
//! // Create a connection pool
//! let config = DatabaseConfig::new("offline.db");
//! let pool = create_pool(config).await?;
//! ```
//!
//! ## Testing
//!
//! For tests, use in-memory databases:
//!
//! ```rust,ignore
//! let pool = create_test_pool().await?;
//! ```

use crate::error::{Result, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite, SqliteConnection};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Current schema version; raise together with a new migration step.
pub const SCHEMA_VERSION: i32 = 3;

/// Database configuration for SQLite connection pool
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file path or `:memory:` for in-memory database
    pub database_url: String,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Maximum time to wait for a connection from the pool
    pub acquire_timeout: Duration,

    /// Maximum lifetime of a connection
    pub max_lifetime: Option<Duration>,

    /// Maximum idle time for a connection before being closed
    pub idle_timeout: Option<Duration>,

    /// Enable statement caching (number of statements to cache)
    pub statement_cache_capacity: usize,
}

impl DatabaseConfig {
    /// Create a new database configuration with the given file path
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let config = DatabaseConfig::new("offline.db");
    /// ```
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        let database_url = format!("sqlite:{}", path.display());

        Self {
            database_url,
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
            idle_timeout: Some(Duration::from_secs(600)),  // 10 minutes
            statement_cache_capacity: 100,
        }
    }

    /// Create a configuration for an in-memory database (useful for testing)
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            min_connections: 1,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: None,
            idle_timeout: None,
            statement_cache_capacity: 100,
        }
    }

    /// Set the minimum number of connections
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the connection acquire timeout
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the maximum connection lifetime
    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Set the idle timeout
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the statement cache capacity
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Create a configured SQLite connection pool
///
/// This function:
/// 1. Configures SQLite connection options (WAL mode, foreign keys, etc.)
/// 2. Creates a connection pool with the specified configuration
/// 3. Runs schema migrations from whatever version the file is at
/// 4. Performs a health check
///
/// # Errors
///
/// Returns an error if:
/// - The database file cannot be accessed
/// - Connection pool creation fails
/// - Migrations fail
/// - Health check fails
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        database_url = %config.database_url,
        min_connections = config.min_connections,
        max_connections = config.max_connections,
        "Creating database connection pool"
    );

    let mut connect_options =
        SqliteConnectOptions::from_str(&config.database_url).map_err(StoreError::Database)?;

    connect_options = connect_options
        // Enable WAL mode for better concurrency
        .journal_mode(SqliteJournalMode::Wal)
        // NORMAL synchronous mode for good balance of safety and speed
        .synchronous(SqliteSynchronous::Normal)
        // Enable foreign key constraints
        .foreign_keys(true)
        // Create database if it doesn't exist
        .create_if_missing(true)
        // Optimize cache size (64MB)
        .pragma("cache_size", "-64000")
        // Statement cache capacity
        .statement_cache_capacity(config.statement_cache_capacity);

    debug!("SQLite connection options configured");

    // Every connection to `:memory:` opens its own private database, so a
    // pool larger than one would hand out empty copies.
    let max_connections = if config.database_url.ends_with(":memory:") {
        1
    } else {
        config.max_connections
    };

    let pool = SqlitePoolOptions::new()
        .min_connections(config.min_connections.min(max_connections))
        .max_connections(max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create connection pool");
            StoreError::Database(e)
        })?;

    info!(
        connections = pool.size(),
        "Database connection pool created successfully"
    );

    run_migrations(&pool).await?;

    health_check(&pool).await?;

    Ok(pool)
}

/// Create a connection pool for testing with in-memory database
///
/// This is a convenience function that creates an in-memory database
/// with migrations already applied.
///
/// # Examples
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_something() {
///     let pool = create_test_pool().await.unwrap();
///     // Use pool for testing
/// }
/// ```
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    let config = DatabaseConfig::in_memory();
    create_pool(config).await
}

/// Run schema migrations
///
/// Migrations are keyed off `PRAGMA user_version` and applied stepwise, so
/// a database file written by any earlier version upgrades cleanly. Each
/// step commits together with its version bump; a crash mid-upgrade resumes
/// from the last completed step.
async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    let mut current: i32 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    if current > SCHEMA_VERSION {
        return Err(StoreError::Migration(format!(
            "Database schema version {} is newer than supported version {}",
            current, SCHEMA_VERSION
        )));
    }

    if current == SCHEMA_VERSION {
        debug!(version = current, "Database schema is current");
        return Ok(());
    }

    info!(
        from_version = current,
        to_version = SCHEMA_VERSION,
        "Running schema migrations"
    );

    while current < SCHEMA_VERSION {
        let next = current + 1;
        let mut tx = pool.begin().await?;

        match next {
            1 => apply_v1(&mut tx).await?,
            2 => apply_v2(&mut tx).await?,
            3 => apply_v3(&mut tx).await?,
            _ => {
                return Err(StoreError::Migration(format!(
                    "No migration step defined for version {}",
                    next
                )));
            }
        }

        sqlx::query(&format!("PRAGMA user_version = {}", next))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(version = next, "Applied schema migration");
        current = next;
    }

    Ok(())
}

/// v1: pending-record table with the creation-timestamp index.
///
/// Identifiers are caller-assigned, so the primary key carries no
/// AUTOINCREMENT; the store persists whatever id the record arrives with.
async fn apply_v1(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pending_records (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_pending_records_created_at
        ON pending_records(created_at)
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// v2: cached-response table keyed by (bucket, method, url).
async fn apply_v2(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cached_responses (
            bucket TEXT NOT NULL,
            method TEXT NOT NULL,
            url TEXT NOT NULL,
            status INTEGER NOT NULL,
            headers TEXT NOT NULL,
            body BLOB NOT NULL,
            stored_at INTEGER NOT NULL,
            PRIMARY KEY (bucket, method, url)
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// v3: synchronization status on pending records, with backfill.
///
/// Rows written before the column existed must read as `pending`.
async fn apply_v3(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        ALTER TABLE pending_records
        ADD COLUMN sync_status TEXT NOT NULL DEFAULT 'pending'
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        UPDATE pending_records SET sync_status = 'pending'
        WHERE sync_status IS NULL OR sync_status = ''
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_pending_records_sync_status
        ON pending_records(sync_status)
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Perform a health check on the connection pool
///
/// This executes a simple query to verify the database is accessible
/// and the pool is functioning correctly.
pub async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    debug!("Performing database health check");

    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        StoreError::Database(e)
    })?;

    debug!("Database health check passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_in_memory_pool() {
        let config = DatabaseConfig::in_memory();
        let pool = create_pool(config).await;
        assert!(pool.is_ok(), "Should create in-memory pool successfully");
    }

    #[tokio::test]
    async fn test_create_test_pool() {
        let pool = create_test_pool().await;
        assert!(pool.is_ok(), "Should create test pool successfully");
    }

    #[tokio::test]
    async fn test_memory_pool_is_shared_across_tasks() {
        let pool = create_pool(DatabaseConfig::new(":memory:")).await.unwrap();

        let writer_pool = pool.clone();
        tokio::spawn(async move {
            sqlx::query(
                "INSERT INTO pending_records (title, description, created_at) \
                 VALUES (?, ?, ?)",
            )
            .bind("From another task")
            .bind("")
            .bind("2025-01-01T00:00:00.000Z")
            .execute(&writer_pool)
            .await
            .unwrap();
        })
        .await
        .unwrap();

        let count: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM pending_records")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1, "Tasks must see one database, not private copies");
    }

    #[tokio::test]
    async fn test_health_check() {
        let pool = create_test_pool().await.unwrap();
        let result = health_check(&pool).await;
        assert!(result.is_ok(), "Health check should pass");
    }

    #[tokio::test]
    async fn test_database_config_builder() {
        let config = DatabaseConfig::in_memory()
            .min_connections(2)
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(60))
            .statement_cache_capacity(200);

        assert_eq!(config.min_connections, 2);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(60));
        assert_eq!(config.statement_cache_capacity, 200);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_test_pool().await.unwrap();

        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(result.0, 1, "Foreign keys should be enabled");
    }

    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let pool = create_test_pool().await.unwrap();

        // Note: In-memory databases use "memory" mode instead of WAL
        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();

        let mode = result.0.to_lowercase();
        assert!(
            mode == "wal" || mode == "memory",
            "Journal mode should be WAL or memory (for in-memory databases), got: {}",
            mode
        );
    }

    #[tokio::test]
    async fn test_migrations_create_tables() {
        let pool = create_test_pool().await.unwrap();

        let result: (i32,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='pending_records'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(result.0, 1, "pending_records table should exist");

        let result: (i32,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='cached_responses'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(result.0, 1, "cached_responses table should exist");
    }

    #[tokio::test]
    async fn test_migrations_set_schema_version() {
        let pool = create_test_pool().await.unwrap();

        let version: i32 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_test_pool().await.unwrap();

        // A second run against a current database is a no-op
        run_migrations(&pool).await.unwrap();

        let version: i32 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_upgrade_from_v1_backfills_status() {
        // Build a v1-era database by hand: no sync_status column yet
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE pending_records (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "CREATE INDEX idx_pending_records_created_at ON pending_records(created_at)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("PRAGMA user_version = 1")
            .execute(&pool)
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO pending_records (title, description, created_at) VALUES (?, ?, ?)",
        )
        .bind("Legacy row")
        .bind("Written before v3")
        .bind("2024-06-01T00:00:00.000Z")
        .execute(&pool)
        .await
        .unwrap();

        run_migrations(&pool).await.unwrap();

        let version: i32 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let status: String =
            sqlx::query_scalar("SELECT sync_status FROM pending_records WHERE title = ?")
                .bind("Legacy row")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "pending", "Legacy rows should read as pending");
    }

    #[tokio::test]
    async fn test_newer_schema_is_rejected() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION + 1))
            .execute(&pool)
            .await
            .unwrap();

        let result = run_migrations(&pool).await;
        assert!(matches!(result, Err(StoreError::Migration(_))));
    }
}
