//! # Local Store Module
//!
//! Owns the engine's durable state and provides repository patterns for
//! data access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite connection pooling and stepwise schema migrations
//! - The pending-record queue partition (`RecordStore`)
//! - The cached-response partition, split into named buckets
//!   (`ResponseCache`)
//!
//! Both partitions share one connection pool created by
//! [`db::create_pool`]; callers rely on SQLite's own transaction isolation
//! rather than engine-level locks.

pub mod db;
pub mod error;
pub mod models;
pub mod records;
pub mod responses;

pub use error::{Result, StoreError};
pub use models::{BucketNames, CachedResponse, PendingRecord, RecordId, SyncStatus};
pub use records::{RecordStore, SqliteRecordStore};
pub use responses::{ResponseCache, SqliteResponseCache};
