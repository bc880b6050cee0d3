//! Domain models for the local store
//!
//! This module contains the pending-record queue models and the cached
//! response model shared by the storage repositories.

use crate::error::StoreError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a pending record.
///
/// Caller-assigned at creation time (epoch milliseconds by convention)
/// and persisted as-is; identifiers must be unique per record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Pending Records
// =============================================================================

/// Synchronization status of a pending record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Record awaits remote acknowledgment
    Pending,
    /// Record was accepted by the remote endpoint
    Synced,
}

impl SyncStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
        }
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "synced" => Ok(Self::Synced),
            _ => Err(StoreError::InvalidStatus(s.to_string())),
        }
    }
}

/// A user-created record awaiting remote acknowledgment.
///
/// Serialized field names follow the wire contract of the sync endpoint
/// and the foreground message channel (`createdAt`, `syncStatus`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRecord {
    /// Caller-assigned identifier
    pub id: RecordId,
    /// Record title
    pub title: String,
    /// Record description
    pub description: String,
    /// ISO-8601 creation timestamp; doubles as the display sort key
    pub created_at: String,
    /// Current synchronization status
    pub sync_status: SyncStatus,
}

impl PendingRecord {
    /// Build a record in `pending` status under a caller-chosen identifier.
    pub fn new(
        id: i64,
        title: impl Into<String>,
        description: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: RecordId(id),
            title: title.into(),
            description: description.into(),
            created_at: created_at.into(),
            sync_status: SyncStatus::Pending,
        }
    }
}

// =============================================================================
// Cached Responses
// =============================================================================

/// A captured network response.
///
/// Identity (bucket, method, URL) lives outside the value; the store keys
/// rows by it and overwrites in place on re-store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code of the captured response
    pub status: u16,
    /// Response headers as received
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Bytes,
    /// Unix millis when the copy was stored
    pub stored_at: i64,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Bytes, stored_at: i64) -> Self {
        Self {
            status,
            headers,
            body,
            stored_at,
        }
    }

    /// Returns true if the status code indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The four cache bucket names of the current deployment.
///
/// A version string baked into each name is the whole eviction story:
/// activation deletes every stored bucket whose name is not in this set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketNames {
    /// Fixed assets installed up front, plus navigation copies
    pub app_shell: String,
    /// Lazily cached uncategorized resources
    pub dynamic: String,
    /// Lazily cached images
    pub image: String,
    /// API responses
    pub api_data: String,
}

impl BucketNames {
    pub fn new(
        app_shell: impl Into<String>,
        dynamic: impl Into<String>,
        image: impl Into<String>,
        api_data: impl Into<String>,
    ) -> Self {
        Self {
            app_shell: app_shell.into(),
            dynamic: dynamic.into(),
            image: image.into(),
            api_data: api_data.into(),
        }
    }

    /// The current set of valid bucket names
    pub fn current_set(&self) -> HashSet<&str> {
        HashSet::from([
            self.app_shell.as_str(),
            self.dynamic.as_str(),
            self.image.as_str(),
            self.api_data.as_str(),
        ])
    }

    /// Whether `name` is one of the current bucket names
    pub fn contains(&self, name: &str) -> bool {
        self.current_set().contains(name)
    }
}
