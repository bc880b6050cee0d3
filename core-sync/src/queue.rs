//! Offline Queue
//!
//! Foreground-facing CRUD surface over the pending-record partition.
//! Callers build complete records, identifier and creation timestamp
//! included; the queue pins the status and hands them to the store.

use std::sync::Arc;

use core_store::{PendingRecord, RecordId, RecordStore, SyncStatus};
use tracing::{debug, info};

use crate::error::Result;

/// Queue of user-created records awaiting reconciliation.
///
/// A record becomes durable and visible to readers the moment `enqueue`
/// returns, whatever the network state; only the reconciler ever removes
/// one.
pub struct OfflineQueue {
    records: Arc<dyn RecordStore>,
}

impl OfflineQueue {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Insert a record with status `pending`.
    ///
    /// Identifiers are caller-assigned and must be unique; epoch
    /// milliseconds at creation time is the convention. Re-enqueueing an
    /// identifier replaces the stored row. Whatever status the record
    /// arrives with, it enters the queue as `pending`.
    pub async fn enqueue(&self, record: PendingRecord) -> Result<PendingRecord> {
        let record = PendingRecord {
            sync_status: SyncStatus::Pending,
            ..record
        };

        self.records.insert(&record).await?;
        info!(id = %record.id, "Record enqueued");
        Ok(record)
    }

    /// All records still awaiting remote acknowledgment, in no
    /// particular order.
    pub async fn list_pending(&self) -> Result<Vec<PendingRecord>> {
        let pending = self.records.list_pending().await?;
        debug!(count = pending.len(), "Listed pending records");
        Ok(pending)
    }

    /// Every record, newest first; rows written before the status column
    /// existed read as `pending`.
    pub async fn list_all(&self) -> Result<Vec<PendingRecord>> {
        Ok(self.records.list_all().await?)
    }

    /// Remove the named records in one transaction.
    ///
    /// Missing identifiers are skipped silently; any failure rolls the
    /// whole transaction back, removing nothing.
    pub async fn delete_by_ids(&self, ids: &[RecordId]) -> Result<u64> {
        let deleted = self.records.delete_by_ids(ids).await?;
        debug!(requested = ids.len(), deleted, "Deleted acknowledged records");
        Ok(deleted)
    }
}
