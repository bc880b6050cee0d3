//! Sync Reconciler
//!
//! Drains the offline queue against the remote endpoint in one batch and
//! broadcasts the outcome to foreground contexts.

use std::sync::Arc;

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use core_runtime::events::{EngineEvent, EventBus};
use core_store::{PendingRecord, RecordId};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use crate::error::{Result, SyncError};
use crate::queue::OfflineQueue;

/// Background trigger tag that requests reconciliation. Triggers carrying
/// any other tag are ignored.
pub const SYNC_TAG: &str = "sync-entries";

/// Batch body submitted to the remote endpoint.
#[derive(Serialize)]
struct SyncBatch<'a> {
    tasks: &'a [PendingRecord],
}

/// Drains pending records against the remote endpoint.
///
/// The queue is a write-ahead log toward the endpoint: submission is
/// at-least-once, local deletion at-most-once, only after the endpoint
/// acknowledged the batch. One reconciliation runs at a time; a second
/// attempt while one is in flight fails fast with
/// [`SyncError::SyncInProgress`].
pub struct SyncReconciler {
    queue: Arc<OfflineQueue>,
    http: Arc<dyn HttpClient>,
    events: EventBus,
    endpoint: String,
    in_flight: Mutex<()>,
}

impl SyncReconciler {
    pub fn new(
        queue: Arc<OfflineQueue>,
        http: Arc<dyn HttpClient>,
        events: EventBus,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            http,
            events,
            endpoint: endpoint.into(),
            in_flight: Mutex::new(()),
        }
    }

    /// Submit every pending record as one batch and delete the accepted
    /// ones.
    ///
    /// Returns the identifiers that were acknowledged and removed; an
    /// empty queue returns an empty list without touching the network or
    /// notifying anyone. Otherwise the outcome reaches foreground
    /// subscribers as `SYNC_COMPLETED` or `SYNC_ERROR`, and a failure is
    /// re-raised afterward so the platform can reschedule its trigger.
    #[instrument(skip(self))]
    pub async fn sync_pending(&self) -> Result<Vec<RecordId>> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| SyncError::SyncInProgress)?;

        match self.drain_queue().await {
            Ok(synced) => {
                if !synced.is_empty() {
                    self.events
                        .emit(EngineEvent::SyncCompleted {
                            ids: synced.iter().map(RecordId::as_i64).collect(),
                        })
                        .ok();
                }
                Ok(synced)
            }
            Err(e) => {
                error!(error = %e, "Reconciliation failed, queue left untouched");
                self.events
                    .emit(EngineEvent::SyncError {
                        message: e.to_string(),
                    })
                    .ok();
                Err(e)
            }
        }
    }

    /// Handle a platform background trigger.
    ///
    /// Only [`SYNC_TAG`] requests reconciliation; unrelated tags return
    /// successfully without touching the queue.
    #[instrument(skip(self))]
    pub async fn handle_background_trigger(&self, tag: &str) -> Result<()> {
        if tag != SYNC_TAG {
            debug!(tag, "Ignoring unrelated background trigger");
            return Ok(());
        }

        self.sync_pending().await?;
        Ok(())
    }

    async fn drain_queue(&self) -> Result<Vec<RecordId>> {
        let pending = self.queue.list_pending().await?;
        if pending.is_empty() {
            debug!("Nothing pending, skipping network");
            return Ok(Vec::new());
        }

        // Captured before the POST: records enqueued while the batch is
        // on the wire must survive the delete.
        let submitted: Vec<RecordId> = pending.iter().map(|record| record.id).collect();

        info!(count = submitted.len(), endpoint = %self.endpoint, "Submitting batch");

        let request = HttpRequest::new(HttpMethod::Post, self.endpoint.clone())
            .json(&SyncBatch { tasks: &pending })?;
        let response = self.http.execute(request).await?;

        if !response.is_success() {
            return Err(SyncError::EndpointRejected {
                status: response.status,
            });
        }

        let deleted = self.queue.delete_by_ids(&submitted).await?;
        info!(synced = submitted.len(), deleted, "Batch acknowledged");

        Ok(submitted)
    }
}
