use bridge_traits::error::BridgeError;
use core_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// A reconciliation attempt was already holding the single slot.
    /// The losing caller gets this error and no notification is sent,
    /// since nothing about the queue failed.
    #[error("Sync already in progress")]
    SyncInProgress,

    /// The remote endpoint answered the batch with a non-success status.
    #[error("Sync endpoint rejected batch with status {status}")]
    EndpointRejected { status: u16 },

    #[error("Network error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
