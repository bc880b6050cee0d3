//! Cache error types

use bridge_traits::error::BridgeError;
use core_store::StoreError;
use thiserror::Error;

/// Routing and strategy errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Network layer failure surfaced by the host HTTP client
    #[error("Network error: {0}")]
    Bridge(#[from] BridgeError),

    /// Storage layer failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Upstream answered with a status the strategy refuses to serve
    #[error("Upstream returned status {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    /// Background revalidation task was cancelled or panicked
    #[error("Revalidation failed: {0}")]
    Revalidation(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
