use thiserror::Error;

/// Errors surfaced by the engine façade, one variant per domain layer.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Storage error: {0}")]
    Store(#[from] core_store::StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] core_cache::CacheError),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
