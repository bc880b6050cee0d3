//! Network Monitoring Abstraction
//!
//! Connectivity status and change notifications from the host platform.

use async_trait::async_trait;

use crate::error::Result;

/// Network connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// Connected to network
    Connected,
    /// Not connected to any network
    Disconnected,
    /// Connection status unknown or indeterminate
    Indeterminate,
}

/// Network monitor trait
///
/// Lets the engine observe connectivity so it can fire a reconciliation
/// attempt when the network comes back instead of waiting for the next
/// external trigger.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::network::{NetworkMonitor, NetworkStatus};
///
/// async fn should_sync(monitor: &dyn NetworkMonitor) -> bool {
///     monitor.is_connected().await
/// }
/// ```
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Get current network status
    async fn status(&self) -> Result<NetworkStatus>;

    /// Check if currently connected to any network
    async fn is_connected(&self) -> bool {
        matches!(self.status().await, Ok(NetworkStatus::Connected))
    }

    /// Subscribe to network status changes
    ///
    /// Returns a stream of status updates. Implementations should emit an
    /// event whenever connectivity changes.
    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>>;
}

/// Stream of network status changes
#[async_trait]
pub trait NetworkChangeStream: Send {
    /// Get the next status update
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<NetworkStatus>;
}
