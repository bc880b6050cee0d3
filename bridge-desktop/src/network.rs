//! Network Monitoring Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    network::{NetworkChangeStream, NetworkMonitor, NetworkStatus},
};
use std::time::Duration;
use tracing::debug;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Desktop network monitor implementation
///
/// Connectivity is detected with a TCP probe to a public resolver. Change
/// subscriptions poll at a fixed interval and emit only on status edges.
///
/// Note: platform-specific watchers (Linux netlink, macOS
/// SystemConfiguration, Windows WinAPI) would be more precise but require
/// additional dependencies.
pub struct DesktopNetworkMonitor {
    poll_interval: Duration,
}

impl DesktopNetworkMonitor {
    /// Create a new network monitor
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Create a monitor with a custom change-poll interval
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    async fn probe(&self) -> NetworkStatus {
        match tokio::time::timeout(
            PROBE_TIMEOUT,
            tokio::net::TcpStream::connect("8.8.8.8:53"),
        )
        .await
        {
            Ok(Ok(_)) => NetworkStatus::Connected,
            Ok(Err(_)) => NetworkStatus::Disconnected,
            Err(_) => NetworkStatus::Disconnected,
        }
    }
}

impl Default for DesktopNetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkMonitor for DesktopNetworkMonitor {
    async fn status(&self) -> Result<NetworkStatus> {
        let status = self.probe().await;
        debug!(status = ?status, "Network status probed");
        Ok(status)
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>> {
        Ok(Box::new(PollingChangeStream {
            monitor: DesktopNetworkMonitor::with_poll_interval(self.poll_interval),
            last_status: None,
        }))
    }
}

/// Network change stream that polls for changes
struct PollingChangeStream {
    monitor: DesktopNetworkMonitor,
    last_status: Option<NetworkStatus>,
}

#[async_trait]
impl NetworkChangeStream for PollingChangeStream {
    async fn next(&mut self) -> Option<NetworkStatus> {
        loop {
            tokio::time::sleep(self.monitor.poll_interval).await;

            let status = self.monitor.probe().await;
            if self.last_status != Some(status) {
                self.last_status = Some(status);
                return Some(status);
            }
        }
    }
}
