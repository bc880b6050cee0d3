//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host shell.
//!
//! ## Overview
//!
//! This crate defines the contract between the offline engine and the
//! platform embedding it. Each trait represents a capability the engine
//! requires but that must be implemented differently per host: an HTTP stack
//! for network fetches, a connectivity monitor, a notification presenter,
//! and a registry of open foreground windows for click routing.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP execution, one attempt
//!   per call
//! - [`NetworkMonitor`](network::NetworkMonitor) - Connectivity status and
//!   change stream
//!
//! ### Foreground Integration
//! - [`NotificationPresenter`](notify::NotificationPresenter) - Display
//!   engine-generated notifications
//! - [`ClientWindows`](notify::ClientWindows) - Enumerate/focus/open
//!   foreground windows
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Fail-Fast Strategy
//!
//! The engine fails fast with descriptive errors when a required capability
//! is missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! pub fn new(config: EngineConfigBuilder) -> Result<Self> {
//!     let http_client = config.http_client
//!         .ok_or_else(|| Error::CapabilityMissing {
//!             capability: "HttpClient".to_string(),
//!             message: "No HTTP client implementation provided. \
//!                      Desktop: use bridge-desktop's ReqwestHttpClient. \
//!                      Other hosts: inject a platform-native adapter.".to_string()
//!         })?;
//!     // ...
//! }
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Platform implementations should convert platform-specific errors to
//! `BridgeError` and provide actionable messages. A non-2xx HTTP status is
//! a successful bridge call; only transport-level failures are errors.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks. Implementations must ensure thread safety.

pub mod error;
pub mod http;
pub mod network;
pub mod notify;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ResourceKind};
pub use network::{NetworkChangeStream, NetworkMonitor, NetworkStatus};
pub use notify::{
    ClientWindow, ClientWindows, ConsoleNotificationPresenter, Notification,
    NotificationPresenter, WindowId,
};
pub use time::{Clock, SystemClock};
