//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the network-side
//! bridge traits using desktop-appropriate libraries:
//! - `HttpClient` using `reqwest`
//! - `NetworkMonitor` using TCP probes with polling change detection
//!
//! Notification presentation and window routing have no portable desktop
//! story; hosts wire their own [`NotificationPresenter`] and
//! [`ClientWindows`] adapters (or the console presenter from
//! `bridge-traits` during development).
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopNetworkMonitor, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new();
//!     let monitor = DesktopNetworkMonitor::new();
//!
//!     // Use in engine configuration
//! }
//! ```
//!
//! [`NotificationPresenter`]: bridge_traits::notify::NotificationPresenter
//! [`ClientWindows`]: bridge_traits::notify::ClientWindows

mod http;
mod network;

pub use http::ReqwestHttpClient;
pub use network::DesktopNetworkMonitor;
