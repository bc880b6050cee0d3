//! # Engine Configuration Module
//!
//! Provides configuration management for the offline engine.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an
//! `EngineConfig` instance holding all dependencies and settings the engine
//! needs. It enforces fail-fast validation so a missing platform capability
//! surfaces at construction, not at first use.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - network fetches and sync batches
//! - `NotificationPresenter` - push and test notifications
//! - `ClientWindows` - notification click routing
//!
//! ## Optional Dependencies
//!
//! - `NetworkMonitor` - lets the engine trigger reconciliation on
//!   connectivity restore
//! - `Clock` - defaults to the system clock
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::EngineConfig;
//! use std::sync::Arc;
//!
//! let config = EngineConfig::builder()
//!     .database_path("/data/offline.db")
//!     .sync_endpoint("https://api.example.com/entries/batch")
//!     .origin("https://app.example.com")
//!     .http_client(Arc::new(MyHttpClient))
//!     .notification_presenter(Arc::new(MyPresenter))
//!     .client_windows(Arc::new(MyWindows))
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! The builder validates all required dependencies and provides actionable
//! error messages when capabilities are missing.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    Clock, ClientWindows, HttpClient, NetworkMonitor, NotificationPresenter, SystemClock,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Default cache bucket names, versioned so a deployment bump evicts the
/// previous generation wholesale.
pub const DEFAULT_APP_SHELL_BUCKET: &str = "awp-static-v3";
pub const DEFAULT_DYNAMIC_BUCKET: &str = "awp-dynamic-v1";
pub const DEFAULT_IMAGE_BUCKET: &str = "awp-images-v1";
pub const DEFAULT_API_DATA_BUCKET: &str = "awp-data-v1";

/// Default page served when a navigation fails and no cached copy exists.
pub const DEFAULT_OFFLINE_FALLBACK: &str = "/offline.html";

/// Default fixed asset list installed into the app-shell bucket.
pub const DEFAULT_APP_SHELL_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/offline.html",
    "/manifest.json",
    "/icons/icon.svg",
];

/// Engine configuration.
///
/// This struct holds all dependencies and settings required to construct
/// the offline engine. Use [`EngineConfigBuilder`] to create instances.
#[derive(Clone)]
pub struct EngineConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Remote endpoint receiving sync batches (POST, JSON body)
    pub sync_endpoint: String,

    /// Origin of the installed application, e.g. `https://app.example.com`
    pub origin: String,

    /// Fixed asset paths installed into the app-shell bucket
    pub app_shell_assets: Vec<String>,

    /// Path of the offline fallback page (must be an app-shell asset)
    pub offline_fallback_path: String,

    /// Bucket receiving app-shell and navigation responses
    pub app_shell_bucket: String,

    /// Bucket for uncategorized lazily-cached resources
    pub dynamic_bucket: String,

    /// Bucket for image resources
    pub image_bucket: String,

    /// Bucket for API responses
    pub api_data_bucket: String,

    /// Buffer size of the foreground event channel
    pub event_buffer_size: usize,

    /// HTTP client for network fetches and sync batches (required)
    pub http_client: Arc<dyn HttpClient>,

    /// Notification presenter (required)
    pub notification_presenter: Arc<dyn NotificationPresenter>,

    /// Foreground window registry for click routing (required)
    pub client_windows: Arc<dyn ClientWindows>,

    /// Network connectivity monitor (optional)
    pub network_monitor: Option<Arc<dyn NetworkMonitor>>,

    /// Time source (defaults to the system clock)
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("database_path", &self.database_path)
            .field("sync_endpoint", &self.sync_endpoint)
            .field("origin", &self.origin)
            .field("app_shell_assets", &self.app_shell_assets)
            .field("offline_fallback_path", &self.offline_fallback_path)
            .field("app_shell_bucket", &self.app_shell_bucket)
            .field("dynamic_bucket", &self.dynamic_bucket)
            .field("image_bucket", &self.image_bucket)
            .field("api_data_bucket", &self.api_data_bucket)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("http_client", &"HttpClient { ... }")
            .field("notification_presenter", &"NotificationPresenter { ... }")
            .field("client_windows", &"ClientWindows { ... }")
            .field(
                "network_monitor",
                &self
                    .network_monitor
                    .as_ref()
                    .map(|_| "NetworkMonitor { ... }"),
            )
            .finish()
    }
}

impl EngineConfig {
    /// Creates a new builder for constructing an `EngineConfig`.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - Sync endpoint and origin are absolute HTTP(S) values
    /// - App-shell asset paths are rooted and include the offline fallback
    /// - Bucket names are non-empty and distinct
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if !self.sync_endpoint.starts_with("http://") && !self.sync_endpoint.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "Sync endpoint must be an absolute http(s) URL, got '{}'",
                self.sync_endpoint
            )));
        }

        if !self.origin.starts_with("http://") && !self.origin.starts_with("https://") {
            return Err(Error::Config(format!(
                "Origin must be an absolute http(s) origin, got '{}'",
                self.origin
            )));
        }

        if self.origin.ends_with('/') {
            return Err(Error::Config(
                "Origin must not carry a trailing slash".to_string(),
            ));
        }

        if self.app_shell_assets.is_empty() {
            return Err(Error::Config(
                "App-shell asset list cannot be empty".to_string(),
            ));
        }

        for asset in &self.app_shell_assets {
            if !asset.starts_with('/') {
                return Err(Error::Config(format!(
                    "App-shell asset paths must be rooted, got '{}'",
                    asset
                )));
            }
        }

        if !self
            .app_shell_assets
            .iter()
            .any(|asset| asset == &self.offline_fallback_path)
        {
            return Err(Error::Config(format!(
                "Offline fallback page '{}' must be part of the app-shell asset list; \
                 it cannot be served offline otherwise",
                self.offline_fallback_path
            )));
        }

        let buckets = [
            &self.app_shell_bucket,
            &self.dynamic_bucket,
            &self.image_bucket,
            &self.api_data_bucket,
        ];

        if buckets.iter().any(|name| name.is_empty()) {
            return Err(Error::Config("Bucket names cannot be empty".to_string()));
        }

        let distinct: HashSet<&str> = buckets.iter().map(|name| name.as_str()).collect();
        if distinct.len() != buckets.len() {
            return Err(Error::Config(
                "Bucket names must be distinct; a resource lives in exactly one bucket".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`EngineConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then call
/// [`build()`](EngineConfigBuilder::build) to create the final config. The
/// builder validates required dependencies and provides helpful error
/// messages.
#[derive(Default)]
pub struct EngineConfigBuilder {
    database_path: Option<PathBuf>,
    sync_endpoint: Option<String>,
    origin: Option<String>,
    app_shell_assets: Option<Vec<String>>,
    offline_fallback_path: Option<String>,
    app_shell_bucket: Option<String>,
    dynamic_bucket: Option<String>,
    image_bucket: Option<String>,
    api_data_bucket: Option<String>,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
    notification_presenter: Option<Arc<dyn NotificationPresenter>>,
    client_windows: Option<Arc<dyn ClientWindows>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    clock: Option<Arc<dyn Clock>>,
}

impl EngineConfigBuilder {
    /// Sets the database path.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the remote sync endpoint receiving batch uploads.
    pub fn sync_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.sync_endpoint = Some(endpoint.into());
        self
    }

    /// Sets the application origin used for same-origin classification.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Replaces the fixed app-shell asset list.
    ///
    /// Default: [`DEFAULT_APP_SHELL_ASSETS`]
    pub fn app_shell_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.app_shell_assets = Some(assets.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the offline fallback page path.
    ///
    /// Default: [`DEFAULT_OFFLINE_FALLBACK`]
    pub fn offline_fallback_path(mut self, path: impl Into<String>) -> Self {
        self.offline_fallback_path = Some(path.into());
        self
    }

    /// Sets the app-shell bucket name.
    pub fn app_shell_bucket(mut self, name: impl Into<String>) -> Self {
        self.app_shell_bucket = Some(name.into());
        self
    }

    /// Sets the dynamic bucket name.
    pub fn dynamic_bucket(mut self, name: impl Into<String>) -> Self {
        self.dynamic_bucket = Some(name.into());
        self
    }

    /// Sets the image bucket name.
    pub fn image_bucket(mut self, name: impl Into<String>) -> Self {
        self.image_bucket = Some(name.into());
        self
    }

    /// Sets the API data bucket name.
    pub fn api_data_bucket(mut self, name: impl Into<String>) -> Self {
        self.api_data_bucket = Some(name.into());
        self
    }

    /// Sets the foreground event channel buffer size.
    ///
    /// Default: [`DEFAULT_EVENT_BUFFER_SIZE`]
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the HTTP client implementation (required).
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the notification presenter implementation (required).
    pub fn notification_presenter(mut self, presenter: Arc<dyn NotificationPresenter>) -> Self {
        self.notification_presenter = Some(presenter);
        self
    }

    /// Sets the foreground window registry implementation (required).
    pub fn client_windows(mut self, windows: Arc<dyn ClientWindows>) -> Self {
        self.client_windows = Some(windows);
        self
    }

    /// Sets the network monitor implementation (optional).
    ///
    /// With a monitor present the engine fires a reconciliation attempt on
    /// the offline-to-online edge; without one, only external triggers drive
    /// reconciliation.
    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    /// Sets the time source (optional, defaults to the system clock).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the final `EngineConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(EngineConfig)` on success, or an error if:
    /// - Required settings are missing (database path, sync endpoint, origin)
    /// - Required bridges are missing (HttpClient, NotificationPresenter,
    ///   ClientWindows)
    /// - Configuration values are invalid
    pub fn build(self) -> Result<EngineConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let sync_endpoint = self.sync_endpoint.ok_or_else(|| {
            Error::Config("Sync endpoint is required. Use .sync_endpoint() to set it.".to_string())
        })?;

        let origin = self.origin.ok_or_else(|| {
            Error::Config("Origin is required. Use .origin() to set it.".to_string())
        })?;

        let http_client = self.http_client.ok_or_else(|| Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "No HTTP client implementation provided. \
                      Desktop: use bridge-desktop's ReqwestHttpClient. \
                      Other hosts: inject a platform-native adapter."
                .to_string(),
        })?;

        let notification_presenter =
            self.notification_presenter
                .ok_or_else(|| Error::CapabilityMissing {
                    capability: "NotificationPresenter".to_string(),
                    message: "No notification presenter provided. \
                              Inject a platform adapter, or \
                              ConsoleNotificationPresenter for development."
                        .to_string(),
                })?;

        let client_windows = self.client_windows.ok_or_else(|| Error::CapabilityMissing {
            capability: "ClientWindows".to_string(),
            message: "No foreground window registry provided. \
                      Notification clicks cannot be routed without one."
                .to_string(),
        })?;

        let config = EngineConfig {
            database_path,
            sync_endpoint,
            origin,
            app_shell_assets: self.app_shell_assets.unwrap_or_else(|| {
                DEFAULT_APP_SHELL_ASSETS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            }),
            offline_fallback_path: self
                .offline_fallback_path
                .unwrap_or_else(|| DEFAULT_OFFLINE_FALLBACK.to_string()),
            app_shell_bucket: self
                .app_shell_bucket
                .unwrap_or_else(|| DEFAULT_APP_SHELL_BUCKET.to_string()),
            dynamic_bucket: self
                .dynamic_bucket
                .unwrap_or_else(|| DEFAULT_DYNAMIC_BUCKET.to_string()),
            image_bucket: self
                .image_bucket
                .unwrap_or_else(|| DEFAULT_IMAGE_BUCKET.to_string()),
            api_data_bucket: self
                .api_data_bucket
                .unwrap_or_else(|| DEFAULT_API_DATA_BUCKET.to_string()),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
            notification_presenter,
            client_windows,
            network_monitor: self.network_monitor,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;

        Ok(config)
    }
}
