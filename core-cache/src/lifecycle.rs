//! Install and Activation Lifecycle
//!
//! Owns bucket versioning: populates the app shell up front, evicts
//! out-of-version buckets on activation, and serves document requests
//! through the offline fallback chain.

use std::sync::Arc;

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::time::Clock;
use core_store::{BucketNames, ResponseCache};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::{CacheError, Result};
use crate::router::normalize_cache_key;
use crate::strategy::{cached_to_response, capture_at};

/// Version lifecycle of an installed engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// App-shell population has not completed
    Installing,
    /// This version serves all foreground contexts
    Active,
    /// A newer version has activated
    Superseded,
}

/// Static settings of an installed version.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Current bucket names; the version fingerprint activation compares
    /// stored buckets against
    pub buckets: BucketNames,
    /// Origin prepended to rooted asset paths
    pub origin: String,
    /// Rooted paths installed into the app-shell bucket
    pub app_shell_assets: Vec<String>,
    /// Rooted path of the offline fallback document
    pub offline_fallback_path: String,
}

/// Governs install, activation and the navigation path.
pub struct LifecycleManager {
    config: LifecycleConfig,
    cache: Arc<dyn ResponseCache>,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    state: RwLock<LifecycleState>,
}

impl LifecycleManager {
    pub fn new(
        config: LifecycleConfig,
        cache: Arc<dyn ResponseCache>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            cache,
            http,
            clock,
            state: RwLock::new(LifecycleState::Installing),
        }
    }

    /// Populate the app-shell bucket with every installed asset.
    ///
    /// All assets are fetched up front and stored in one transaction; a
    /// failed fetch or non-success status aborts the install with nothing
    /// written, so a previously active version keeps serving.
    #[instrument(skip(self))]
    pub async fn install(&self) -> Result<()> {
        info!(
            bucket = %self.config.buckets.app_shell,
            assets = self.config.app_shell_assets.len(),
            "Installing app shell"
        );

        let mut entries = Vec::with_capacity(self.config.app_shell_assets.len());
        for asset in &self.config.app_shell_assets {
            let url = self.asset_url(asset);
            let request = HttpRequest::new(HttpMethod::Get, url.clone());
            let response = self.http.execute(request).await?;

            if !response.is_success() {
                return Err(CacheError::UpstreamStatus {
                    status: response.status,
                    url,
                });
            }

            entries.push((
                HttpMethod::Get.as_str().to_string(),
                url,
                capture_at(&response, self.clock.unix_timestamp_millis()),
            ));
        }

        self.cache
            .put_all(&self.config.buckets.app_shell, &entries)
            .await?;

        info!(count = entries.len(), "App shell installed");
        Ok(())
    }

    /// Evict every stored bucket whose name is not one of the current
    /// four, then mark this version active.
    ///
    /// Eviction works at bucket granularity and looks only at names; the
    /// contents of a surviving bucket are never touched. Returns the
    /// evicted bucket names.
    #[instrument(skip(self))]
    pub async fn activate(&self) -> Result<Vec<String>> {
        let existing = self.cache.list_bucket_names().await?;
        let mut evicted = Vec::new();

        for name in existing {
            if !self.config.buckets.contains(&name) {
                let removed = self.cache.delete_bucket(&name).await?;
                info!(bucket = %name, entries = removed, "Evicted stale bucket");
                evicted.push(name);
            }
        }

        *self.state.write().await = LifecycleState::Active;
        info!(evicted = evicted.len(), "Activation complete, claiming open contexts");

        Ok(evicted)
    }

    /// Serve a document request through the offline fallback chain.
    ///
    /// Network first; a received response is stored into the app-shell
    /// bucket whatever its status, keeping the last-seen document
    /// reachable offline. A failed fetch falls back to the cached copy for
    /// this URL, then to the offline fallback page, then propagates the
    /// original error.
    pub async fn handle_navigation(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let key = normalize_cache_key(&request.url);
        let bucket = self.config.buckets.app_shell.as_str();
        let method = request.method.as_str();

        let fetch_error = match self.http.execute(request.clone()).await {
            Ok(response) => {
                let copy = capture_at(&response, self.clock.unix_timestamp_millis());
                self.cache.put(bucket, method, &key, &copy).await?;
                return Ok(response);
            }
            Err(e) => e,
        };

        warn!(url = %key, error = %fetch_error, "Navigation fetch failed, falling back");

        if let Some(cached) = self.cache.get(bucket, method, &key).await? {
            debug!(url = %key, "Serving cached document");
            return Ok(cached_to_response(cached));
        }

        let fallback_key = self.asset_url(&self.config.offline_fallback_path);
        if let Some(fallback) = self.cache.get(bucket, method, &fallback_key).await? {
            debug!(url = %key, "Serving offline fallback page");
            return Ok(cached_to_response(fallback));
        }

        Err(CacheError::Bridge(fetch_error))
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Mark this version superseded; called when a newer version
    /// activates over it.
    pub async fn supersede(&self) {
        *self.state.write().await = LifecycleState::Superseded;
        info!("Version superseded by a newer activation");
    }

    fn asset_url(&self, rooted_path: &str) -> String {
        normalize_cache_key(&format!("{}{}", self.config.origin, rooted_path))
    }
}
