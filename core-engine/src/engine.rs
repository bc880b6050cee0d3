//! Engine Assembly and Dispatch
//!
//! Wires the store, router, strategies, lifecycle and reconciler together
//! behind one façade, and dispatches every host callback: intercepted
//! fetches, foreground messages, background triggers, pushes and
//! notification clicks.

use std::sync::Arc;

use bridge_traits::http::{HttpRequest, HttpResponse};
use bridge_traits::network::{NetworkChangeStream, NetworkMonitor, NetworkStatus};
use bridge_traits::notify::{ClientWindows, Notification, NotificationPresenter};
use core_cache::{
    LifecycleConfig, LifecycleManager, LifecycleState, RouteMatcher, StrategyExecutor, StrategyKind,
};
use core_runtime::config::EngineConfig;
use core_runtime::events::{EngineEvent, EventBus, Receiver};
use core_store::db::{self, DatabaseConfig};
use core_store::{BucketNames, SqliteRecordStore, SqliteResponseCache};
use core_sync::{OfflineQueue, SyncReconciler, SYNC_TAG};
use sqlx::{Pool, Sqlite};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::messages::{test_notification, ClientMessage, PushPayload};

/// The assembled offline engine.
///
/// One instance corresponds to one installed version: [`start`] populates
/// the app shell and takes over serving, after which the host forwards its
/// interception and platform callbacks here. All methods take `&self`; the
/// engine is shared behind an `Arc` by hosts that dispatch from multiple
/// tasks.
///
/// [`start`]: OfflineEngine::start
pub struct OfflineEngine {
    config: EngineConfig,
    pool: Pool<Sqlite>,
    router: RouteMatcher,
    strategies: StrategyExecutor,
    lifecycle: LifecycleManager,
    queue: Arc<OfflineQueue>,
    reconciler: Arc<SyncReconciler>,
    events: EventBus,
}

impl OfflineEngine {
    /// Open the database and wire every component.
    ///
    /// No network traffic happens here; the app shell is only populated by
    /// [`start`](Self::start).
    pub async fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let pool = db::create_pool(DatabaseConfig::new(&config.database_path)).await?;
        let records = Arc::new(SqliteRecordStore::new(pool.clone()));
        let response_cache = Arc::new(SqliteResponseCache::new(pool.clone()));

        let buckets = BucketNames::new(
            &config.app_shell_bucket,
            &config.dynamic_bucket,
            &config.image_bucket,
            &config.api_data_bucket,
        );

        let router = RouteMatcher::new(buckets.clone(), &config.app_shell_assets);
        let strategies = StrategyExecutor::new(
            response_cache.clone(),
            config.http_client.clone(),
            config.clock.clone(),
        );
        let lifecycle = LifecycleManager::new(
            LifecycleConfig {
                buckets,
                origin: config.origin.clone(),
                app_shell_assets: config.app_shell_assets.clone(),
                offline_fallback_path: config.offline_fallback_path.clone(),
            },
            response_cache,
            config.http_client.clone(),
            config.clock.clone(),
        );

        let events = EventBus::new(config.event_buffer_size);
        let queue = Arc::new(OfflineQueue::new(records));
        let reconciler = Arc::new(SyncReconciler::new(
            queue.clone(),
            config.http_client.clone(),
            events.clone(),
            config.sync_endpoint.clone(),
        ));

        info!(origin = %config.origin, "Offline engine assembled");

        Ok(Self {
            config,
            pool,
            router,
            strategies,
            lifecycle,
            queue,
            reconciler,
            events,
        })
    }

    /// Install the app shell and activate this version.
    ///
    /// Returns the bucket names evicted during activation; empty on a fresh
    /// database, the previous generation's buckets after a version bump.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<Vec<String>> {
        self.lifecycle.install().await?;
        let evicted = self.lifecycle.activate().await?;
        Ok(evicted)
    }

    /// Intercept one request.
    ///
    /// Returns `Ok(None)` for requests the engine does not intercept
    /// (anything but GET); the host forwards those to the network itself.
    #[instrument(skip(self, request), fields(url = %request.url))]
    pub async fn handle_fetch(&self, request: &HttpRequest) -> Result<Option<HttpResponse>> {
        let Some(route) = self.router.classify(request) else {
            debug!(method = request.method.as_str(), "Passing request through");
            return Ok(None);
        };

        let response = match route.strategy {
            StrategyKind::Navigation => self.lifecycle.handle_navigation(request).await?,
            StrategyKind::CacheFirst => self.strategies.cache_first(&route.bucket, request).await?,
            StrategyKind::StaleWhileRevalidate => {
                self.strategies
                    .stale_while_revalidate(&route.bucket, request)
                    .await?
            }
            StrategyKind::NetworkFirst => {
                self.strategies.network_first(&route.bucket, request).await?
            }
        };

        Ok(Some(response))
    }

    /// Handle an envelope posted by a foreground context.
    ///
    /// Unknown or malformed messages are ignored, never errors.
    #[instrument(skip(self, raw))]
    pub async fn handle_message(&self, raw: &[u8]) -> Result<()> {
        match ClientMessage::parse(raw) {
            Some(ClientMessage::ManualSync) => {
                debug!("Foreground requested an immediate sync");
                self.reconciler.sync_pending().await?;
                Ok(())
            }
            Some(ClientMessage::ShowTestNotification) => {
                self.config
                    .notification_presenter
                    .show(test_notification())
                    .await?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Handle a platform background trigger, e.g. a scheduled retry.
    ///
    /// Only the [`SYNC_TAG`] tag requests reconciliation; anything else is
    /// acknowledged without touching the queue.
    #[instrument(skip(self))]
    pub async fn handle_sync(&self, tag: &str) -> Result<()> {
        self.reconciler.handle_background_trigger(tag).await?;
        Ok(())
    }

    /// Present an incoming push payload as a notification.
    #[instrument(skip(self, raw))]
    pub async fn handle_push(&self, raw: &[u8]) -> Result<()> {
        let payload = PushPayload::from_raw(raw);
        info!(title = %payload.title, url = %payload.url, "Presenting push notification");
        self.config
            .notification_presenter
            .show(payload.into_notification())
            .await?;
        Ok(())
    }

    /// Route a clicked notification to its target URL.
    ///
    /// Focuses the first open window already showing the target, opens a
    /// new one otherwise.
    #[instrument(skip(self, notification), fields(target = %notification.target_url))]
    pub async fn handle_notification_click(&self, notification: &Notification) -> Result<()> {
        let target = self.absolute_target(&notification.target_url);
        let windows = self.config.client_windows.list().await?;

        if let Some(window) = windows.iter().find(|w| w.url == target) {
            debug!(window = window.id.as_str(), "Focusing existing window");
            self.config.client_windows.focus(&window.id).await?;
        } else {
            debug!("No open window on target, opening a new one");
            self.config.client_windows.open(&target).await?;
        }

        Ok(())
    }

    /// Watch connectivity and fire a reconciliation attempt on every
    /// offline-to-online edge.
    ///
    /// Returns `None` when no network monitor is configured or the monitor
    /// refuses a change stream; the task ends when the stream closes.
    pub async fn spawn_connectivity_watcher(&self) -> Option<JoinHandle<()>> {
        let monitor = self.config.network_monitor.clone()?;
        let reconciler = Arc::clone(&self.reconciler);

        let mut changes = match monitor.subscribe_changes().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "No network change stream, connectivity-driven sync disabled");
                return None;
            }
        };

        Some(tokio::spawn(async move {
            let mut last = NetworkStatus::Indeterminate;

            while let Some(status) = changes.next().await {
                let restored =
                    status == NetworkStatus::Connected && last == NetworkStatus::Disconnected;
                last = status;

                if restored {
                    info!("Connectivity restored, attempting reconciliation");
                    if let Err(e) = reconciler.handle_background_trigger(SYNC_TAG).await {
                        warn!(error = %e, "Reconciliation on connectivity restore failed");
                    }
                }
            }

            debug!("Network change stream closed, connectivity watcher exiting");
        }))
    }

    /// Local record queue, for foreground writes and listings.
    pub fn queue(&self) -> Arc<OfflineQueue> {
        Arc::clone(&self.queue)
    }

    /// Subscribe to engine events. Each subscriber receives independently;
    /// events emitted before subscribing are not replayed.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Current lifecycle state of this engine version.
    pub async fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state().await
    }

    /// Mark this version superseded when a newer one activates over it.
    pub async fn supersede(&self) {
        self.lifecycle.supersede().await;
    }

    /// Verify database liveness.
    pub async fn health_check(&self) -> Result<()> {
        db::health_check(&self.pool).await?;
        Ok(())
    }

    /// Rooted targets resolve against the configured origin; absolute URLs
    /// pass through.
    fn absolute_target(&self, target: &str) -> String {
        if target.starts_with('/') {
            format!("{}{}", self.config.origin, target)
        } else {
            target.to_string()
        }
    }
}
