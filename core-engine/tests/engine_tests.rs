//! End-to-end engine behavior over in-memory storage and scripted
//! platform bridges.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::error::BridgeError;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ResourceKind};
use bridge_traits::network::{NetworkChangeStream, NetworkMonitor, NetworkStatus};
use bridge_traits::notify::{
    ClientWindow, ClientWindows, Notification, NotificationPresenter, WindowId,
};
use bytes::Bytes;
use core_engine::{EngineConfig, EngineError, LifecycleState, OfflineEngine, SYNC_TAG};
use core_runtime::config::EngineConfigBuilder;
use core_runtime::events::EngineEvent;
use core_store::PendingRecord;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

const ORIGIN: &str = "https://app.example.com";
const ENDPOINT: &str = "https://api.example.com/entries/batch";

/// Scripted network. Serves `net::<url>` with status 200 unless an override
/// is registered, records every request and can be flipped offline.
struct ScriptedClient {
    offline: AtomicBool,
    overrides: Mutex<HashMap<String, (u16, String)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedClient {
    fn online() -> Self {
        Self {
            offline: AtomicBool::new(false),
            overrides: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn respond_with(&self, url: &str, status: u16, body: &str) {
        self.overrides
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.to_string()));
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn posts(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == HttpMethod::Post)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, BridgeError> {
        self.requests.lock().unwrap().push(request.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed(
                "connection refused".to_string(),
            ));
        }

        let canned = self.overrides.lock().unwrap().get(&request.url).cloned();
        let (status, body) = canned.unwrap_or_else(|| (200, format!("net::{}", request.url)));

        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body),
        })
    }
}

#[derive(Default)]
struct RecordingPresenter {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingPresenter {
    fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPresenter for RecordingPresenter {
    async fn show(&self, notification: Notification) -> std::result::Result<(), BridgeError> {
        self.shown.lock().unwrap().push(notification);
        Ok(())
    }
}

#[derive(Default)]
struct FakeWindows {
    windows: Mutex<Vec<ClientWindow>>,
    focused: Mutex<Vec<WindowId>>,
    opened: Mutex<Vec<String>>,
}

impl FakeWindows {
    fn add(&self, id: &str, url: &str) {
        self.windows.lock().unwrap().push(ClientWindow {
            id: WindowId::new(id),
            url: url.to_string(),
        });
    }

    fn focused(&self) -> Vec<WindowId> {
        self.focused.lock().unwrap().clone()
    }

    fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClientWindows for FakeWindows {
    async fn list(&self) -> std::result::Result<Vec<ClientWindow>, BridgeError> {
        Ok(self.windows.lock().unwrap().clone())
    }

    async fn focus(&self, id: &WindowId) -> std::result::Result<(), BridgeError> {
        self.focused.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn open(&self, url: &str) -> std::result::Result<(), BridgeError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Connectivity feed driven by the test; the change stream is handed out
/// once.
struct ScriptedMonitor {
    current: Mutex<NetworkStatus>,
    tx: mpsc::UnboundedSender<NetworkStatus>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<NetworkStatus>>>,
}

impl ScriptedMonitor {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            current: Mutex::new(NetworkStatus::Indeterminate),
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    fn push(&self, status: NetworkStatus) {
        *self.current.lock().unwrap() = status;
        self.tx.send(status).ok();
    }
}

struct ChannelStream(mpsc::UnboundedReceiver<NetworkStatus>);

#[async_trait]
impl NetworkChangeStream for ChannelStream {
    async fn next(&mut self) -> Option<NetworkStatus> {
        self.0.recv().await
    }
}

#[async_trait]
impl NetworkMonitor for ScriptedMonitor {
    async fn status(&self) -> std::result::Result<NetworkStatus, BridgeError> {
        Ok(*self.current.lock().unwrap())
    }

    async fn subscribe_changes(
        &self,
    ) -> std::result::Result<Box<dyn NetworkChangeStream>, BridgeError> {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BridgeError::NotAvailable("change stream already taken".to_string()))?;
        Ok(Box::new(ChannelStream(rx)))
    }
}

struct Harness {
    engine: OfflineEngine,
    http: Arc<ScriptedClient>,
    presenter: Arc<RecordingPresenter>,
    windows: Arc<FakeWindows>,
}

fn base_config(
    http: Arc<ScriptedClient>,
    presenter: Arc<RecordingPresenter>,
    windows: Arc<FakeWindows>,
) -> EngineConfigBuilder {
    EngineConfig::builder()
        .database_path(":memory:")
        .sync_endpoint(ENDPOINT)
        .origin(ORIGIN)
        .http_client(http)
        .notification_presenter(presenter)
        .client_windows(windows)
}

async fn harness() -> Harness {
    let http = Arc::new(ScriptedClient::online());
    let presenter = Arc::new(RecordingPresenter::default());
    let windows = Arc::new(FakeWindows::default());

    let config = base_config(http.clone(), presenter.clone(), windows.clone())
        .build()
        .unwrap();
    let engine = OfflineEngine::new(config).await.unwrap();

    Harness {
        engine,
        http,
        presenter,
        windows,
    }
}

fn get(url: &str, kind: ResourceKind) -> HttpRequest {
    HttpRequest::new(HttpMethod::Get, url).kind(kind)
}

fn navigation(url: &str) -> HttpRequest {
    get(url, ResourceKind::Document)
}

fn record(id: i64, title: &str, description: &str) -> PendingRecord {
    PendingRecord::new(id, title, description, "2025-01-15T10:00:00.000Z")
}

#[tokio::test]
async fn test_start_installs_shell_and_serves_it_offline() {
    let h = harness().await;

    let evicted = h.engine.start().await.unwrap();
    assert!(evicted.is_empty(), "fresh database has nothing to evict");

    h.http.set_offline(true);

    for path in ["/", "/index.html", "/manifest.json", "/icons/icon.svg"] {
        let request = get(&format!("{}{}", ORIGIN, path), ResourceKind::Other);
        let response = h.engine.handle_fetch(&request).await.unwrap().unwrap();

        assert_eq!(response.status, 200, "asset {} not served", path);
        assert_eq!(response.body, Bytes::from(format!("net::{}{}", ORIGIN, path)));
    }
}

#[tokio::test]
async fn test_start_activates_the_version() {
    let h = harness().await;

    assert_eq!(h.engine.lifecycle_state().await, LifecycleState::Installing);
    h.engine.start().await.unwrap();
    assert_eq!(h.engine.lifecycle_state().await, LifecycleState::Active);
}

#[tokio::test]
async fn test_non_get_requests_pass_through() {
    let h = harness().await;

    let post = HttpRequest::new(HttpMethod::Post, format!("{}/api/entries", ORIGIN));
    let routed = h.engine.handle_fetch(&post).await.unwrap();

    assert!(routed.is_none());
    assert_eq!(h.http.request_count(), 0, "pass-through must not fetch");
}

#[tokio::test]
async fn test_navigation_serves_cache_then_offline_page_when_disconnected() {
    let h = harness().await;
    h.engine.start().await.unwrap();

    let records_url = format!("{}/records", ORIGIN);
    h.engine
        .handle_fetch(&navigation(&records_url))
        .await
        .unwrap()
        .unwrap();

    h.http.set_offline(true);

    // The document seen online is still reachable.
    let cached = h
        .engine
        .handle_fetch(&navigation(&records_url))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.body, Bytes::from(format!("net::{}", records_url)));

    // A document never seen falls back to the offline page.
    let fallback = h
        .engine
        .handle_fetch(&navigation(&format!("{}/brand-new", ORIGIN)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        fallback.body,
        Bytes::from(format!("net::{}/offline.html", ORIGIN))
    );
}

#[tokio::test]
async fn test_navigation_error_when_nothing_cached() {
    let h = harness().await;
    h.http.set_offline(true);

    let result = h
        .engine
        .handle_fetch(&navigation(&format!("{}/records", ORIGIN)))
        .await;

    assert!(matches!(result, Err(EngineError::Cache(_))));
}

#[tokio::test]
async fn test_api_requests_fall_back_to_last_response() {
    let h = harness().await;
    let request = get(&format!("{}/api/entries", ORIGIN), ResourceKind::Other);

    let first = h.engine.handle_fetch(&request).await.unwrap().unwrap();
    assert_eq!(first.status, 200);

    h.http.set_offline(true);

    let second = h.engine.handle_fetch(&request).await.unwrap().unwrap();
    assert_eq!(second.body, first.body);

    let never_seen = get(&format!("{}/api/settings", ORIGIN), ResourceKind::Other);
    let result = h.engine.handle_fetch(&never_seen).await;
    assert!(matches!(result, Err(EngineError::Cache(_))));
}

#[tokio::test]
async fn test_images_survive_offline_after_first_view() {
    let h = harness().await;
    let request = get(&format!("{}/photos/cover.jpg", ORIGIN), ResourceKind::Image);

    let first = h.engine.handle_fetch(&request).await.unwrap().unwrap();

    h.http.set_offline(true);

    let second = h.engine.handle_fetch(&request).await.unwrap().unwrap();
    assert_eq!(second.body, first.body);
}

#[tokio::test]
async fn test_manual_sync_drains_queue_and_broadcasts() {
    let h = harness().await;
    h.engine
        .queue()
        .enqueue(record(1001, "Buy milk", "2 liters"))
        .await
        .unwrap();
    let mut events = h.engine.subscribe();

    h.engine
        .handle_message(br#"{"type":"MANUAL_SYNC"}"#)
        .await
        .unwrap();

    let posts = h.http.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].url, ENDPOINT);

    let body: serde_json::Value = serde_json::from_slice(posts[0].body.as_ref().unwrap()).unwrap();
    assert_eq!(body["tasks"][0]["id"], 1001);
    assert_eq!(body["tasks"][0]["title"], "Buy milk");
    assert_eq!(body["tasks"][0]["description"], "2 liters");
    assert_eq!(body["tasks"][0]["syncStatus"], "pending");
    assert_eq!(body["tasks"][0]["createdAt"], "2025-01-15T10:00:00.000Z");

    assert!(h.engine.queue().list_pending().await.unwrap().is_empty());

    let event = events.recv().await.unwrap();
    assert_eq!(event, EngineEvent::SyncCompleted { ids: vec![1001] });
}

#[tokio::test]
async fn test_completion_reports_caller_assigned_ids() {
    let h = harness().await;
    let mut events = h.engine.subscribe();

    h.engine
        .queue()
        .enqueue(PendingRecord::new(1001, "X", "", "2025-01-01T00:00:00Z"))
        .await
        .unwrap();

    h.engine
        .handle_message(br#"{"type":"MANUAL_SYNC"}"#)
        .await
        .unwrap();

    // The acknowledged ids are the ones the caller minted, never renumbered.
    let event = events.recv().await.unwrap();
    assert_eq!(event, EngineEvent::SyncCompleted { ids: vec![1001] });
    assert!(h.engine.queue().list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_batch_keeps_queue_and_reports() {
    let h = harness().await;
    h.http.respond_with(ENDPOINT, 500, "backend exploded");
    h.engine
        .queue()
        .enqueue(record(1001, "Trapped", ""))
        .await
        .unwrap();
    let mut events = h.engine.subscribe();

    let result = h.engine.handle_message(br#"{"type":"MANUAL_SYNC"}"#).await;
    assert!(matches!(result, Err(EngineError::Sync(_))));

    assert_eq!(h.engine.queue().list_pending().await.unwrap().len(), 1);

    match events.recv().await.unwrap() {
        EngineEvent::SyncError { message } => assert!(message.contains("500")),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_messages_are_ignored() {
    let h = harness().await;

    h.engine
        .handle_message(br#"{"type":"REFRESH_EVERYTHING"}"#)
        .await
        .unwrap();
    h.engine.handle_message(b"][ not json").await.unwrap();

    assert_eq!(h.http.request_count(), 0);
    assert!(h.presenter.shown().is_empty());
}

#[tokio::test]
async fn test_test_notification_uses_fixed_copy() {
    let h = harness().await;

    h.engine
        .handle_message(br#"{"type":"SHOW_TEST_NOTIFICATION"}"#)
        .await
        .unwrap();

    let shown = h.presenter.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Test notification");
    assert_eq!(shown[0].body, "Notifications are working correctly.");
    assert_eq!(shown[0].icon, Some("/icons/icon.svg".to_string()));
    assert_eq!(shown[0].target_url, "/");
}

#[tokio::test]
async fn test_push_payload_reaches_presenter() {
    let h = harness().await;

    h.engine
        .handle_push(br#"{"title":"Fresh data","body":"3 records updated","url":"/records"}"#)
        .await
        .unwrap();

    let shown = h.presenter.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Fresh data");
    assert_eq!(shown[0].body, "3 records updated");
    assert_eq!(shown[0].target_url, "/records");
}

#[tokio::test]
async fn test_empty_push_presents_generic_notification() {
    let h = harness().await;

    h.engine.handle_push(b"").await.unwrap();

    let shown = h.presenter.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "New notification");
    assert_eq!(shown[0].body, "You have an update available.");
    assert_eq!(shown[0].target_url, "/");
}

#[tokio::test]
async fn test_notification_click_focuses_matching_window() {
    let h = harness().await;
    h.windows.add("w-1", &format!("{}/records", ORIGIN));
    h.windows.add("w-2", &format!("{}/", ORIGIN));

    let notification = Notification::new("Sync", "done").target_url("/records");
    h.engine
        .handle_notification_click(&notification)
        .await
        .unwrap();

    assert_eq!(h.windows.focused(), vec![WindowId::new("w-1")]);
    assert!(h.windows.opened().is_empty());
}

#[tokio::test]
async fn test_notification_click_opens_when_no_match() {
    let h = harness().await;
    h.windows.add("w-1", &format!("{}/records", ORIGIN));

    let notification = Notification::new("Sync", "done").target_url("/settings");
    h.engine
        .handle_notification_click(&notification)
        .await
        .unwrap();

    assert!(h.windows.focused().is_empty());
    assert_eq!(h.windows.opened(), vec![format!("{}/settings", ORIGIN)]);
}

#[tokio::test]
async fn test_notification_click_passes_absolute_targets_through() {
    let h = harness().await;

    let notification = Notification::new("Docs", "updated").target_url("https://docs.example.com/changelog");
    h.engine
        .handle_notification_click(&notification)
        .await
        .unwrap();

    assert_eq!(
        h.windows.opened(),
        vec!["https://docs.example.com/changelog".to_string()]
    );
}

#[tokio::test]
async fn test_background_trigger_ignores_unrelated_tags() {
    let h = harness().await;
    h.engine
        .queue()
        .enqueue(record(1001, "Waiting", ""))
        .await
        .unwrap();

    h.engine.handle_sync("cleanup-thumbnails").await.unwrap();
    assert!(h.http.posts().is_empty());
    assert_eq!(h.engine.queue().list_pending().await.unwrap().len(), 1);

    h.engine.handle_sync(SYNC_TAG).await.unwrap();
    assert_eq!(h.http.posts().len(), 1);
    assert!(h.engine.queue().list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connectivity_restore_triggers_reconciliation() {
    let monitor = Arc::new(ScriptedMonitor::new());
    let http = Arc::new(ScriptedClient::online());
    let config = base_config(
        http.clone(),
        Arc::new(RecordingPresenter::default()),
        Arc::new(FakeWindows::default()),
    )
    .network_monitor(monitor.clone())
    .build()
    .unwrap();
    let engine = OfflineEngine::new(config).await.unwrap();

    engine
        .queue()
        .enqueue(record(1001, "Offline note", "Saved while disconnected"))
        .await
        .unwrap();
    let mut events = engine.subscribe();

    let watcher = engine
        .spawn_connectivity_watcher()
        .await
        .expect("monitor configured");

    // Going online from an indeterminate start is not a restore.
    monitor.push(NetworkStatus::Connected);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.queue().list_pending().await.unwrap().len(), 1);

    monitor.push(NetworkStatus::Disconnected);
    monitor.push(NetworkStatus::Connected);

    let event = timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("reconciliation should fire on the offline-to-online edge")
        .unwrap();
    assert!(matches!(event, EngineEvent::SyncCompleted { .. }));
    assert!(engine.queue().list_pending().await.unwrap().is_empty());

    watcher.abort();
}

#[tokio::test]
async fn test_watcher_requires_a_monitor() {
    let h = harness().await;
    assert!(h.engine.spawn_connectivity_watcher().await.is_none());
}

#[tokio::test]
async fn test_health_check_reports_live_database() {
    let h = harness().await;
    h.engine.health_check().await.unwrap();
}
