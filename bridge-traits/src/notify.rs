//! Notification and Foreground Window Abstractions
//!
//! The engine never renders UI. It hands notifications to the host presenter
//! and routes notification clicks through the host's registry of open
//! foreground windows.

use async_trait::async_trait;

use crate::error::Result;

/// A notification to display via the host platform.
///
/// `target_url` is carried on every notification so click routing always has
/// a destination; it defaults to the application root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub target_url: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: None,
            badge: None,
            target_url: "/".to_string(),
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = url.into();
        self
    }
}

/// Notification presenter trait
///
/// Display is best-effort; the engine does not track shown notifications.
#[async_trait]
pub trait NotificationPresenter: Send + Sync {
    /// Show a notification
    async fn show(&self, notification: Notification) -> Result<()>;
}

/// Host-assigned identifier of an open foreground window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowId(pub String);

impl WindowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An open foreground window as reported by the host.
#[derive(Debug, Clone)]
pub struct ClientWindow {
    pub id: WindowId,
    pub url: String,
}

/// Registry of the host's open foreground windows.
///
/// Used for notification click routing: focus the window already showing the
/// target URL, or open a new one.
#[async_trait]
pub trait ClientWindows: Send + Sync {
    /// Enumerate currently open windows, including ones the engine does not
    /// yet control.
    async fn list(&self) -> Result<Vec<ClientWindow>>;

    /// Bring an existing window to the foreground
    async fn focus(&self, id: &WindowId) -> Result<()>;

    /// Open a new window at the given URL
    async fn open(&self, url: &str) -> Result<()>;
}

/// Console presenter for testing/development
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotificationPresenter;

#[async_trait]
impl NotificationPresenter for ConsoleNotificationPresenter {
    async fn show(&self, notification: Notification) -> Result<()> {
        println!(
            "[notification] {}: {} -> {}",
            notification.title, notification.body, notification.target_url
        );
        Ok(())
    }
}
