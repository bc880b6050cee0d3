//! Foreground Message Protocol
//!
//! Inbound `{ "type": ... }` envelopes posted by foreground contexts, plus
//! the push payload model. Both directions are permissive: unknown message
//! types are ignored and malformed push payloads degrade to a generic
//! notification instead of being dropped.

use bridge_traits::notify::Notification;
use serde::Deserialize;
use tracing::debug;

/// Title of the locally triggered test notification.
pub const TEST_NOTIFICATION_TITLE: &str = "Test notification";
/// Body of the locally triggered test notification.
pub const TEST_NOTIFICATION_BODY: &str = "Notifications are working correctly.";

/// Icon and badge shown when a push carries neither.
pub const DEFAULT_NOTIFICATION_ICON: &str = "/icons/icon.svg";

const DEFAULT_PUSH_TITLE: &str = "New notification";
const DEFAULT_PUSH_BODY: &str = "You have an update available.";

/// Commands a foreground context can post to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Request an immediate reconciliation attempt
    #[serde(rename = "MANUAL_SYNC")]
    ManualSync,
    /// Show a fixed local notification to verify the presentation path
    #[serde(rename = "SHOW_TEST_NOTIFICATION")]
    ShowTestNotification,
}

impl ClientMessage {
    /// Parse a foreground envelope.
    ///
    /// Returns `None` for malformed JSON or an unrecognized `type`; both
    /// are dropped silently so a newer foreground build never breaks an
    /// older engine.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        match serde_json::from_slice(raw) {
            Ok(message) => Some(message),
            Err(e) => {
                debug!(error = %e, "Ignoring unrecognized foreground message");
                None
            }
        }
    }
}

/// A push payload after parsing and defaulting.
///
/// Every field is optional on the wire. A missing field takes its default,
/// a payload that is not a JSON object becomes the body of an otherwise
/// generic notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub url: String,
    pub icon: String,
    pub badge: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawPush {
    title: Option<String>,
    body: Option<String>,
    url: Option<String>,
    icon: Option<String>,
    badge: Option<String>,
}

impl Default for PushPayload {
    fn default() -> Self {
        Self {
            title: DEFAULT_PUSH_TITLE.to_string(),
            body: DEFAULT_PUSH_BODY.to_string(),
            url: "/".to_string(),
            icon: DEFAULT_NOTIFICATION_ICON.to_string(),
            badge: DEFAULT_NOTIFICATION_ICON.to_string(),
        }
    }
}

impl PushPayload {
    /// Interpret raw push bytes.
    pub fn from_raw(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        match serde_json::from_slice::<RawPush>(raw) {
            Ok(parsed) => {
                let defaults = Self::default();
                Self {
                    title: parsed.title.unwrap_or(defaults.title),
                    body: parsed.body.unwrap_or(defaults.body),
                    url: parsed.url.unwrap_or(defaults.url),
                    icon: parsed.icon.unwrap_or(defaults.icon),
                    badge: parsed.badge.unwrap_or(defaults.badge),
                }
            }
            Err(_) => Self {
                body: String::from_utf8_lossy(raw).into_owned(),
                ..Self::default()
            },
        }
    }

    /// Convert into the host notification, carrying the target URL for
    /// click routing.
    pub fn into_notification(self) -> Notification {
        Notification::new(self.title, self.body)
            .icon(self.icon)
            .badge(self.badge)
            .target_url(self.url)
    }
}

/// The fixed notification behind `SHOW_TEST_NOTIFICATION`.
pub fn test_notification() -> Notification {
    Notification::new(TEST_NOTIFICATION_TITLE, TEST_NOTIFICATION_BODY)
        .icon(DEFAULT_NOTIFICATION_ICON)
        .badge(DEFAULT_NOTIFICATION_ICON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manual_sync() {
        let message = ClientMessage::parse(br#"{"type":"MANUAL_SYNC"}"#);
        assert_eq!(message, Some(ClientMessage::ManualSync));
    }

    #[test]
    fn test_parse_show_test_notification() {
        let message = ClientMessage::parse(br#"{"type":"SHOW_TEST_NOTIFICATION"}"#);
        assert_eq!(message, Some(ClientMessage::ShowTestNotification));
    }

    #[test]
    fn test_parse_tolerates_extra_fields() {
        let message = ClientMessage::parse(br#"{"type":"MANUAL_SYNC","payload":{"reason":"user"}}"#);
        assert_eq!(message, Some(ClientMessage::ManualSync));
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert_eq!(ClientMessage::parse(br#"{"type":"SELF_DESTRUCT"}"#), None);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert_eq!(ClientMessage::parse(b"not json at all"), None);
        assert_eq!(ClientMessage::parse(b""), None);
    }

    #[test]
    fn test_empty_push_is_fully_generic() {
        let payload = PushPayload::from_raw(b"");

        assert_eq!(payload.title, "New notification");
        assert_eq!(payload.body, "You have an update available.");
        assert_eq!(payload.url, "/");
        assert_eq!(payload.icon, "/icons/icon.svg");
        assert_eq!(payload.badge, "/icons/icon.svg");
    }

    #[test]
    fn test_push_fields_override_defaults() {
        let payload = PushPayload::from_raw(
            br#"{"title":"Fresh data","body":"3 records updated","url":"/records"}"#,
        );

        assert_eq!(payload.title, "Fresh data");
        assert_eq!(payload.body, "3 records updated");
        assert_eq!(payload.url, "/records");
        assert_eq!(payload.icon, "/icons/icon.svg");
    }

    #[test]
    fn test_push_null_field_takes_default() {
        let payload = PushPayload::from_raw(br#"{"title":null,"body":"only a body"}"#);

        assert_eq!(payload.title, "New notification");
        assert_eq!(payload.body, "only a body");
    }

    #[test]
    fn test_non_json_push_becomes_body() {
        let payload = PushPayload::from_raw(b"maintenance window at noon");

        assert_eq!(payload.title, "New notification");
        assert_eq!(payload.body, "maintenance window at noon");
        assert_eq!(payload.url, "/");
    }

    #[test]
    fn test_into_notification_carries_routing_target() {
        let notification = PushPayload::from_raw(br#"{"title":"Hi","url":"/records/7"}"#)
            .into_notification();

        assert_eq!(notification.title, "Hi");
        assert_eq!(notification.target_url, "/records/7");
        assert_eq!(notification.icon, Some("/icons/icon.svg".to_string()));
        assert_eq!(notification.badge, Some("/icons/icon.svg".to_string()));
    }

    #[test]
    fn test_test_notification_copy_is_fixed() {
        let notification = test_notification();

        assert_eq!(notification.title, "Test notification");
        assert_eq!(notification.body, "Notifications are working correctly.");
        assert_eq!(notification.target_url, "/");
    }
}
