//! # Event Bus System
//!
//! Outbound channel from the background engine to foreground contexts, built
//! on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **EngineEvent**: the serializable message envelope delivered to
//!   foreground subscribers
//! - **EventBus**: central broadcast channel for publishing events
//! - **EventStream**: wrapper for consuming events with filtering
//! - **Subscription Management**: multiple subscribers listen independently
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    emit     ┌───────────┐
//! │ Sync Reconciler ├────────────>│           │
//! └─────────────────┘             │ EventBus  │    subscribe   ┌────────────────────┐
//!                                 │ (broadcast├───────────────>│ Foreground context │
//!                                 │  channel) │                └────────────────────┘
//!                                 │           │    subscribe   ┌────────────────────┐
//!                                 │           ├───────────────>│ Foreground context │
//!                                 └───────────┘                └────────────────────┘
//! ```
//!
//! Delivery is fire-and-forget: an emission reaches the subscribers present
//! at call time, is never retried, and is not acknowledged. A foreground
//! that subscribes later does not see past events.
//!
//! ## Wire Format
//!
//! Events serialize with a `type` tag and a `payload` body, which is the
//! envelope foreground message handlers expect:
//!
//! ```json
//! { "type": "SYNC_COMPLETED", "payload": { "ids": [1001] } }
//! { "type": "SYNC_ERROR", "payload": { "message": "sync endpoint rejected batch" } }
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, EngineEvent};
//! use tokio::sync::broadcast::error::RecvError;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus.emit(EngineEvent::SyncCompleted { ids: vec![1001] }).ok();
//!
//! match subscriber.recv().await {
//!     Ok(event) => println!("received: {:?}", event),
//!     Err(RecvError::Lagged(n)) => eprintln!("missed {} events", n),
//!     Err(RecvError::Closed) => {}
//! }
//! # }
//! ```
//!
//! ## Error Handling
//!
//! The bus uses `tokio::sync::broadcast`, which can produce two errors on
//! the receiving side:
//!
//! - **`RecvError::Lagged(n)`**: subscriber was too slow and missed `n`
//!   events. Non-fatal; the subscriber keeps receiving new events.
//! - **`RecvError::Closed`**: all senders dropped, engine shut down.
//!
//! Emission with no subscribers returns an error which callers ignore; a
//! reconciliation outcome with nobody listening is simply dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// This value balances memory usage with the ability to handle bursts of
/// events. Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Engine Events
// ============================================================================

/// Messages delivered from the background engine to foreground contexts.
///
/// Serialization produces the `{ type, payload }` envelope documented at the
/// module level; the variant names below map to the wire-level `type` tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum EngineEvent {
    /// A reconciliation attempt succeeded; the listed record identifiers
    /// were accepted by the remote endpoint and removed from the queue.
    #[serde(rename = "SYNC_COMPLETED")]
    SyncCompleted { ids: Vec<i64> },
    /// A reconciliation attempt failed; queued records were left untouched.
    #[serde(rename = "SYNC_ERROR")]
    SyncError { message: String },
}

impl EngineEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            EngineEvent::SyncCompleted { .. } => "Reconciliation completed",
            EngineEvent::SyncError { .. } => "Reconciliation failed",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            EngineEvent::SyncCompleted { .. } => EventSeverity::Info,
            EngineEvent::SyncError { .. } => EventSeverity::Error,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to engine events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EngineEvent};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let event_bus = EventBus::new(100);
///
/// let mut subscriber1 = event_bus.subscribe();
/// let mut subscriber2 = event_bus.subscribe();
///
/// event_bus
///     .emit(EngineEvent::SyncError {
///         message: "endpoint unreachable".to_string(),
///     })
///     .ok();
///
/// // Both subscribers receive the event
/// assert!(subscriber1.recv().await.is_ok());
/// assert!(subscriber2.recv().await.is_ok());
/// # }
/// ```
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers; callers treat
    /// that as a dropped best-effort delivery, not a failure.
    pub fn emit(&self, event: EngineEvent) -> Result<usize, SendError<EngineEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all
    /// future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&EngineEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering
/// capabilities.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, EngineEvent};
///
/// let event_bus = EventBus::new(100);
/// let stream = EventStream::new(event_bus.subscribe());
///
/// // Only watch for failures
/// let mut error_stream = stream.filter(|event| {
///     matches!(event, EngineEvent::SyncError { .. })
/// });
/// ```
pub struct EventStream {
    receiver: Receiver<EngineEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<EngineEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&EngineEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events. Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<EngineEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<EngineEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
