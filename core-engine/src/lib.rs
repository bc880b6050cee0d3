//! # Offline Engine Facade
//!
//! Assembles the full offline-resilience engine from its component crates
//! and exposes the host-facing surface.
//!
//! ## Overview
//!
//! - **OfflineEngine**: construction, lifecycle and every host callback
//!   (fetch interception, foreground messages, background triggers, push,
//!   notification clicks, connectivity watching)
//! - **ClientMessage / PushPayload**: the inbound wire protocol
//!
//! Hosts provide the platform bridges through
//! [`EngineConfig`](core_runtime::config::EngineConfig), construct an
//! [`OfflineEngine`], call [`OfflineEngine::start`] once, then forward
//! their interception and platform callbacks.

pub mod engine;
pub mod error;
pub mod messages;

pub use engine::OfflineEngine;
pub use error::{EngineError, Result};
pub use messages::{ClientMessage, PushPayload};

pub use core_cache::LifecycleState;
pub use core_runtime::config::EngineConfig;
pub use core_sync::SYNC_TAG;
