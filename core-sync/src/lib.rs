//! # Sync Module
//!
//! Orchestrates reconciliation of the offline queue with the remote
//! endpoint.
//!
//! ## Overview
//!
//! This module manages:
//! - The foreground-facing record queue (`OfflineQueue`)
//! - Batch submission and queue draining (`SyncReconciler`)
//! - The background trigger contract (`SYNC_TAG`)
//!
//! Reconciliation is a write-ahead drain: records are deleted only after
//! the endpoint acknowledged the batch, so delivery toward the endpoint
//! is at-least-once and local deletion at-most-once. Outcomes reach
//! foreground contexts through the engine event bus.

pub mod error;
pub mod queue;
pub mod reconciler;

pub use error::{Result, SyncError};
pub use queue::OfflineQueue;
pub use reconciler::{SyncReconciler, SYNC_TAG};
