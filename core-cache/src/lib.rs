//! # Cache Strategy Module
//!
//! Turns intercepted requests into cached or fresh responses.
//!
//! ## Overview
//!
//! This module manages:
//! - Request classification through an ordered routing table
//!   ([`RouteMatcher`])
//! - The cache-first, stale-while-revalidate and network-first read
//!   strategies ([`StrategyExecutor`])
//! - Install, activation and bucket eviction, plus the navigation
//!   fallback chain ([`LifecycleManager`])
//!
//! Cache identity is normalized before every store and lookup; tracking
//! query parameters never fragment the cache.

pub mod error;
pub mod lifecycle;
pub mod router;
pub mod strategy;

pub use error::{CacheError, Result};
pub use lifecycle::{LifecycleConfig, LifecycleManager, LifecycleState};
pub use router::{normalize_cache_key, Route, RouteMatcher, StrategyKind};
pub use strategy::StrategyExecutor;
