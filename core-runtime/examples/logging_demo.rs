//! Logging system demonstration
//!
//! This example shows how to use the logging infrastructure in different modes.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Compact format
//! cargo run --example logging_demo -- compact
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::env;
use tracing::{debug, info, instrument, span, trace, warn, Level};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let format = if args.len() > 1 {
        match args[1].as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Pretty,
        }
    } else {
        LogFormat::default()
    };

    let filter = args.get(2).cloned();

    // Initialize logging
    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true)
        .with_target(true);

    if let Some(f) = filter {
        config = config.with_filter(f);
    }

    init_logging(config).expect("Failed to initialize logging");

    info!("=== Logging System Demo ===");
    info!(format = ?format, "Logging initialized");

    demo_log_levels();
    demo_fetch_routing();
    demo_reconciliation().await;

    info!("=== Demo Complete ===");
}

fn demo_log_levels() {
    let span = span!(Level::INFO, "log_levels");
    let _enter = span.enter();

    trace!("This is a TRACE level log");
    debug!("This is a DEBUG level log");
    info!("This is an INFO level log");
    warn!("This is a WARN level log");
}

fn demo_fetch_routing() {
    let span = span!(
        Level::INFO,
        "handle_fetch",
        url = "https://app.example.com/api/entries"
    );
    let _enter = span.enter();

    debug!(
        strategy = "network-first",
        bucket = "awp-data-v1",
        "Request classified"
    );
    warn!("Network unreachable, falling back to cache");
    info!(status = 200, age_ms = 52_000, "Served cached copy");
}

#[instrument(fields(pending = 3))]
async fn demo_reconciliation() {
    info!("Submitting batch");

    for id in [1001_i64, 1002, 1003] {
        process_record(id).await;
    }

    info!(synced = 3, deleted = 3, "Batch acknowledged");
}

#[instrument(fields(record_id = id))]
async fn process_record(id: i64) {
    trace!("Record accepted by endpoint");
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
}
