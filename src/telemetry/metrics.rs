//! Metric instrument factories for healthwatch.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"healthwatch"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for healthwatch instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("healthwatch")
}

/// Counter: provider events ingested and written through the store.
/// Labels: `result` ("ok" | "error").
pub fn events_ingested() -> Counter<u64> {
    meter()
        .u64_counter("healthwatch.ingest.events")
        .with_description("Number of provider events ingested")
        .build()
}

/// Counter: change-feed entries classified.
/// Labels: `outcome` ("created" | "modified" | "suppressed" | "malformed" | "failed").
pub fn entries_classified() -> Counter<u64> {
    meter()
        .u64_counter("healthwatch.feed.entries")
        .with_description("Number of change-feed entries classified")
        .build()
}

/// Counter: record store operations (put, get, read, ack, purge).
/// Labels: `operation`.
pub fn store_operations() -> Counter<u64> {
    meter()
        .u64_counter("healthwatch.store.operations")
        .with_description("Number of record store operations")
        .build()
}

/// Counter: notification delivery attempts.
/// Labels: `channel` ("primary" | "secondary"), `result` ("ok" | "error").
pub fn notifications() -> Counter<u64> {
    meter()
        .u64_counter("healthwatch.notify.deliveries")
        .with_description("Number of notification delivery attempts")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("healthwatch.operation.duration_ms")
        .with_description("Operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
