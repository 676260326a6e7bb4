// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the dnshortcut controller.
//!
//! All metric names carry the `dnshortcut_` prefix.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Passes by outcome and how long they took
//! - **Table Metrics** - Size of the hostname table and the address cache
//! - **Event Metrics** - Watch events handled and extraction misses
//!
//! # Example
//!
//! ```rust,no_run
//! use dnshortcut::metrics::{gather_metrics, record_reconciliation};
//!
//! record_reconciliation("published", std::time::Duration::from_millis(40));
//! let text = gather_metrics().unwrap();
//! ```

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all dnshortcut metrics
const METRICS_NAMESPACE: &str = "dnshortcut";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliation passes by outcome
///
/// Labels:
/// - `outcome`: `published`, `up_to_date` or `failed`
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliation passes by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliation passes in seconds, publish call included
///
/// Labels:
/// - `outcome`: `published`, `up_to_date` or `failed`
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliation passes in seconds by outcome",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]);
    let histogram = HistogramVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Table Metrics
// ============================================================================

/// Number of hostnames currently in the table
pub static HOSTNAMES: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_hostnames"),
        "Number of hostnames in the shortcut table",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Number of load balancer addresses in the address cache
pub static ADDRESS_CACHE_ENTRIES: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_address_cache_entries"),
        "Number of load balancer addresses mapped to cluster IPs",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Event Metrics
// ============================================================================

/// Total number of watch events handled
///
/// Labels:
/// - `resource`: Plural resource name (e.g., `httpproxies`, `services`)
/// - `event`: `added`, `updated` or `deleted`
pub static RESOURCE_EVENTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resource_events_total"),
        "Total number of watch events handled by resource and event",
    );
    let counter = CounterVec::new(opts, &["resource", "event"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of objects skipped because a field could not be extracted
///
/// Labels:
/// - `resource`: Plural resource name
/// - `field`: `hostname`, `address` or `cache`
pub static EXTRACTION_MISSES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_extraction_misses_total"),
        "Total number of extraction misses by resource and field",
    );
    let counter = CounterVec::new(opts, &["resource", "field"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a finished reconciliation pass
///
/// # Arguments
/// * `outcome` - `published`, `up_to_date` or `failed`
/// * `duration` - Duration of the pass
pub fn record_reconciliation(outcome: &str, duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&[outcome]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

/// Record the current table sizes
pub fn record_table_sizes(hostnames: usize, cache_entries: usize) {
    HOSTNAMES.set(i64::try_from(hostnames).unwrap_or(i64::MAX));
    ADDRESS_CACHE_ENTRIES.set(i64::try_from(cache_entries).unwrap_or(i64::MAX));
}

/// Record a handled watch event
pub fn record_resource_event(resource: &str, event: &str) {
    RESOURCE_EVENTS_TOTAL
        .with_label_values(&[resource, event])
        .inc();
}

/// Record an extraction miss
pub fn record_extraction_miss(resource: &str, field: &str) {
    EXTRACTION_MISSES_TOTAL
        .with_label_values(&[resource, field])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
