//! Prometheus metrics for aggregate search.
//!
//! This module provides metrics for:
//! - Aggregate calls (outcome, latency, result sizes)
//! - Adapter queries (per adapter and status)
//! - Fallback and filtering
//! - Title resolution

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Aggregate Metrics
// =============================================================================

/// Aggregate calls total by view and result.
pub static AGGREGATES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fedsearch_aggregates_total", "Total aggregate search calls"),
        &["view", "result"], // "ok", "no_adapters", "unknown_view"
    )
    .unwrap()
});

/// Aggregate call duration in seconds.
pub static AGGREGATE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fedsearch_aggregate_duration_seconds",
            "Duration of aggregate search calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["view"],
    )
    .unwrap()
});

/// Records returned per aggregate call.
pub static AGGREGATE_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "fedsearch_aggregate_results",
            "Number of records returned per aggregate call",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0]),
    )
    .unwrap()
});

// =============================================================================
// Adapter Metrics
// =============================================================================

/// Adapter query operations by adapter and status.
pub static ADAPTER_QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fedsearch_adapter_queries_total", "Total adapter query operations"),
        &["adapter", "status"], // status: "ok", "error", "timeout"
    )
    .unwrap()
});

// =============================================================================
// Strategy Metrics
// =============================================================================

/// Fallback queries launched.
pub static FALLBACK_QUERIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fedsearch_fallback_queries_total",
        "Total fallback queries launched",
    )
    .unwrap()
});

/// Records removed by the result filter.
pub static RECORDS_FILTERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fedsearch_records_filtered_total",
        "Total records removed by result filtering",
    )
    .unwrap()
});

// =============================================================================
// Title Resolution Metrics
// =============================================================================

/// Title resolutions by status.
pub static RESOLVER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fedsearch_resolver_requests_total",
            "Total metadata title resolutions",
        ),
        &["status"], // "success", "error"
    )
    .unwrap()
});

/// Title resolution duration in seconds.
pub static RESOLVER_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "fedsearch_resolver_duration_seconds",
            "Duration of metadata title resolutions",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Aggregate
        Box::new(AGGREGATES_TOTAL.clone()),
        Box::new(AGGREGATE_DURATION.clone()),
        Box::new(AGGREGATE_RESULTS.clone()),
        // Adapters
        Box::new(ADAPTER_QUERIES.clone()),
        // Strategies
        Box::new(FALLBACK_QUERIES.clone()),
        Box::new(RECORDS_FILTERED.clone()),
        // Resolution
        Box::new(RESOLVER_REQUESTS.clone()),
        Box::new(RESOLVER_DURATION.clone()),
    ]
}
