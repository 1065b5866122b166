// Metrics and observability module
// This file handles collection of quote latency, source failures and
// resolved route counts for the routing engine
//
// Numan Thabit 2025 Nov

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

pub static QUOTE_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "split_quote_latency_seconds",
        "latency of single source quote calls",
        &["source"]
    )
    .expect("register split_quote_latency_seconds")
});

pub static QUOTE_FAILURES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "split_quote_failures_total",
        "source quotes that failed or timed out and were counted as zero",
        &["source", "reason"]
    )
    .expect("register split_quote_failures_total")
});

pub static ROUTES_RESOLVED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "split_routes_resolved_total",
        "resolved routes by kind (direct, bridged, none)",
        &["kind"]
    )
    .expect("register split_routes_resolved_total")
});

/// Render every registered metric in the prometheus text format.
pub fn gather_text() -> String {
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&prometheus::gather(), &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
