//! Prometheus metrics for issuance, verification and QR rendering.
//!
//! This module provides:
//! - Certificate issuance and rejection counters
//! - Verification hit/miss counters
//! - Store write and QR generation failure counters
//! - QR render latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Certificates issued counter metric name.
pub const METRIC_CERTIFICATES_ISSUED: &str = "certificates_issued_total";
/// Issuance requests rejected for missing fields.
pub const METRIC_CERTIFICATES_REJECTED: &str = "certificates_rejected_total";
/// Verification lookups counter metric name (labelled by result).
pub const METRIC_VERIFICATIONS: &str = "verifications_total";
/// Store write failures counter metric name.
pub const METRIC_STORE_WRITE_FAILURES: &str = "store_write_failures_total";
/// QR generation failures counter metric name.
pub const METRIC_QR_FAILURES: &str = "qr_generation_failures_total";
/// QR render latency metric name.
pub const METRIC_QR_RENDER_LATENCY: &str = "qr_render_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(
        METRIC_CERTIFICATES_ISSUED,
        "Total number of certificates issued"
    );
    describe_counter!(
        METRIC_CERTIFICATES_REJECTED,
        "Total number of issuance requests with missing fields"
    );
    describe_counter!(
        METRIC_VERIFICATIONS,
        "Total number of verification lookups by result"
    );
    describe_counter!(
        METRIC_STORE_WRITE_FAILURES,
        "Total number of failed certificate store writes"
    );
    describe_counter!(
        METRIC_QR_FAILURES,
        "Total number of failed QR image generations"
    );
    describe_histogram!(
        METRIC_QR_RENDER_LATENCY,
        "QR image render and write latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and return its render handle.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Increment certificates issued counter.
pub fn inc_certificates_issued() {
    counter!(METRIC_CERTIFICATES_ISSUED).increment(1);
}

/// Increment rejected issuance counter.
pub fn inc_certificates_rejected() {
    counter!(METRIC_CERTIFICATES_REJECTED).increment(1);
}

/// Record a verification lookup.
pub fn inc_verifications(valid: bool) {
    let result = if valid { "valid" } else { "invalid" };
    counter!(METRIC_VERIFICATIONS, "result" => result).increment(1);
}

/// Increment store write failure counter.
pub fn inc_store_write_failures() {
    counter!(METRIC_STORE_WRITE_FAILURES).increment(1);
}

/// Increment QR failure counter.
pub fn inc_qr_failures() {
    counter!(METRIC_QR_FAILURES).increment(1);
}

/// Record QR render latency.
pub fn record_qr_render_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_QR_RENDER_LATENCY).record(latency_ms);
}
