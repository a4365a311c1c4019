// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Cluster API provider operator.
//!
//! All metrics carry the `capi_operator_` prefix.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - reconcile outcomes, durations and requeues
//! - **Phase Metrics** - classified phase failures by phase and reason
//! - **Component Metrics** - provider component objects applied and deleted
//! - **Leader Election Metrics** - leadership state changes
//!
//! # Example
//!
//! ```rust,no_run
//! use capi_operator::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("CoreProvider", std::time::Duration::from_secs(1));
//! ```

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all operator metrics
const METRICS_NAMESPACE: &str = "capi_operator";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry, served on `/metrics`.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Create and register a counter family under the operator prefix.
///
/// # Panics
/// When a family with the same name is already registered.
fn register_counter(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let opts = Opts::new(format!("{METRICS_NAMESPACE}_{name}"), help);
    let counter = CounterVec::new(opts, labels).expect("valid counter options");
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .expect("counter registered once");
    counter
}

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Reconciliations by provider kind and outcome (`success`, `error`, `requeue`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "reconciliations_total",
        "Total number of reconciliations by resource type and status",
        &["resource_type", "status"],
    )
});

/// Reconcile wall time per provider kind.
///
/// Buckets reach ten minutes because install waits for Deployments.
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![
        0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0,
    ]);
    let histogram =
        HistogramVec::new(opts, &["resource_type"]).expect("valid histogram options");
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("histogram registered once");
    histogram
});

/// Requeues by provider kind and reason (a condition reason, `ready` or `error`)
pub static REQUEUE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "requeues_total",
        "Total number of requeue operations by resource type and reason",
        &["resource_type", "reason"],
    )
});

// ============================================================================
// Phase Metrics
// ============================================================================

/// Classified phase failures, labelled with the phase and the condition reason
pub static PHASE_FAILURES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "phase_failures_total",
        "Total number of phase failures by resource type, phase and reason",
        &["resource_type", "phase", "reason"],
    )
});

// ============================================================================
// Component Metrics
// ============================================================================

pub static COMPONENTS_APPLIED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "components_applied_total",
        "Total number of provider component objects applied by resource type",
        &["resource_type"],
    )
});

pub static COMPONENTS_DELETED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "components_deleted_total",
        "Total number of provider component objects deleted by resource type",
        &["resource_type"],
    )
});

/// Providers whose finalizer completed
pub static PROVIDERS_DELETED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "providers_deleted_total",
        "Total number of providers deleted by resource type",
        &["resource_type"],
    )
});

// ============================================================================
// Leader Election Metrics
// ============================================================================

/// Lease transitions (`acquired`, `lost`)
pub static LEADER_ELECTIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "leader_elections_total",
        "Total number of leader election events by status",
        &["status"],
    )
});

/// 1 while this pod holds the lease, 0 otherwise
pub static LEADER_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_leader_status"),
        "Current leader election status (1 = leader, 0 = follower)",
    );
    let gauge = GaugeVec::new(opts, &["pod_name"]).expect("valid gauge options");
    METRICS_REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("gauge registered once");
    gauge
});

// ============================================================================
// Helper Functions
// ============================================================================

fn record_reconciliation(resource_type: &str, outcome: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, outcome])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a reconcile that returned `Ok`
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    record_reconciliation(resource_type, "success", duration);
}

/// Record a reconcile that returned an error to the controller runtime
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    record_reconciliation(resource_type, "error", duration);
}

/// Record a reconciliation requeue
///
/// # Arguments
/// * `resource_type` - provider kind
/// * `reason` - why the provider is requeued
pub fn record_reconciliation_requeue(resource_type: &str, reason: &str) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "requeue"])
        .inc();
    REQUEUE_TOTAL
        .with_label_values(&[resource_type, reason])
        .inc();
}

/// Record a classified phase failure
pub fn record_phase_failure(resource_type: &str, phase: &str, reason: &str) {
    PHASE_FAILURES_TOTAL
        .with_label_values(&[resource_type, phase, reason])
        .inc();
}

/// Record component objects applied during install
pub fn record_components_applied(resource_type: &str, count: usize) {
    COMPONENTS_APPLIED_TOTAL
        .with_label_values(&[resource_type])
        .inc_by(count as f64);
}

/// Record component objects removed during delete
pub fn record_components_deleted(resource_type: &str, count: usize) {
    COMPONENTS_DELETED_TOTAL
        .with_label_values(&[resource_type])
        .inc_by(count as f64);
}

/// Record a provider whose finalizer completed
pub fn record_provider_deleted(resource_type: &str) {
    PROVIDERS_DELETED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record that `pod_name` acquired the lease
pub fn record_leader_elected(pod_name: &str) {
    set_leader(pod_name, "acquired", 1.0);
}

/// Record that `pod_name` lost the lease
pub fn record_leader_lost(pod_name: &str) {
    set_leader(pod_name, "lost", 0.0);
}

fn set_leader(pod_name: &str, event: &str, value: f64) {
    LEADER_ELECTIONS_TOTAL.with_label_values(&[event]).inc();
    LEADER_STATUS.with_label_values(&[pod_name]).set(value);
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

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
