//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `kafka_user_reconciliations_total{phase}` - Reconciliations by observed phase
//! - `kafka_user_reconcile_outcomes_total{outcome}` - Reconciliation results by outcome
//! - `kafka_user_reconciliation_errors_total` - Errors handed to the error policy
//! - `kafka_user_reconciliation_duration_seconds` - Duration of reconciliations
//! - `kafka_user_requeues_total{reason}` - Requeues scheduled by the dispatcher
//! - `kafka_user_provisioning_operations_total{operation,result}` - Provisioning backend calls
//! - `kafka_user_status_patch_failures_total` - Status patches that failed and were not escalated

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "kafka_user_reconciliations_total",
            "Total number of reconciliations by observed phase",
        ),
        &["phase"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILE_OUTCOMES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "kafka_user_reconcile_outcomes_total",
            "Total number of reconciliation outcomes",
        ),
        &["outcome"],
    )
    .expect("Failed to create RECONCILE_OUTCOMES_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "kafka_user_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "kafka_user_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "kafka_user_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static PROVISIONING_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "kafka_user_provisioning_operations_total",
            "Total number of provisioning backend operations",
        ),
        &["operation", "result"],
    )
    .expect("Failed to create PROVISIONING_OPERATIONS_TOTAL metric - this should never happen")
});

static STATUS_PATCH_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "kafka_user_status_patch_failures_total",
        "Total number of status patches that failed",
    )
    .expect("Failed to create STATUS_PATCH_FAILURES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only when a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILE_OUTCOMES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PROVISIONING_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_PATCH_FAILURES_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_reconciliations(phase: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[phase]).inc();
}

pub fn increment_reconcile_outcome(outcome: &str) {
    RECONCILE_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn increment_provisioning_operations(operation: &str, result: &str) {
    PROVISIONING_OPERATIONS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
}

pub fn increment_status_patch_failures() {
    STATUS_PATCH_FAILURES_TOTAL.inc();
}
