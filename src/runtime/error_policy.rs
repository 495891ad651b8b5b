//! # Error Policy
//!
//! Backoff decisions for reconciliations that returned an error.

use crate::controller::reconciler::{ControllerContext, ReconcilerError};
use crate::crd::KafkaUser;
use crate::observability;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Fallback delay when the backoff map cannot be read
const FALLBACK_BACKOFF_SECS: u64 = 60;

/// Handle reconciliation errors with Fibonacci backoff
///
/// Backoff state is tracked per resource so one failing object never slows
/// down the others. A stale-snapshot conflict is retried at the minimum delay
/// without advancing the sequence.
pub fn handle_reconciliation_error(
    obj: Arc<KafkaUser>,
    error: &ReconcilerError,
    ctx: Arc<ControllerContext>,
) -> Action {
    let key = obj.object_key();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = key.name.as_str(),
        resource.namespace = key.namespace.as_str(),
        error = %error
    );
    let _error_guard = error_span.enter();

    observability::metrics::increment_reconciliation_errors();

    if error.is_conflict() {
        let delay = ctx.backoff_min_secs();
        info!("Object changed during reconcile, retrying in {}s", delay);
        observability::metrics::increment_requeues_total("conflict");
        return Action::requeue(Duration::from_secs(delay));
    }

    error!("Reconciliation error for {}: {}", key, error);

    let (backoff_seconds, error_count) = ctx.next_error_delay(&key).unwrap_or_else(|| {
        warn!("Backoff state unavailable, using default backoff");
        (FALLBACK_BACKOFF_SECS, 0)
    });

    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::seconds(i64::try_from(backoff_seconds).unwrap_or(i64::MAX));
    info!(
        error_count,
        next_retry = %next_trigger_time.to_rfc3339(),
        "Retrying with Fibonacci backoff: {}s",
        backoff_seconds
    );

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(Duration::from_secs(backoff_seconds))
}
