//! # Types
//!
//! Core types for the reconciler.

use crate::controller::backoff::FibonacciBackoff;
use crate::controller::reconciler::store::{ResourceStore, StoreError};
use crate::crd::ObjectKey;
use crate::provider::{ProvisionError, ProvisioningClient};
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to fetch KafkaUser {key}: {source}")]
    Fetch {
        key: ObjectKey,
        #[source]
        source: StoreError,
    },
    #[error("failed to add finalizer to {key}: {source}")]
    AddFinalizer {
        key: ObjectKey,
        #[source]
        source: StoreError,
    },
    #[error("failed to remove finalizer from {key}: {source}")]
    RemoveFinalizer {
        key: ObjectKey,
        #[source]
        source: StoreError,
    },
    #[error("failed to create user in kafka: {0}")]
    Provisioning(#[from] ProvisionError),
}

impl ReconcilerError {
    /// True when the failure came from a stale snapshot
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            ReconcilerError::Fetch { source, .. }
            | ReconcilerError::AddFinalizer { source, .. }
            | ReconcilerError::RemoveFinalizer { source, .. } => source.is_conflict(),
            ReconcilerError::Provisioning(_) => false,
        }
    }
}

/// Result of one reconciliation, interpreted by the dispatcher
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// Nothing left to do until the object changes
    Done,
    /// Re-invoke promptly without backoff
    RequeueNow,
    /// Re-invoke according to the dispatcher's backoff policy
    Error(ReconcilerError),
}

impl ReconcileOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Done => "done",
            ReconcileOutcome::RequeueNow => "requeue_now",
            ReconcileOutcome::Error(_) => "error",
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, ReconcileOutcome::Done)
    }

    #[must_use]
    pub fn is_requeue_now(&self) -> bool {
        matches!(self, ReconcileOutcome::RequeueNow)
    }

    #[must_use]
    pub fn error(&self) -> Option<&ReconcilerError> {
        match self {
            ReconcileOutcome::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Translate into the controller runtime's scheduling vocabulary
    ///
    /// Errors are returned as `Err` so the error policy decides the delay.
    pub fn into_action(self) -> Result<Action, ReconcilerError> {
        match self {
            ReconcileOutcome::Done => Ok(Action::await_change()),
            ReconcileOutcome::RequeueNow => Ok(Action::requeue(Duration::ZERO)),
            ReconcileOutcome::Error(e) => Err(e),
        }
    }
}

/// Lifecycle phase derived from observable fields; never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Deletion requested
    Deleting,
    /// Not deleting, finalizer marker absent
    PendingFinalizer,
    /// Finalizer present, Kafka user absent
    Provisioning,
    /// Finalizer present, Kafka user present
    Steady,
}

impl Phase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Deleting => "deleting",
            Phase::PendingFinalizer => "pending_finalizer",
            Phase::Provisioning => "provisioning",
            Phase::Steady => "steady",
        }
    }
}

/// Reconciler for `KafkaUser` resources
///
/// Holds no mutable state of its own. Both collaborators are injected so
/// production and test implementations are interchangeable.
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn ResourceStore>,
    pub kafka: Arc<dyn ProvisioningClient>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(store: Arc<dyn ResourceStore>, kafka: Arc<dyn ProvisioningClient>) -> Self {
        Self { store, kafka }
    }
}

/// Per-resource backoff tracking for the error policy
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}

/// Shared context handed to every reconciliation by the controller runtime
///
/// Backoff lives here rather than in `Reconciler`, which stays stateless.
#[derive(Debug)]
pub struct ControllerContext {
    pub reconciler: Reconciler,
    backoff_states: Mutex<HashMap<ObjectKey, BackoffState>>,
    backoff_min_secs: u64,
    backoff_max_secs: u64,
}

impl ControllerContext {
    #[must_use]
    pub fn new(reconciler: Reconciler, backoff_min_secs: u64, backoff_max_secs: u64) -> Self {
        Self {
            reconciler,
            backoff_states: Mutex::new(HashMap::new()),
            backoff_min_secs,
            backoff_max_secs,
        }
    }

    #[must_use]
    pub fn backoff_min_secs(&self) -> u64 {
        self.backoff_min_secs
    }

    /// Advance the backoff of `key`; returns the delay and the consecutive error count
    ///
    /// Returns `None` if the backoff map is poisoned.
    pub fn next_error_delay(&self, key: &ObjectKey) -> Option<(u64, u32)> {
        let mut states = self.backoff_states.lock().ok()?;
        let state = states
            .entry(key.clone())
            .or_insert_with(|| BackoffState::new(self.backoff_min_secs, self.backoff_max_secs));
        state.increment_error();
        Some((state.backoff.next_backoff_seconds(), state.error_count))
    }

    /// Forget the backoff of `key` after a successful reconciliation
    pub fn reset_backoff(&self, key: &ObjectKey) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(key);
        }
    }

    #[must_use]
    pub fn tracked_backoffs(&self) -> usize {
        self.backoff_states.lock().map(|s| s.len()).unwrap_or_default()
    }
}
