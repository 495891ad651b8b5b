//! # Reconciliation Logic
//!
//! Drives one `KafkaUser` toward its declared state.
//!
//! ## Phases
//!
//! The phase is derived on every call from a freshly fetched snapshot:
//!
//! 1. **Deleting** - delete the Kafka user, then drop our finalizer
//! 2. **PendingFinalizer** - add our finalizer and requeue
//! 3. **Provisioning** - create the Kafka user, record `Created`
//! 4. **Steady** - re-assert `Created=True`, no backend call
//!
//! The finalizer is persisted in its own step before any `create` call, so a
//! provisioned user is always guarded by a finalizer. On deletion the user is
//! removed before the finalizer, so the object never disappears ahead of its
//! cleanup.

use crate::constants::{
    CONDITION_CREATED, FINALIZER_NAME, MESSAGE_USER_CREATED, REASON_CREATE_FAILED, REASON_SUCCESS,
};
use crate::controller::reconciler::store::StoreError;
use crate::controller::reconciler::types::{
    ControllerContext, Phase, ReconcileOutcome, Reconciler, ReconcilerError,
};
use crate::controller::reconciler::{conditions, finalizers};
use crate::crd::{ConditionStatus, KafkaUser, ObjectKey};
use crate::observability;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

/// Entry point for the controller runtime
///
/// The watched object only supplies the key; state is always re-fetched.
pub async fn reconcile(
    obj: Arc<KafkaUser>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcilerError> {
    let key = obj.object_key();
    let outcome = ctx.reconciler.reconcile(&key).await;

    match &outcome {
        ReconcileOutcome::Error(_) => {}
        ReconcileOutcome::RequeueNow => {
            ctx.reset_backoff(&key);
            observability::metrics::increment_requeues_total("requeue-now");
        }
        ReconcileOutcome::Done => ctx.reset_backoff(&key),
    }
    outcome.into_action()
}

impl Reconciler {
    /// Reconcile the object identified by `key`
    ///
    /// The dispatcher must not run two invocations for the same key at once.
    pub async fn reconcile(&self, key: &ObjectKey) -> ReconcileOutcome {
        let start = Instant::now();
        let span = tracing::info_span!(
            "reconcile",
            resource.namespace = key.namespace.as_str(),
            resource.name = key.name.as_str(),
            resource.kind = "KafkaUser"
        );

        let outcome = self.run(key).instrument(span.clone()).await;

        observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
        observability::metrics::increment_reconcile_outcome(outcome.as_str());
        span.in_scope(|| match &outcome {
            ReconcileOutcome::Error(e) => {
                error!(error = %e, "Reconcile failed");
            }
            other => {
                debug!(outcome = other.as_str(), "Reconcile completed");
            }
        });
        outcome
    }

    /// Phase of `user`; queries the backend only once a finalizer is in place
    pub async fn observe_phase(&self, user: &KafkaUser) -> Phase {
        if user.is_deleting() {
            Phase::Deleting
        } else if !finalizers::contains(user.finalizers(), FINALIZER_NAME) {
            Phase::PendingFinalizer
        } else if self.kafka.exists(&user.object_key().name).await {
            Phase::Steady
        } else {
            Phase::Provisioning
        }
    }

    async fn run(&self, key: &ObjectKey) -> ReconcileOutcome {
        let original = match self.store.get(key).await {
            Ok(Some(user)) => user,
            Ok(None) | Err(StoreError::NotFound(_)) => {
                debug!("KafkaUser no longer exists, nothing to do");
                return ReconcileOutcome::Done;
            }
            Err(source) => {
                return ReconcileOutcome::Error(ReconcilerError::Fetch {
                    key: key.clone(),
                    source,
                })
            }
        };

        let phase = self.observe_phase(&original).await;
        observability::metrics::increment_reconciliations(phase.as_str());
        info!(phase = phase.as_str(), "Reconcile started");

        match phase {
            Phase::Deleting => self.finalize_deletion(key, &original).await,
            Phase::PendingFinalizer => self.add_finalizer(key, &original).await,
            Phase::Provisioning => self.provision(key, &original).await,
            Phase::Steady => {
                info!("User already exists in Kafka, skipping creation");
                self.assert_created(&original, original.clone()).await
            }
        }
    }

    async fn finalize_deletion(&self, key: &ObjectKey, original: &KafkaUser) -> ReconcileOutcome {
        if !finalizers::contains(original.finalizers(), FINALIZER_NAME) {
            debug!("Finalizer already removed, waiting for physical removal");
            return ReconcileOutcome::Done;
        }

        self.kafka.delete(&key.name).await;
        info!(username = key.name.as_str(), "Deleted user from Kafka");

        let mut updated = original.clone();
        let mut markers = original.finalizers().to_vec();
        finalizers::remove(&mut markers, FINALIZER_NAME);
        updated.metadata.finalizers = Some(markers);

        match self.store.patch_spec(original, &updated).await {
            Ok(()) => {
                info!("Finalizer removed");
                ReconcileOutcome::Done
            }
            Err(StoreError::NotFound(_)) => ReconcileOutcome::Done,
            Err(source) => {
                error!(error = %source, "Failed to remove finalizer");
                ReconcileOutcome::Error(ReconcilerError::RemoveFinalizer {
                    key: key.clone(),
                    source,
                })
            }
        }
    }

    async fn add_finalizer(&self, key: &ObjectKey, original: &KafkaUser) -> ReconcileOutcome {
        info!("Adding finalizer");
        let mut updated = original.clone();
        let mut markers = original.finalizers().to_vec();
        finalizers::add(&mut markers, FINALIZER_NAME);
        updated.metadata.finalizers = Some(markers);

        match self.store.patch_spec(original, &updated).await {
            // Fresh fetch before any provisioning call
            Ok(()) => ReconcileOutcome::RequeueNow,
            Err(StoreError::NotFound(_)) => ReconcileOutcome::Done,
            Err(source) => {
                error!(error = %source, "Failed to add finalizer");
                ReconcileOutcome::Error(ReconcilerError::AddFinalizer {
                    key: key.clone(),
                    source,
                })
            }
        }
    }

    async fn provision(&self, key: &ObjectKey, original: &KafkaUser) -> ReconcileOutcome {
        info!("Creating user in Kafka");
        match self.kafka.create(&key.name).await {
            Ok(()) => info!("User created in Kafka"),
            Err(e) if e.is_already_exists() => {
                info!("User appeared in Kafka since the existence check, treating as created");
            }
            Err(e) => {
                error!(error = %e, "Failed to create user in Kafka");
                self.record_create_failure(original, &e.to_string()).await;
                return ReconcileOutcome::Error(ReconcilerError::Provisioning(e));
            }
        }

        self.assert_created(original, original.clone()).await
    }

    /// Best effort: a failed status patch is logged, never escalated
    async fn record_create_failure(&self, original: &KafkaUser, message: &str) {
        let mut updated = original.clone();
        let status = updated.status.get_or_insert_with(Default::default);
        if !conditions::upsert(
            &mut status.conditions,
            CONDITION_CREATED,
            ConditionStatus::False,
            REASON_CREATE_FAILED,
            message,
        ) {
            return;
        }

        if let Err(e) = self.store.patch_status(original, &updated).await {
            observability::metrics::increment_status_patch_failures();
            error!(error = %e, "Failed to update status after error");
        }
    }

    async fn assert_created(
        &self,
        original: &KafkaUser,
        mut updated: KafkaUser,
    ) -> ReconcileOutcome {
        let status = updated.status.get_or_insert_with(Default::default);
        if !conditions::upsert(
            &mut status.conditions,
            CONDITION_CREATED,
            ConditionStatus::True,
            REASON_SUCCESS,
            MESSAGE_USER_CREATED,
        ) {
            debug!("Status already reports Created=True");
            return ReconcileOutcome::Done;
        }

        info!("Updating status: Created=True");
        match self.store.patch_status(original, &updated).await {
            Ok(()) => {
                info!("Reconcile completed successfully");
                ReconcileOutcome::Done
            }
            Err(e) => {
                // No external side effect is pending, only bookkeeping
                observability::metrics::increment_status_patch_failures();
                warn!(error = %e, "Failed to update status, will retry");
                ReconcileOutcome::RequeueNow
            }
        }
    }
}
