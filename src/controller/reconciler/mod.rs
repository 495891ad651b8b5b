//! # Reconciler
//!
//! Core reconciliation logic for `KafkaUser` resources.
//!
//! The reconciler:
//! - Re-fetches the object on every invocation
//! - Guards provisioned users with a finalizer
//! - Creates users in Kafka and records the `Created` condition
//! - Deletes users from Kafka before releasing the finalizer
//!
//! ## Reconciliation Flow
//!
//! 1. Fetch a fresh snapshot (missing object is a no-op)
//! 2. Derive the phase
//! 3. Apply at most one persisted mutation per step
//! 4. Report a `ReconcileOutcome` to the dispatcher

pub mod conditions;
pub mod finalizers;
pub mod reconcile;
pub mod store;
pub mod types;

pub use reconcile::reconcile;
pub use store::{KubeResourceStore, ResourceStore, StoreError};
pub use types::{
    BackoffState, ControllerContext, Phase, ReconcileOutcome, Reconciler, ReconcilerError,
};
