//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use kafka_user_operator::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Provisioning backend
pub use crate::provider::{InMemoryKafka, ProvisionError, ProvisioningClient};

// Reconciler types
pub use crate::controller::reconciler::{
    reconcile, ControllerContext, KubeResourceStore, Phase, ReconcileOutcome, Reconciler,
    ReconcilerError, ResourceStore, StoreError,
};

// Config types
pub use crate::config::{ControllerConfig, ServerConfig};
