//! # Custom Resource Definitions
//!
//! CRD types for the Kafka user operator.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `KafkaUser` resource and accessors
//! - `status.rs` - Status and condition types
//! - `key.rs` - Namespaced object identity

mod key;
mod spec;
mod status;

pub use key::ObjectKey;
pub use spec::{KafkaUser, KafkaUserSpec, Permission};
pub use status::{Condition, ConditionStatus, KafkaUserStatus};
