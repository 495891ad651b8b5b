//! # Provisioning Providers
//!
//! The operator drives Kafka users through the `ProvisioningClient` capability.
//! It only observes and commands user state; it never enumerates or owns it.
//!
//! Implementations:
//! - `InMemoryKafka` - process-local user registry guarded by a single lock

use async_trait::async_trait;
use thiserror::Error;

mod memory;

pub use memory::InMemoryKafka;

/// Errors surfaced by `ProvisioningClient::create`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    /// The name is already provisioned; callers treat this as success
    #[error("user {username} already exists")]
    AlreadyExists { username: String },
    /// The backend rejected the request
    #[error("backend rejected user {username}: {message}")]
    Backend { username: String, message: String },
}

impl ProvisionError {
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ProvisionError::AlreadyExists { .. })
    }
}

/// Capability interface for the external user provisioning backend
///
/// Implementations serialize their own mutating calls; callers see no locking.
#[async_trait]
pub trait ProvisioningClient: Send + Sync {
    /// Create a user. Rejected with `AlreadyExists` if the name is taken.
    async fn create(&self, username: &str) -> Result<(), ProvisionError>;

    /// Pure read, no side effects
    async fn exists(&self, username: &str) -> bool;

    /// Delete a user. Idempotent; backend failures are absorbed and logged.
    async fn delete(&self, username: &str);
}
