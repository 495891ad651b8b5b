//! # In-Memory Kafka
//!
//! Process-local user registry implementing `ProvisioningClient`.
//!
//! All state lives behind one `RwLock`: the provisioned names and the optional
//! injected create failure. `exists` takes the shared side; `create` and
//! `delete` take the exclusive side.

use crate::observability;
use crate::provider::{ProvisionError, ProvisioningClient};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Registry {
    users: HashSet<String>,
    create_failure: Option<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryKafka {
    registry: RwLock<Registry>,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl InMemoryKafka {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create` fail with a backend error carrying `message`
    pub async fn fail_creates_with(&self, message: impl Into<String>) {
        self.registry.write().await.create_failure = Some(message.into());
    }

    pub async fn clear_create_failure(&self) {
        self.registry.write().await.create_failure = None;
    }

    /// Number of `create` calls received, successful or not
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub async fn user_count(&self) -> usize {
        self.registry.read().await.users.len()
    }
}

#[async_trait]
impl ProvisioningClient for InMemoryKafka {
    async fn create(&self, username: &str) -> Result<(), ProvisionError> {
        let mut registry = self.registry.write().await;
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &registry.create_failure {
            observability::metrics::increment_provisioning_operations("create", "error");
            return Err(ProvisionError::Backend {
                username: username.to_string(),
                message: message.clone(),
            });
        }

        if !registry.users.insert(username.to_string()) {
            observability::metrics::increment_provisioning_operations("create", "already_exists");
            return Err(ProvisionError::AlreadyExists {
                username: username.to_string(),
            });
        }

        debug!(username, "kafka.user.created");
        observability::metrics::increment_provisioning_operations("create", "success");
        Ok(())
    }

    async fn exists(&self, username: &str) -> bool {
        self.registry.read().await.users.contains(username)
    }

    async fn delete(&self, username: &str) {
        let mut registry = self.registry.write().await;
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let removed = registry.users.remove(username);
        debug!(username, removed, "kafka.user.deleted");
        observability::metrics::increment_provisioning_operations("delete", "success");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_then_exists() {
        let kafka = InMemoryKafka::new();
        assert!(!kafka.exists("dev-user").await);
        kafka.create("dev-user").await.unwrap();
        assert!(kafka.exists("dev-user").await);
        assert_eq!(kafka.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_already_exists() {
        let kafka = InMemoryKafka::new();
        kafka.create("dev-user").await.unwrap();
        let err = kafka.create("dev-user").await.unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(kafka.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_absent_user_is_noop() {
        let kafka = InMemoryKafka::new();
        kafka.delete("ghost").await;
        kafka.delete("ghost").await;
        assert_eq!(kafka.delete_calls(), 2);
        assert!(!kafka.exists("ghost").await);
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_registry_untouched() {
        let kafka = InMemoryKafka::new();
        kafka.fail_creates_with("broker unavailable").await;
        let err = kafka.create("dev-user").await.unwrap_err();
        assert_eq!(
            err,
            ProvisionError::Backend {
                username: "dev-user".to_string(),
                message: "broker unavailable".to_string(),
            }
        );
        assert!(!kafka.exists("dev-user").await);

        kafka.clear_create_failure().await;
        kafka.create("dev-user").await.unwrap();
        assert!(kafka.exists("dev-user").await);
    }

    #[tokio::test]
    async fn test_concurrent_creates_admit_exactly_one() {
        let kafka = Arc::new(InMemoryKafka::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let kafka = Arc::clone(&kafka);
                tokio::spawn(async move { kafka.create("dev-user").await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(kafka.create_calls(), 16);
    }
}
