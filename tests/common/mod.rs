//! Common test utilities for reconciler integration tests
//!
//! Provides an in-memory `ResourceStore` that behaves like the API server
//! for the parts the reconciler relies on: resourceVersion compare-and-swap,
//! physical removal once deletion is requested and no finalizers remain, and
//! injectable patch failures.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use kafka_user_operator::crd::{KafkaUser, KafkaUserSpec, ObjectKey, Permission};
use kafka_user_operator::controller::reconciler::{
    ReconcileOutcome, Reconciler, ResourceStore, StoreError,
};
use kafka_user_operator::provider::InMemoryKafka;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static TRACING_INIT: Once = Once::new();

/// Route reconciler logs to the test writer; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "kafka_user_operator=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn key(name: &str) -> ObjectKey {
    ObjectKey::new("default", name)
}

pub fn kafka_user(name: &str, topic: &str, permissions: Permission) -> KafkaUser {
    let mut user = KafkaUser::new(
        name,
        KafkaUserSpec {
            topic: topic.to_string(),
            permissions,
        },
    );
    user.metadata.namespace = Some("default".to_string());
    user
}

pub fn deletion_time() -> Time {
    serde_json::from_value(serde_json::json!("2026-01-01T00:00:00Z")).unwrap()
}

/// Error the fake uses for injected non-conflict failures
fn injected_failure() -> serde_json::Error {
    serde_json::from_str::<serde_json::Value>("{").unwrap_err()
}

#[derive(Default)]
struct Objects {
    items: HashMap<ObjectKey, KafkaUser>,
    next_version: u64,
}

impl Objects {
    fn bump(&mut self, user: &mut KafkaUser) {
        self.next_version += 1;
        user.metadata.resource_version = Some(self.next_version.to_string());
    }
}

/// In-memory stand-in for the Kubernetes API server
#[derive(Default)]
pub struct InMemoryStore {
    objects: Mutex<Objects>,
    spec_patches: AtomicUsize,
    status_patches: AtomicUsize,
    failing_status_patches: AtomicUsize,
    failing_spec_patches: AtomicUsize,
    stale_reads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a new object, as `kubectl apply` would
    pub fn create(&self, mut user: KafkaUser) -> ObjectKey {
        let mut objects = self.objects.lock().unwrap();
        objects.bump(&mut user);
        let key = user.object_key();
        objects.items.insert(key.clone(), user);
        key
    }

    /// Request deletion; removes immediately when no finalizers hold the object
    pub fn request_deletion(&self, key: &ObjectKey) {
        let mut objects = self.objects.lock().unwrap();
        let Some(mut user) = objects.items.remove(key) else {
            return;
        };
        if user.finalizers().is_empty() {
            return;
        }
        if user.metadata.deletion_timestamp.is_none() {
            user.metadata.deletion_timestamp = Some(deletion_time());
        }
        objects.bump(&mut user);
        objects.items.insert(key.clone(), user);
    }

    /// Simulate another writer touching the object
    pub fn touch(&self, key: &ObjectKey) {
        let mut objects = self.objects.lock().unwrap();
        if let Some(mut user) = objects.items.remove(key) {
            objects.bump(&mut user);
            objects.items.insert(key.clone(), user);
        }
    }

    pub fn snapshot(&self, key: &ObjectKey) -> Option<KafkaUser> {
        self.objects.lock().unwrap().items.get(key).cloned()
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.snapshot(key).is_some()
    }

    pub fn spec_patches(&self) -> usize {
        self.spec_patches.load(Ordering::SeqCst)
    }

    pub fn status_patches(&self) -> usize {
        self.status_patches.load(Ordering::SeqCst)
    }

    /// The next `n` status patches fail without touching the object
    pub fn fail_status_patches(&self, n: usize) {
        self.failing_status_patches.store(n, Ordering::SeqCst);
    }

    /// The next `n` spec patches fail without touching the object
    pub fn fail_spec_patches(&self, n: usize) {
        self.failing_spec_patches.store(n, Ordering::SeqCst);
    }

    /// The next `n` reads are followed by a concurrent write, making them stale
    pub fn stale_reads(&self, n: usize) {
        self.stale_reads.store(n, Ordering::SeqCst);
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check_version(objects: &Objects, original: &KafkaUser) -> Result<ObjectKey, StoreError> {
        let key = original.object_key();
        let current = objects
            .items
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        if current.metadata.resource_version != original.metadata.resource_version {
            return Err(StoreError::Conflict(key));
        }
        Ok(key)
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<KafkaUser>, StoreError> {
        let snapshot = self.snapshot(key);
        if snapshot.is_some() && Self::take(&self.stale_reads) {
            self.touch(key);
        }
        Ok(snapshot)
    }

    async fn patch_spec(
        &self,
        original: &KafkaUser,
        updated: &KafkaUser,
    ) -> Result<(), StoreError> {
        self.spec_patches.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.lock().unwrap();
        let key = Self::check_version(&objects, original)?;
        if Self::take(&self.failing_spec_patches) {
            return Err(StoreError::Serialization {
                key,
                source: injected_failure(),
            });
        }

        let Some(mut current) = objects.items.remove(&key) else {
            return Err(StoreError::NotFound(key));
        };
        current.metadata.finalizers = Some(updated.finalizers().to_vec());
        current.spec = updated.spec.clone();

        if current.is_deleting() && current.finalizers().is_empty() {
            return Ok(());
        }
        objects.bump(&mut current);
        objects.items.insert(key, current);
        Ok(())
    }

    async fn patch_status(
        &self,
        original: &KafkaUser,
        updated: &KafkaUser,
    ) -> Result<(), StoreError> {
        self.status_patches.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.lock().unwrap();
        let key = Self::check_version(&objects, original)?;
        if Self::take(&self.failing_status_patches) {
            return Err(StoreError::Serialization {
                key,
                source: injected_failure(),
            });
        }

        let Some(mut current) = objects.items.remove(&key) else {
            return Err(StoreError::NotFound(key));
        };
        current.status = updated.status.clone();
        objects.bump(&mut current);
        objects.items.insert(key, current);
        Ok(())
    }
}

/// Reconciler wired to fresh in-memory collaborators
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub kafka: Arc<InMemoryKafka>,
    pub reconciler: Reconciler,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let store = Arc::new(InMemoryStore::new());
        let kafka = Arc::new(InMemoryKafka::new());
        let reconciler = Reconciler::new(store.clone(), kafka.clone());
        Self {
            store,
            kafka,
            reconciler,
        }
    }

    /// Reconcile until the outcome is no longer `RequeueNow`, bounded by `max_steps`
    pub async fn converge(&self, key: &ObjectKey, max_steps: usize) -> ReconcileOutcome {
        let mut outcome = self.reconciler.reconcile(key).await;
        for _ in 1..max_steps {
            if !outcome.is_requeue_now() {
                break;
            }
            outcome = self.reconciler.reconcile(key).await;
        }
        outcome
    }
}
