//! # Resource Store
//!
//! System of record for `KafkaUser` objects.
//!
//! Every mutation carries the snapshot it was computed from. The Kubernetes
//! implementation sends that snapshot's `resourceVersion` inside the merge
//! patch, so the API server rejects stale writes with 409 instead of
//! overwriting newer state.

use crate::constants::FIELD_MANAGER;
use crate::crd::{KafkaUser, ObjectKey};
use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(ObjectKey),
    /// The snapshot used to compute the patch is stale
    #[error("conflict patching {0}: object was modified")]
    Conflict(ObjectKey),
    #[error("failed to encode patch for {key}: {source}")]
    Serialization {
        key: ObjectKey,
        #[source]
        source: serde_json::Error,
    },
    #[error("kubernetes API error for {key}: {source}")]
    Api {
        key: ObjectKey,
        #[source]
        source: kube::Error,
    },
}

impl StoreError {
    fn from_kube(key: ObjectKey, source: kube::Error) -> Self {
        match &source {
            kube::Error::Api(response) if response.code == 404 => StoreError::NotFound(key),
            kube::Error::Api(response) if response.code == 409 => StoreError::Conflict(key),
            _ => StoreError::Api { key, source },
        }
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fresh snapshot of the object, `None` if it no longer exists
    async fn get(&self, key: &ObjectKey) -> Result<Option<KafkaUser>, StoreError>;

    /// Persist metadata (finalizers) and spec changes of `updated` relative to `original`
    async fn patch_spec(&self, original: &KafkaUser, updated: &KafkaUser) -> Result<(), StoreError>;

    /// Persist the status of `updated` relative to `original`
    async fn patch_status(
        &self,
        original: &KafkaUser,
        updated: &KafkaUser,
    ) -> Result<(), StoreError>;
}

/// `ResourceStore` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeResourceStore {
    client: Client,
}

impl std::fmt::Debug for KubeResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeResourceStore").finish_non_exhaustive()
    }
}

impl KubeResourceStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<KafkaUser> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Merge patch for metadata and spec, guarded by the snapshot's resourceVersion
pub fn spec_patch(
    original: &KafkaUser,
    updated: &KafkaUser,
) -> Result<serde_json::Value, serde_json::Error> {
    let mut patch = json!({
        "metadata": {
            "resourceVersion": original.metadata.resource_version,
            "finalizers": updated.finalizers(),
        }
    });
    if original.spec != updated.spec {
        patch["spec"] = serde_json::to_value(&updated.spec)?;
    }
    Ok(patch)
}

/// Merge patch for the status subresource, guarded by the snapshot's resourceVersion
pub fn status_patch(
    original: &KafkaUser,
    updated: &KafkaUser,
) -> Result<serde_json::Value, serde_json::Error> {
    Ok(json!({
        "metadata": {
            "resourceVersion": original.metadata.resource_version,
        },
        "status": serde_json::to_value(&updated.status)?,
    }))
}

#[async_trait]
impl ResourceStore for KubeResourceStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<KafkaUser>, StoreError> {
        self.api(&key.namespace)
            .get_opt(&key.name)
            .await
            .map_err(|e| StoreError::from_kube(key.clone(), e))
    }

    async fn patch_spec(
        &self,
        original: &KafkaUser,
        updated: &KafkaUser,
    ) -> Result<(), StoreError> {
        let key = original.object_key();
        let patch = spec_patch(original, updated).map_err(|source| StoreError::Serialization {
            key: key.clone(),
            source,
        })?;
        debug!(resource = %key, patch = %patch, "store.patch_spec");

        self.api(&key.namespace)
            .patch(&key.name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await
            .map_err(|e| StoreError::from_kube(key.clone(), e))?;
        Ok(())
    }

    async fn patch_status(
        &self,
        original: &KafkaUser,
        updated: &KafkaUser,
    ) -> Result<(), StoreError> {
        let key = original.object_key();
        let patch = status_patch(original, updated).map_err(|source| StoreError::Serialization {
            key: key.clone(),
            source,
        })?;
        debug!(resource = %key, "store.patch_status");

        self.api(&key.namespace)
            .patch_status(&key.name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await
            .map_err(|e| StoreError::from_kube(key.clone(), e))?;
        Ok(())
    }
}
