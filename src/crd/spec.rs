//! # KafkaUser Spec
//!
//! The `KafkaUser` resource and its desired-state fields.

use crate::constants::CONDITION_CREATED;
use crate::crd::{Condition, ObjectKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// KafkaUser Custom Resource Definition
///
/// Declares a Kafka user that the operator provisions and keeps in place
/// until the resource is deleted.
///
/// # Example
///
/// ```yaml
/// apiVersion: kafka.appfarm.rs/v1
/// kind: KafkaUser
/// metadata:
///   name: dev-user
///   namespace: default
/// spec:
///   topic: payments
///   permissions: read
/// ```
#[derive(
    kube::CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema,
)]
#[kube(
    kind = "KafkaUser",
    group = "kafka.appfarm.rs",
    version = "v1",
    namespaced,
    status = "crate::crd::KafkaUserStatus",
    shortname = "ku",
    printcolumn = r#"{"name":"Topic", "type":"string", "jsonPath":".spec.topic"}, {"name":"Permissions", "type":"string", "jsonPath":".spec.permissions"}, {"name":"Created", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Created\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct KafkaUserSpec {
    /// Topic the user is granted access to
    pub topic: String,
    /// Access level on the topic
    pub permissions: Permission,
}

/// Access level granted to a Kafka user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Admin,
}

impl Permission {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Admin => "admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl KafkaUser {
    /// Identity of this object; missing namespace falls back to `default`
    #[must_use]
    pub fn object_key(&self) -> ObjectKey {
        ObjectKey::new(
            self.metadata.namespace.as_deref().unwrap_or("default"),
            self.metadata.name.as_deref().unwrap_or_default(),
        )
    }

    /// True once deletion was requested but finalizers still hold the object
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    #[must_use]
    pub fn finalizers(&self) -> &[String] {
        self.metadata.finalizers.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        crate::controller::reconciler::conditions::find(self.conditions(), condition_type)
    }

    /// The `Created` condition, if one was recorded
    #[must_use]
    pub fn created_condition(&self) -> Option<&Condition> {
        self.condition(CONDITION_CREATED)
    }
}
