//! # KafkaUser Status
//!
//! Status types for reporting the last externally observed provisioning state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of the KafkaUser resource
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KafkaUserStatus {
    /// Conditions represent the latest available observations, at most one per type
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Condition represents a typed, timestamped observation of the resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,
    /// Machine-readable reason for the last transition
    #[serde(default)]
    pub reason: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Last time the status changed (RFC3339)
    pub last_transition_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_serializes_camel_case() {
        let condition = Condition {
            r#type: "Created".to_string(),
            status: ConditionStatus::True,
            reason: "Success".to_string(),
            message: "User created in Kafka".to_string(),
            last_transition_time: "2024-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&condition).unwrap();
        assert_eq!(value["type"], "Created");
        assert_eq!(value["status"], "True");
        assert_eq!(value["lastTransitionTime"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_empty_status_deserializes() {
        let status: KafkaUserStatus = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(status.conditions.is_empty());
    }
}
