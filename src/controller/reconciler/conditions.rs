//! # Condition Ledger
//!
//! Upsert-by-type bookkeeping for `status.conditions`.
//!
//! At most one condition exists per type. Replacing keeps the list position,
//! and duplicates left by other writers collapse into the first entry.
//! `lastTransitionTime` moves only when the status value changes; a new
//! reason or message alone keeps the previous timestamp.

use crate::crd::{Condition, ConditionStatus};
use chrono::{DateTime, SecondsFormat, Utc};

#[must_use]
pub fn find<'a>(conditions: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Upsert using the current time. Returns true if the list changed.
pub fn upsert(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: ConditionStatus,
    reason: &str,
    message: &str,
) -> bool {
    upsert_at(conditions, condition_type, status, reason, message, Utc::now())
}

/// Upsert stamping `now` as the transition time when one is needed
pub fn upsert_at(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: ConditionStatus,
    reason: &str,
    message: &str,
    now: DateTime<Utc>,
) -> bool {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);

    let Some(index) = conditions.iter().position(|c| c.r#type == condition_type) else {
        conditions.push(Condition {
            r#type: condition_type.to_string(),
            status,
            reason: reason.to_string(),
            message: message.to_string(),
            last_transition_time: timestamp,
        });
        return true;
    };

    // Later entries of the same type are dropped; the first one is kept in place
    let before = conditions.len();
    let mut seen = false;
    conditions.retain(|c| {
        if c.r#type != condition_type {
            return true;
        }
        let keep = !seen;
        seen = true;
        keep
    });
    let mut changed = conditions.len() != before;

    let existing = &mut conditions[index];
    if existing.status != status {
        existing.last_transition_time = timestamp;
        existing.status = status;
        changed = true;
    }
    if existing.reason != reason {
        existing.reason = reason.to_string();
        changed = true;
    }
    if existing.message != message {
        existing.message = message.to_string();
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn mark_created(conditions: &mut Vec<Condition>, now: DateTime<Utc>) -> bool {
        upsert_at(conditions, "Created", ConditionStatus::True, "Success", "ok", now)
    }

    #[test]
    fn test_insert_appends_with_timestamp() {
        let mut conditions = Vec::new();
        assert!(mark_created(&mut conditions, t(0)));
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].last_transition_time, "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut conditions = Vec::new();
        upsert_at(&mut conditions, "Created", ConditionStatus::False, "CreateFailed", "boom", t(0));
        upsert_at(&mut conditions, "Ready", ConditionStatus::True, "Ok", "", t(0));
        upsert_at(&mut conditions, "Created", ConditionStatus::True, "Success", "ok", t(10));

        let types: Vec<_> = conditions.iter().map(|c| c.r#type.as_str()).collect();
        assert_eq!(types, ["Created", "Ready"]);
        assert_eq!(conditions[0].status, ConditionStatus::True);
        assert_eq!(conditions[0].reason, "Success");
    }

    #[test]
    fn test_status_change_refreshes_transition_time() {
        let mut conditions = Vec::new();
        upsert_at(&mut conditions, "Created", ConditionStatus::False, "CreateFailed", "boom", t(0));
        upsert_at(&mut conditions, "Created", ConditionStatus::True, "Success", "ok", t(60));
        assert_eq!(conditions[0].last_transition_time, "2023-11-14T22:14:20Z");
    }

    #[test]
    fn test_message_change_preserves_transition_time() {
        let mut conditions = Vec::new();
        upsert_at(&mut conditions, "Created", ConditionStatus::False, "CreateFailed", "boom", t(0));
        let changed = upsert_at(
            &mut conditions,
            "Created",
            ConditionStatus::False,
            "CreateFailed",
            "still boom",
            t(60),
        );
        assert!(changed);
        assert_eq!(conditions[0].message, "still boom");
        assert_eq!(conditions[0].last_transition_time, "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_identical_upsert_reports_no_change() {
        let mut conditions = Vec::new();
        upsert_at(&mut conditions, "Created", ConditionStatus::True, "Success", "ok", t(0));
        let before = conditions.clone();
        assert!(!mark_created(&mut conditions, t(90)));
        assert_eq!(conditions, before);
    }

    #[test]
    fn test_repeated_upserts_keep_one_entry_per_type() {
        let mut conditions = Vec::new();
        for i in 0..5 {
            let status = if i % 2 == 0 {
                ConditionStatus::True
            } else {
                ConditionStatus::False
            };
            upsert_at(&mut conditions, "Created", status, "r", "m", t(i));
        }
        assert_eq!(conditions.len(), 1);
        assert!(find(&conditions, "Created").is_some());
        assert!(find(&conditions, "Ready").is_none());
    }

    #[test]
    fn test_upsert_collapses_duplicate_entries() {
        let failed = |message: &str| Condition {
            r#type: "Created".to_string(),
            status: ConditionStatus::False,
            reason: "CreateFailed".to_string(),
            message: message.to_string(),
            last_transition_time: "2023-11-14T22:13:20Z".to_string(),
        };
        let mut conditions = vec![failed("first"), failed("second")];

        assert!(mark_created(&mut conditions, t(30)));
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, ConditionStatus::True);
        assert_eq!(conditions[0].last_transition_time, "2023-11-14T22:13:50Z");
    }

    #[test]
    fn test_duplicates_alone_count_as_a_change() {
        let created = Condition {
            r#type: "Created".to_string(),
            status: ConditionStatus::True,
            reason: "Success".to_string(),
            message: "ok".to_string(),
            last_transition_time: "2023-11-14T22:13:20Z".to_string(),
        };
        let ready = Condition {
            r#type: "Ready".to_string(),
            ..created.clone()
        };
        let mut conditions = vec![created.clone(), ready.clone(), created.clone()];

        assert!(mark_created(&mut conditions, t(30)));
        assert_eq!(conditions, vec![created, ready]);
        assert!(!mark_created(&mut conditions, t(60)));
    }
}
