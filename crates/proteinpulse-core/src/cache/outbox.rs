//! Remote writes that could not be delivered and are waiting for a replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DailyGoal, IntakeEntry, SavedShortcut, UserProfile};

/// A mutation to apply against the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RemoteOp {
    UpsertProfile { profile: UserProfile },
    InsertShortcut { shortcut: SavedShortcut },
    DeleteShortcut { id: String },
    InsertEntry { entry: IntakeEntry },
    DeleteEntry { id: String },
    UpsertGoal { goal: DailyGoal },
}

impl RemoteOp {
    pub fn label(&self) -> &'static str {
        match self {
            RemoteOp::UpsertProfile { .. } => "upsert_profile",
            RemoteOp::InsertShortcut { .. } => "insert_shortcut",
            RemoteOp::DeleteShortcut { .. } => "delete_shortcut",
            RemoteOp::InsertEntry { .. } => "insert_entry",
            RemoteOp::DeleteEntry { .. } => "delete_entry",
            RemoteOp::UpsertGoal { .. } => "upsert_goal",
        }
    }

    /// Whether applying `self` makes an earlier queued `other` pointless.
    /// Only whole-value upserts overwrite each other.
    pub fn supersedes(&self, other: &RemoteOp) -> bool {
        match (self, other) {
            (RemoteOp::UpsertProfile { .. }, RemoteOp::UpsertProfile { .. }) => true,
            (RemoteOp::UpsertGoal { goal: new }, RemoteOp::UpsertGoal { goal: old }) => {
                new.date == old.date
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub id: String,
    pub op: RemoteOp,
    pub queued_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
}

impl PendingWrite {
    pub fn new(op: RemoteOp) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            op,
            queued_at: Utc::now(),
            attempts: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn goal(day: u32, target: f64) -> RemoteOp {
        RemoteOp::UpsertGoal {
            goal: DailyGoal::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), target).unwrap(),
        }
    }

    #[test]
    fn test_profile_upserts_supersede_each_other() {
        let a = RemoteOp::UpsertProfile { profile: UserProfile::default() };
        let b = RemoteOp::UpsertProfile { profile: UserProfile::default() };
        assert!(b.supersedes(&a));
    }

    #[test]
    fn test_goal_upserts_supersede_only_same_date() {
        assert!(goal(1, 120.0).supersedes(&goal(1, 100.0)));
        assert!(!goal(2, 120.0).supersedes(&goal(1, 100.0)));
    }

    #[test]
    fn test_inserts_never_supersede() {
        let id = RemoteOp::DeleteShortcut { id: "a".to_string() };
        assert!(!id.supersedes(&id.clone()));
    }

    #[test]
    fn test_op_serializes_with_tag() {
        let json = serde_json::to_value(RemoteOp::DeleteEntry { id: "x".to_string() }).unwrap();
        assert_eq!(json["op"], "delete_entry");
        assert_eq!(json["id"], "x");
    }
}
