//! Reminder task model as persisted by the task store.
//!
//! Field names on the wire follow the mobile client's documents
//! (`notificationTime`, `dueDate`, `isCompleted`); the shorter `notifyAt` /
//! `dueAt` spellings are accepted as aliases.

use serde::{Deserialize, Serialize};

use crate::instant::InstantError;

/// Priority label used when a task carries none.
pub const DEFAULT_PRIORITY: &str = "medium";

/// A native timestamp as written by document stores (seconds + nanos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    #[serde(alias = "_seconds")]
    pub seconds: i64,
    #[serde(alias = "_nanoseconds", default)]
    pub nanoseconds: u32,
}

/// A raw instant exactly as it was found in the stored document.
///
/// Older clients wrote ISO-8601 strings, newer ones write native timestamps.
/// Anything else is kept verbatim in [`RawInstant::Other`] so that one odd
/// document never fails deserialization of the whole pending set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawInstant {
    Timestamp(Timestamp),
    Text(String),
    Other(serde_json::Value),
}

impl RawInstant {
    /// Short label for log output.
    pub fn kind(&self) -> &'static str {
        match self {
            RawInstant::Timestamp(_) => "timestamp",
            RawInstant::Text(_) => "string",
            RawInstant::Other(_) => "other",
        }
    }
}

/// A user-created task awaiting its reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store key. Not part of the stored document body.
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(
        rename = "notificationTime",
        alias = "notifyAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub notify_at: Option<RawInstant>,
    #[serde(
        rename = "dueDate",
        alias = "dueAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub due_at: Option<RawInstant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

impl Task {
    /// Create a pending task with only the required fields set.
    pub fn new(id: impl Into<String>, title: impl Into<String>, notify_at: RawInstant) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            notify_at: Some(notify_at),
            due_at: None,
            priority: None,
            is_completed: false,
        }
    }

    pub fn with_due_at(mut self, due_at: RawInstant) -> Self {
        self.due_at = Some(due_at);
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Normalized reminder instant, or why it cannot be used.
    pub fn notify_instant(&self) -> Result<chrono::DateTime<chrono::Utc>, InstantError> {
        self.notify_at
            .as_ref()
            .ok_or(InstantError::Missing)
            .and_then(crate::instant::normalize)
    }

    /// Priority label, falling back to [`DEFAULT_PRIORITY`] when absent or empty.
    pub fn priority_or_default(&self) -> &str {
        match self.priority.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => DEFAULT_PRIORITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_timestamp_document() {
        let json = r#"{
            "title": "Water plants",
            "notificationTime": { "_seconds": 1704110280, "_nanoseconds": 0 },
            "priority": "high",
            "isCompleted": false
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.title, "Water plants");
        assert_eq!(
            task.notify_at,
            Some(RawInstant::Timestamp(Timestamp {
                seconds: 1_704_110_280,
                nanoseconds: 0
            }))
        );
        assert_eq!(task.priority_or_default(), "high");
        assert!(task.id.is_empty());
    }

    #[test]
    fn deserialize_string_document_with_aliases() {
        let json = r#"{
            "title": "Call mom",
            "notifyAt": "2024-01-01T11:58:00Z",
            "dueAt": "2024-01-02"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(
            task.notify_at,
            Some(RawInstant::Text("2024-01-01T11:58:00Z".to_string()))
        );
        assert_eq!(task.due_at, Some(RawInstant::Text("2024-01-02".to_string())));
        assert!(!task.is_completed);
    }

    #[test]
    fn odd_notification_time_does_not_fail_document() {
        let json = r#"{ "title": "x", "notificationTime": 42 }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.notify_at.as_ref().map(RawInstant::kind), Some("other"));
    }

    #[test]
    fn priority_defaults_to_medium() {
        let task = Task::new("t1", "x", RawInstant::Text("2024-01-01T00:00:00Z".into()));
        assert_eq!(task.priority_or_default(), DEFAULT_PRIORITY);

        let empty = task.clone().with_priority("");
        assert_eq!(empty.priority_or_default(), DEFAULT_PRIORITY);
    }

    #[test]
    fn missing_notification_time_is_reported() {
        let json = r#"{ "title": "no reminder" }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.notify_instant(), Err(InstantError::Missing));
    }

    #[test]
    fn id_is_not_serialized() {
        let task = Task::new("t1", "x", RawInstant::Text("2024-01-01T00:00:00Z".into()));
        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["notificationTime"], "2024-01-01T00:00:00Z");
        assert_eq!(value["isCompleted"], false);
    }
}
