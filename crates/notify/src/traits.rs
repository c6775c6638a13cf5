//! Transport trait definition and shared message/error types.

use std::time::Duration;

use serde::Serialize;

/// Errors that can occur while building or delivering a reminder.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Send timed out after {0:?}")]
    Timeout(Duration),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Metadata carried alongside the visible reminder text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderData {
    pub task_id: String,
    pub priority: String,
    /// Canonical string for native timestamps, otherwise the stored value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<serde_json::Value>,
}

/// A rendered reminder addressed to a broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderMessage {
    pub title: String,
    pub body: String,
    pub data: ReminderData,
    /// Broadcast topic, e.g. `"ToDos"`.
    pub channel: String,
}

/// Push delivery backend.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Submit one reminder. On success returns the transport's message id.
    async fn send(&self, message: &ReminderMessage) -> Result<String, NotifyError>;

    /// Human-readable name for this transport (e.g., "webhook", "log").
    fn transport_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_wire_shape() {
        let msg = ReminderMessage {
            title: "⏰ Task Reminder".to_string(),
            body: "Time to: Stretch".to_string(),
            data: ReminderData {
                task_id: "t1".to_string(),
                priority: "medium".to_string(),
                due_date: None,
            },
            channel: "ToDos".to_string(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "title": "⏰ Task Reminder",
                "body": "Time to: Stretch",
                "data": { "taskId": "t1", "priority": "medium" },
                "channel": "ToDos"
            })
        );
    }
}
