//! Transport that only writes reminders to the log.
//!
//! Used for local runs and dry runs where no push gateway is configured.

use crate::traits::{NotifyError, ReminderMessage, Transport};

/// Logs each reminder at info level and reports it as delivered.
#[derive(Debug, Default)]
pub struct LogTransport;

impl LogTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Transport for LogTransport {
    async fn send(&self, message: &ReminderMessage) -> Result<String, NotifyError> {
        let message_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(
            message_id = %message_id,
            channel = %message.channel,
            task_id = %message.data.task_id,
            priority = %message.data.priority,
            due_date = %message
                .data
                .due_date
                .as_ref()
                .map_or_else(|| "-".to_string(), |v| v.to_string()),
            title = %message.title,
            body = %message.body,
            "reminder (log transport)"
        );
        Ok(message_id)
    }

    fn transport_name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ReminderData;

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        let msg = ReminderMessage {
            title: "t".to_string(),
            body: "b".to_string(),
            data: ReminderData {
                task_id: "x".to_string(),
                priority: "medium".to_string(),
                due_date: None,
            },
            channel: "ToDos".to_string(),
        };
        let a = LogTransport::new().send(&msg).await.unwrap();
        let b = LogTransport::new().send(&msg).await.unwrap();
        assert_ne!(a, b);
    }
}
