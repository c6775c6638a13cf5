//! Task → reminder message construction.

use duebell_core::config::{DispatchConfig, DEFAULT_BODY_TEMPLATE, DEFAULT_CHANNEL, DEFAULT_TITLE_TEMPLATE};
use duebell_core::{canonical, normalize, RawInstant, Task};
use serde_json::Value;

use crate::templating::{TaskContext, TemplateContext, TemplateRenderer};
use crate::traits::{NotifyError, ReminderData, ReminderMessage};

/// Builds [`ReminderMessage`]s from tasks.
///
/// Templates are validated once at construction so a typo in configuration
/// surfaces at startup rather than on the first due task.
#[derive(Debug)]
pub struct ReminderBuilder {
    title_template: String,
    body_template: String,
    channel: String,
    renderer: TemplateRenderer,
}

impl ReminderBuilder {
    pub fn new(
        title_template: impl Into<String>,
        body_template: impl Into<String>,
        channel: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let renderer = TemplateRenderer::new();
        let title_template = title_template.into();
        let body_template = body_template.into();

        renderer
            .validate(&title_template)
            .map_err(|e| NotifyError::Config(format!("invalid title template: {e}")))?;
        renderer
            .validate(&body_template)
            .map_err(|e| NotifyError::Config(format!("invalid body template: {e}")))?;

        Ok(Self {
            title_template,
            body_template,
            channel: channel.into(),
            renderer,
        })
    }

    pub fn from_config(config: &DispatchConfig) -> Result<Self, NotifyError> {
        Self::new(
            config.title_template.as_str(),
            config.body_template.as_str(),
            config.channel.as_str(),
        )
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Render the reminder for `task`.
    pub fn build(&self, task: &Task) -> Result<ReminderMessage, NotifyError> {
        let data = ReminderData {
            task_id: task.id.clone(),
            priority: task.priority_or_default().to_string(),
            due_date: task.due_at.as_ref().and_then(due_date_metadata),
        };

        let ctx = TemplateContext {
            task: TaskContext {
                id: data.task_id.clone(),
                title: task.title.clone(),
                priority: data.priority.clone(),
                due_date: data.due_date.as_ref().map(display_value),
            },
            channel: self.channel.clone(),
        };

        Ok(ReminderMessage {
            title: self.renderer.render(&self.title_template, &ctx)?,
            body: self.renderer.render(&self.body_template, &ctx)?,
            data,
            channel: self.channel.clone(),
        })
    }
}

impl Default for ReminderBuilder {
    fn default() -> Self {
        Self {
            title_template: DEFAULT_TITLE_TEMPLATE.to_string(),
            body_template: DEFAULT_BODY_TEMPLATE.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            renderer: TemplateRenderer::new(),
        }
    }
}

/// Due date as carried in message metadata.
///
/// Native timestamps are normalized to the canonical string. Everything
/// else, including a timestamp out of range, passes through as stored.
fn due_date_metadata(raw: &RawInstant) -> Option<Value> {
    match raw {
        RawInstant::Timestamp(ts) => match normalize(raw) {
            Ok(at) => Some(Value::String(canonical(at))),
            Err(_) => serde_json::to_value(ts).ok(),
        },
        RawInstant::Text(s) => Some(Value::String(s.clone())),
        RawInstant::Other(v) => Some(v.clone()),
    }
}

/// Template-facing text for a metadata value: strings without quotes.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duebell_core::Timestamp;
    use serde_json::json;

    fn task() -> Task {
        Task::new("t1", "Stretch", RawInstant::Text("2024-01-01T11:58:00Z".into()))
    }

    #[test]
    fn default_templates() {
        let msg = ReminderBuilder::default().build(&task()).unwrap();
        assert_eq!(msg.title, "⏰ Task Reminder");
        assert_eq!(msg.body, "Time to: Stretch");
        assert_eq!(msg.channel, "ToDos");
        assert_eq!(msg.data.task_id, "t1");
        assert_eq!(msg.data.priority, "medium");
        assert_eq!(msg.data.due_date, None);
    }

    #[test]
    fn timestamp_due_date_is_canonicalized() {
        let t = task().with_due_at(RawInstant::Timestamp(Timestamp {
            seconds: 1_704_153_600,
            nanoseconds: 0,
        }));
        let msg = ReminderBuilder::default().build(&t).unwrap();
        assert_eq!(msg.data.due_date, Some(json!("2024-01-02T00:00:00.000Z")));
    }

    #[test]
    fn string_due_date_passes_through_unchanged() {
        let t = task().with_due_at(RawInstant::Text("Tomorrow-ish".into()));
        let msg = ReminderBuilder::default().build(&t).unwrap();
        assert_eq!(msg.data.due_date, Some(json!("Tomorrow-ish")));
    }

    #[test]
    fn other_due_date_passes_through() {
        let t = task().with_due_at(RawInstant::Other(json!(1704153600000u64)));
        let msg = ReminderBuilder::default().build(&t).unwrap();
        assert_eq!(msg.data.due_date, Some(json!(1704153600000u64)));

        let wire = serde_json::to_value(&msg.data).unwrap();
        assert_eq!(wire["dueDate"], json!(1704153600000u64));
    }

    #[test]
    fn unnormalizable_timestamp_passes_through_raw() {
        let t = task().with_due_at(RawInstant::Timestamp(Timestamp {
            seconds: i64::MAX,
            nanoseconds: 0,
        }));
        let msg = ReminderBuilder::default().build(&t).unwrap();
        assert_eq!(
            msg.data.due_date,
            Some(json!({ "seconds": i64::MAX, "nanoseconds": 0 }))
        );
    }

    #[test]
    fn non_string_due_date_renders_in_templates() {
        let builder =
            ReminderBuilder::new("Reminder", "{{ task.title }} (due {{ task.due_date }})", "ToDos").unwrap();
        let t = task().with_due_at(RawInstant::Other(json!(42)));
        assert_eq!(builder.build(&t).unwrap().body, "Stretch (due 42)");
    }

    #[test]
    fn custom_templates_and_priority() {
        let builder =
            ReminderBuilder::new("[{{ task.priority | upper }}] Reminder", "Do {{ task.title }} now", "Chores")
                .unwrap();
        let msg = builder.build(&task().with_priority("high")).unwrap();
        assert_eq!(msg.title, "[HIGH] Reminder");
        assert_eq!(msg.body, "Do Stretch now");
        assert_eq!(msg.channel, "Chores");
        assert_eq!(msg.data.priority, "high");
    }

    #[test]
    fn invalid_template_rejected_at_construction() {
        match ReminderBuilder::new("ok", "{{ broken", "ToDos") {
            Err(NotifyError::Config(msg)) => assert!(msg.contains("invalid body template")),
            other => panic!("expected Config error, got: {other:?}"),
        }
    }
}
