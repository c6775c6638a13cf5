//! Matches due tasks and sends one reminder per task.
//!
//! A pass reads the pending set once, classifies every task against the due
//! window, then sends reminders for the due ones concurrently and waits for
//! all of them before reporting. Individual task failures don't block other
//! tasks.
//!
//! Delivery is at-least-once. The send and the delete that retires a task
//! are separate steps against separate systems: if the process dies between
//! them, or the delete fails, the next pass sends the reminder again. Two
//! overlapping passes can also both pick up the same task before either
//! delete lands. Nothing here locks the store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use duebell_core::config::DispatchConfig;
use duebell_core::{Clock, DueWindow, Task, WindowVerdict};
use duebell_store::{StoreError, TaskStore};

use crate::builder::ReminderBuilder;
use crate::traits::{NotifyError, Transport};

/// Errors that fail a whole pass.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to read pending tasks: {0}")]
    Store(#[from] StoreError),
}

/// Step at which a single task's delivery failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Rendering the message failed; nothing was sent.
    Build,
    /// The transport rejected or timed out; task stays for the next pass.
    Send,
    /// The reminder went out but the task could not be removed.
    Delete,
}

/// One task's failure within a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub task_id: String,
    pub stage: FailureStage,
    pub error: String,
}

impl TaskFailure {
    fn new(task: &Task, stage: FailureStage, error: impl ToString) -> Self {
        Self {
            task_id: task.id.clone(),
            stage,
            error: error.to_string(),
        }
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// Instant the pass evaluated against.
    pub now: DateTime<Utc>,
    /// Pending tasks read from the store.
    pub candidates: usize,
    /// Tasks inside the due window.
    pub due: usize,
    pub future: usize,
    /// Tasks past the window; left pending.
    pub missed: usize,
    /// Tasks whose reminder instant could not be normalized.
    pub unparseable: usize,
    /// Reminders the transport accepted.
    pub sent_count: usize,
    pub errors: Vec<TaskFailure>,
}

impl PassSummary {
    fn new(now: DateTime<Utc>, candidates: usize) -> Self {
        Self {
            now,
            candidates,
            due: 0,
            future: 0,
            missed: 0,
            unparseable: 0,
            sent_count: 0,
            errors: Vec::new(),
        }
    }
}

enum Delivery {
    Sent,
    SentNotDeleted(TaskFailure),
    Failed(TaskFailure),
}

/// Reminder matching-and-dispatch engine.
pub struct Dispatcher {
    store: Arc<dyn TaskStore>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    builder: ReminderBuilder,
    window: DueWindow,
    send_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher with the default 5-minute window and no send timeout.
    pub fn new(
        store: Arc<dyn TaskStore>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        builder: ReminderBuilder,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
            builder,
            window: DueWindow::default(),
            send_timeout: None,
        }
    }

    /// Create a dispatcher from the `dispatch` config section.
    pub fn from_config(
        store: Arc<dyn TaskStore>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        config: &DispatchConfig,
    ) -> Result<Self, NotifyError> {
        let builder = ReminderBuilder::from_config(config)?;
        Ok(Self::new(store, transport, clock, builder)
            .with_window(DueWindow::from_secs(config.due_window_secs))
            .with_send_timeout(config.send_timeout_secs.map(Duration::from_secs)))
    }

    pub fn with_window(mut self, window: DueWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn window(&self) -> DueWindow {
        self.window
    }

    pub fn transport_name(&self) -> &str {
        self.transport.transport_name()
    }

    pub fn store_name(&self) -> &str {
        self.store.store_name()
    }

    /// Run one pass at the injected clock's current instant.
    pub async fn run(&self) -> Result<PassSummary, DispatchError> {
        self.run_once(self.clock.now()).await
    }

    /// Run one pass as of `now`.
    ///
    /// Only a failed read of the pending set fails the pass. Per-task
    /// problems are recorded in [`PassSummary::errors`] (send and delete
    /// failures) or counted (unparseable instants) and the pass carries on.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<PassSummary, DispatchError> {
        let tasks = self.store.list_pending().await.map_err(|e| {
            error!(store = self.store.store_name(), error = %e, "failed to list pending tasks");
            e
        })?;

        debug!(now = %now, candidates = tasks.len(), "reminder pass started");
        let mut summary = PassSummary::new(now, tasks.len());
        let mut due = Vec::new();

        for task in tasks {
            let notify_at = match task.notify_instant() {
                Ok(at) => at,
                Err(e) => {
                    summary.unparseable += 1;
                    warn!(task_id = %task.id, title = %task.title, error = %e, "skipping task: unusable notification time");
                    continue;
                }
            };

            match self.window.classify(now, notify_at) {
                WindowVerdict::Future { remaining } => {
                    summary.future += 1;
                    debug!(
                        task_id = %task.id,
                        notify_at = %notify_at,
                        remaining_secs = remaining.num_seconds(),
                        "reminder scheduled for later"
                    );
                }
                WindowVerdict::Missed { overdue_by } => {
                    // Nothing ever retires these; they show up on every pass.
                    summary.missed += 1;
                    warn!(
                        task_id = %task.id,
                        title = %task.title,
                        notify_at = %notify_at,
                        overdue_secs = overdue_by.num_seconds(),
                        "reminder window missed, task left pending"
                    );
                }
                WindowVerdict::Due { late_by } => {
                    summary.due += 1;
                    debug!(task_id = %task.id, late_ms = late_by.num_milliseconds(), "reminder due");
                    due.push(task);
                }
            }
        }

        let outcomes = join_all(due.iter().map(|task| self.deliver(task))).await;

        for outcome in outcomes {
            match outcome {
                Delivery::Sent => summary.sent_count += 1,
                Delivery::SentNotDeleted(failure) => {
                    summary.sent_count += 1;
                    summary.errors.push(failure);
                }
                Delivery::Failed(failure) => summary.errors.push(failure),
            }
        }

        info!(
            candidates = summary.candidates,
            due = summary.due,
            sent = summary.sent_count,
            failed = summary.errors.len(),
            missed = summary.missed,
            unparseable = summary.unparseable,
            "reminder pass complete"
        );

        Ok(summary)
    }

    /// Build, send, then delete one due task.
    async fn deliver(&self, task: &Task) -> Delivery {
        let message = match self.builder.build(task) {
            Ok(m) => m,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "failed to render reminder");
                return Delivery::Failed(TaskFailure::new(task, FailureStage::Build, e));
            }
        };

        let start = Instant::now();
        let sent = match self.send_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(&message))
                .await
                .unwrap_or_else(|_| Err(NotifyError::Timeout(limit))),
            None => self.transport.send(&message).await,
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match sent {
            Ok(message_id) => info!(
                task_id = %task.id,
                transport = self.transport.transport_name(),
                message_id = %message_id,
                duration_ms,
                "reminder sent"
            ),
            Err(e) => {
                warn!(
                    task_id = %task.id,
                    transport = self.transport.transport_name(),
                    error = %e,
                    duration_ms,
                    "reminder delivery failed, will retry next pass"
                );
                return Delivery::Failed(TaskFailure::new(task, FailureStage::Send, e));
            }
        }

        // Not atomic with the send: a failure here means a repeat reminder next pass.
        if let Err(e) = self.store.delete(&task.id).await {
            error!(task_id = %task.id, error = %e, "reminder sent but task not deleted");
            return Delivery::SentNotDeleted(TaskFailure::new(task, FailureStage::Delete, e));
        }

        Delivery::Sent
    }
}
