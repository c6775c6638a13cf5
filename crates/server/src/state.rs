//! Shared application state for the HTTP surface and the periodic trigger.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use duebell_notify::{DispatchError, Dispatcher, PassSummary};

/// Which surface started a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Timer,
    Manual,
}

/// Compact record of the most recent pass, exposed on `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct LastPass {
    pub source: TriggerSource,
    pub at: DateTime<Utc>,
    pub ok: bool,
    pub sent_count: usize,
    pub failed: usize,
    pub missed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub last_pass: RwLock<Option<LastPass>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            last_pass: RwLock::new(None),
            started_at: Utc::now(),
        }
    }

    /// Run one pass and remember its outcome.
    pub async fn run_pass(&self, source: TriggerSource) -> Result<PassSummary, DispatchError> {
        let result = self.dispatcher.run().await;
        let record = match &result {
            Ok(summary) => LastPass {
                source,
                at: summary.now,
                ok: true,
                sent_count: summary.sent_count,
                failed: summary.errors.len(),
                missed: summary.missed,
                error: None,
            },
            Err(e) => LastPass {
                source,
                at: Utc::now(),
                ok: false,
                sent_count: 0,
                failed: 0,
                missed: 0,
                error: Some(e.to_string()),
            },
        };
        *self.last_pass.write().await = Some(record);
        result
    }
}
