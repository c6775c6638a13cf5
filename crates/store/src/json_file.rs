//! Single-file JSON task store.
//!
//! Layout: one JSON object keyed by task id, each value a task document
//! (`title`, `notificationTime`, `dueDate`, `priority`, `isCompleted`).
//! Unknown document fields are preserved across rewrites.
//!
//! ```text
//! {
//!   "task-1": { "title": "Stretch", "notificationTime": "2024-01-01T11:58:00Z", "isCompleted": false },
//!   "task-2": { "title": "Call", "notificationTime": { "seconds": 1704110400, "nanoseconds": 0 } }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use duebell_core::Task;

use crate::error::StoreError;
use crate::traits::TaskStore;

/// Task store backed by one JSON file.
///
/// Rewrites go through a temp file and a rename, so readers never observe a
/// half-written file. Writers within this process are serialized; there is
/// no cross-process locking.
#[derive(Debug)]
pub struct JsonFileTaskStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace a task document under `task.id`.
    pub async fn insert(&self, task: &Task) -> Result<(), StoreError> {
        if task.id.is_empty() {
            return Err(StoreError::Unavailable("task id must not be empty".to_string()));
        }
        let _guard = self.write_lock.lock().await;
        let mut docs = self.read_documents().await?;
        docs.insert(task.id.clone(), serde_json::to_value(task)?);
        self.write_documents(&docs).await
    }

    /// Read the raw document map. A missing file is an empty store.
    async fn read_documents(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "tasks file missing, treating as empty");
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    async fn write_documents(&self, docs: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_string_pretty(docs)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskStore for JsonFileTaskStore {
    async fn list_pending(&self) -> Result<Vec<Task>, StoreError> {
        let docs = self.read_documents().await?;
        let mut tasks = Vec::with_capacity(docs.len());

        for (id, doc) in docs {
            let mut task: Task = match serde_json::from_value(doc) {
                Ok(t) => t,
                Err(e) => {
                    warn!(task_id = %id, error = %e, "skipping malformed task document");
                    continue;
                }
            };
            if task.is_completed {
                continue;
            }
            task.id = id;
            tasks.push(task);
        }

        Ok(tasks)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut docs = self.read_documents().await?;
        if docs.remove(id).is_none() {
            debug!(task_id = %id, "delete of absent task ignored");
            return Ok(());
        }
        self.write_documents(&docs).await
    }

    fn store_name(&self) -> &str {
        "json-file"
    }
}
