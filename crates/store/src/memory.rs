//! In-memory task store.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use duebell_core::Task;

use crate::error::StoreError;
use crate::traits::TaskStore;

/// Task store held entirely in memory, keyed by task id.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<BTreeMap<String, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `tasks`.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let tasks = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            tasks: RwLock::new(tasks),
        }
    }

    /// Insert or replace a task.
    pub async fn insert(&self, task: Task) {
        self.tasks.write().await.insert(task.id.clone(), task);
    }

    pub async fn get(&self, id: &str) -> Option<Task> {
        self.tasks.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.tasks.read().await.contains_key(id)
    }

    /// Ids of every stored task, completed or not.
    pub async fn ids(&self) -> Vec<String> {
        self.tasks.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list_pending(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| !t.is_completed)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if self.tasks.write().await.remove(id).is_none() {
            tracing::debug!(task_id = %id, "delete of absent task ignored");
        }
        Ok(())
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duebell_core::RawInstant;

    fn task(id: &str) -> Task {
        Task::new(id, format!("task {id}"), RawInstant::Text("2024-01-01T12:00:00Z".into()))
    }

    #[tokio::test]
    async fn list_pending_skips_completed() {
        let mut done = task("b");
        done.is_completed = true;
        let store = MemoryTaskStore::with_tasks([task("a"), done, task("c")]);

        let ids: Vec<String> = store
            .list_pending()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryTaskStore::with_tasks([task("a")]);
        store.delete("a").await.unwrap();
        assert!(!store.contains("a").await);
        store.delete("a").await.unwrap();
        store.delete("never-existed").await.unwrap();
        assert!(store.is_empty().await);
    }
}
