//! TaskStore trait definition.

use duebell_core::Task;

use crate::error::StoreError;

/// Persistent collection of reminder tasks.
///
/// Reminder dispatch only ever reads the pending set and deletes handled
/// tasks; creation and edits happen elsewhere.
#[async_trait::async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks with `is_completed == false`, each with `id` populated.
    async fn list_pending(&self) -> Result<Vec<Task>, StoreError>;

    /// Delete a task by id. Deleting an absent id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Human-readable backend name for logs.
    fn store_name(&self) -> &str;
}
