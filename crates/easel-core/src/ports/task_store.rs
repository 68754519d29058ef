//! TaskStore port: the source of truth for task documents.
//!
//! The conditional status update is the only synchronization primitive the
//! engine relies on. Implementations must make it atomic and linearizable per
//! `task_id`; every status change in the engine goes through it.

use async_trait::async_trait;

use crate::domain::{StoreError, Task, TaskId, TaskStatus};

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new document. `DuplicateKey` if the id is taken.
    async fn create(&self, task: Task) -> Result<(), StoreError>;

    /// Point lookup. `NotFound` if the id is unknown.
    async fn get(&self, task_id: TaskId) -> Result<Task, StoreError>;

    /// Set `status` and `info` only if the stored status equals `expected`.
    ///
    /// Returns whether the update applied. An unknown id returns `Ok(false)`.
    async fn compare_and_update_status(
        &self,
        task_id: TaskId,
        expected: TaskStatus,
        new: TaskStatus,
        info: &str,
    ) -> Result<bool, StoreError>;

    /// All tasks, newest `created_at` first.
    async fn list(&self) -> Result<Vec<Task>, StoreError>;

    /// Connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// End the handle's lifecycle. Later calls fail with `Unavailable`.
    async fn close(&self) -> Result<(), StoreError>;
}
