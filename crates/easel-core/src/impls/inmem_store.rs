//! InMemoryTaskStore: development and test implementation of [`TaskStore`].
//!
//! Documents live in a `HashMap` behind one `tokio::sync::Mutex`; the
//! compare-and-update runs entirely under that lock, which makes it atomic per
//! `task_id`.
//!
//! # 実装詳細
//! - `close()` 後は全操作が `Unavailable` を返す（接続断の再現）
//! - `list()` は `created_at` の降順

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{StoreError, Task, TaskId, TaskStatus};
use crate::ports::TaskStore;

pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
    closed: AtomicBool,
}

impl InMemoryTaskStore {
    /// Open an empty store.
    pub fn open() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("store closed".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::open()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: Task) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut tasks = self.tasks.lock().await;
        match tasks.entry(task.task_id()) {
            Entry::Occupied(e) => Err(StoreError::DuplicateKey(*e.key())),
            Entry::Vacant(e) => {
                e.insert(task);
                Ok(())
            }
        }
    }

    async fn get(&self, task_id: TaskId) -> Result<Task, StoreError> {
        self.ensure_open()?;
        let tasks = self.tasks.lock().await;
        tasks
            .get(&task_id)
            .cloned()
            .ok_or(StoreError::NotFound(task_id))
    }

    async fn compare_and_update_status(
        &self,
        task_id: TaskId,
        expected: TaskStatus,
        new: TaskStatus,
        info: &str,
    ) -> Result<bool, StoreError> {
        self.ensure_open()?;
        let mut tasks = self.tasks.lock().await;
        match tasks.get_mut(&task_id) {
            Some(task) if task.status() == expected => {
                task.apply_status(new, info);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.ensure_open()?;
        let tasks = self.tasks.lock().await;
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        // Newest first; the id breaks ties between equal timestamps.
        all.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.task_id().cmp(&a.task_id()))
        });
        Ok(all)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
