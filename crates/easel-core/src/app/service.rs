//! TaskService: the intake boundary.
//!
//! Creates, reads, lists and cancels tasks. An HTTP layer (or the CLI) maps
//! these calls onto its own request and response shapes.

use std::sync::Arc;

use crate::domain::{
    EngineError, GenerateRequest, StoreError, Task, TaskEvent, TaskId, TaskStatus, transition,
};
use crate::ports::{Clock, IdGenerator, TaskStore};

use super::dispatcher::Dispatcher;

/// `info` written by a successful cancel.
pub const CANCELLED: &str = "cancelled by request";

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    dispatcher: Dispatcher,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(
        store: Arc<dyn TaskStore>,
        dispatcher: Dispatcher,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            ids,
            clock,
        }
    }

    /// Validate, persist as `waiting`, and dispatch.
    ///
    /// Once the document exists, a transport failure does not surface as an
    /// error: the task is finalized as `error` with the reason in `info` and
    /// returned.
    pub async fn create_task(&self, username: &str, prompt: &str) -> Result<Task, EngineError> {
        let request = GenerateRequest::new(username, prompt);
        request.validate()?;

        let task = Task::new(self.ids.generate_task_id(), request, self.clock.now());
        let task_id = task.task_id();
        self.store.create(task.clone()).await?;
        tracing::info!(%task_id, username, "task created");

        if let Err(err) = self.dispatcher.submit(task_id).await {
            tracing::error!(%task_id, error = %err, "dispatch failed");
            let info = format!("dispatch failed: {err}");
            let to = transition(TaskStatus::Waiting, TaskEvent::Fail)?;
            self.store
                .compare_and_update_status(task_id, TaskStatus::Waiting, to, &info)
                .await?;
            return Ok(self.store.get(task_id).await?);
        }

        Ok(task)
    }

    pub async fn get_task(&self, task_id: TaskId) -> Result<Task, EngineError> {
        Ok(self.store.get(task_id).await?)
    }

    /// All tasks, newest first.
    pub async fn list_tasks(&self) -> Result<Vec<Task>, EngineError> {
        Ok(self.store.list().await?)
    }

    /// Cancel through the same guarded transition the worker uses.
    ///
    /// Returns `false` when the task is unknown or already terminal. A lost
    /// race against a worker transition is re-read and retried; the status
    /// graph is acyclic, so this ends after a few rounds at most.
    pub async fn cancel_task(&self, task_id: TaskId) -> Result<bool, EngineError> {
        loop {
            let from = match self.store.get(task_id).await {
                Ok(task) => task.status(),
                Err(StoreError::NotFound(_)) => return Ok(false),
                Err(err) => return Err(err.into()),
            };

            let to = match transition(from, TaskEvent::Cancel) {
                Ok(to) => to,
                Err(err) => {
                    tracing::debug!(%task_id, reason = %err, "cancel rejected");
                    return Ok(false);
                }
            };

            if self
                .store
                .compare_and_update_status(task_id, from, to, CANCELLED)
                .await?
            {
                tracing::info!(%task_id, %from, %to, "task cancelled");
                return Ok(true);
            }
            tracing::debug!(%task_id, %from, "cancel raced with another transition, re-reading");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Delivery, QueueError};
    use crate::impls::{InMemoryDeliveryQueue, InMemoryTaskStore};
    use crate::ports::{DeliveryQueue, FixedClock, UlidGenerator};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use ulid::Ulid;

    struct BrokenQueue;

    #[async_trait]
    impl DeliveryQueue for BrokenQueue {
        async fn push(&self, _delivery: Delivery) -> Result<(), QueueError> {
            Err(QueueError::OperationFailed("broker unreachable".into()))
        }

        async fn push_after(&self, _delivery: Delivery, _delay: Duration) -> Result<(), QueueError> {
            Err(QueueError::OperationFailed("broker unreachable".into()))
        }

        async fn pop(&self, _timeout: Duration) -> Result<Option<Delivery>, QueueError> {
            Ok(None)
        }
    }

    fn service_with(queue: Arc<dyn DeliveryQueue>) -> (TaskService, Arc<InMemoryTaskStore>) {
        let store = Arc::new(InMemoryTaskStore::open());
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        let service = TaskService::new(
            store.clone(),
            Dispatcher::new(queue),
            Arc::new(UlidGenerator::new(clock)),
            Arc::new(clock),
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_create_persists_waiting_task_and_dispatches() {
        let queue = Arc::new(InMemoryDeliveryQueue::new());
        let (service, _store) = service_with(queue.clone());

        let task = service
            .create_task("alice123", "a sunset over mountains")
            .await
            .unwrap();
        assert_eq!(task.status(), TaskStatus::Waiting);
        assert_eq!(task.username(), "alice123");
        assert_eq!(task.prompt(), "a sunset over mountains");
        assert_eq!(task.info(), "");
        assert_eq!(task.created_at(), Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());

        assert_eq!(service.get_task(task.task_id()).await.unwrap(), task);
        let popped = queue.pop(Duration::from_millis(100)).await.unwrap();
        assert_eq!(popped, Some(Delivery::first(task.task_id())));
    }

    #[tokio::test]
    async fn test_invalid_request_creates_nothing() {
        let queue = Arc::new(InMemoryDeliveryQueue::new());
        let (service, _store) = service_with(queue.clone());

        let err = service.create_task("al", "a sunset over mountains").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
        assert!(service.list_tasks().await.unwrap().is_empty());
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_dispatch_failure_finalizes_task_as_error() {
        let (service, store) = service_with(Arc::new(BrokenQueue));

        let task = service
            .create_task("alice123", "a sunset over mountains")
            .await
            .unwrap();
        assert_eq!(task.status(), TaskStatus::Error);
        assert!(task.info().starts_with("dispatch failed"));
        assert!(task.info().contains("broker unreachable"));
        assert_eq!(store.get(task.task_id()).await.unwrap(), task);
    }

    #[tokio::test]
    async fn test_get_unknown_task_is_not_found() {
        let (service, _store) = service_with(Arc::new(InMemoryDeliveryQueue::new()));
        let id = TaskId::from_ulid(Ulid::new());
        let err = service.get_task(id).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(got) if got == id));
    }

    #[tokio::test]
    async fn test_cancel_waiting_task() {
        let (service, _store) = service_with(Arc::new(InMemoryDeliveryQueue::new()));
        let task = service
            .create_task("alice123", "a sunset over mountains")
            .await
            .unwrap();

        assert!(service.cancel_task(task.task_id()).await.unwrap());
        let cancelled = service.get_task(task.task_id()).await.unwrap();
        assert_eq!(cancelled.status(), TaskStatus::Cancel);
        assert_eq!(cancelled.info(), CANCELLED);

        // A second cancel finds a terminal task.
        assert!(!service.cancel_task(task.task_id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_pending_task() {
        let (service, store) = service_with(Arc::new(InMemoryDeliveryQueue::new()));
        let task = service
            .create_task("alice123", "a sunset over mountains")
            .await
            .unwrap();
        store
            .compare_and_update_status(task.task_id(), TaskStatus::Waiting, TaskStatus::Pending, "")
            .await
            .unwrap();

        assert!(service.cancel_task(task.task_id()).await.unwrap());
        assert_eq!(
            service.get_task(task.task_id()).await.unwrap().status(),
            TaskStatus::Cancel
        );
    }

    // Finished tasks stay finished.
    #[tokio::test]
    async fn test_cancel_finished_task_is_rejected() {
        let (service, store) = service_with(Arc::new(InMemoryDeliveryQueue::new()));
        let task = service
            .create_task("alice123", "a sunset over mountains")
            .await
            .unwrap();
        let id = task.task_id();
        store
            .compare_and_update_status(id, TaskStatus::Waiting, TaskStatus::Pending, "")
            .await
            .unwrap();
        store
            .compare_and_update_status(id, TaskStatus::Pending, TaskStatus::Done, "success")
            .await
            .unwrap();

        assert!(!service.cancel_task(id).await.unwrap());
        let stored = service.get_task(id).await.unwrap();
        assert_eq!(stored.status(), TaskStatus::Done);
        assert_eq!(stored.info(), "success");
    }

    #[tokio::test]
    async fn test_cancel_unknown_task_returns_false() {
        let (service, _store) = service_with(Arc::new(InMemoryDeliveryQueue::new()));
        assert!(!service.cancel_task(TaskId::from_ulid(Ulid::new())).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_returns_every_task() {
        let (service, _store) = service_with(Arc::new(InMemoryDeliveryQueue::new()));
        for prompt in ["a sunset over mountains", "a lighthouse in fog", "a fox in snow"] {
            service.create_task("alice123", prompt).await.unwrap();
        }
        assert_eq!(service.list_tasks().await.unwrap().len(), 3);
    }
}
