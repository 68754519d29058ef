//! Worker: drives one delivery of one task through the lifecycle.
//!
//! # Flow
//! 1. Load the task; unknown ids are a no-op.
//! 2. `waiting` → claim it with a conditional `waiting → pending` write.
//!    `pending` on a repeated delivery (busy retry or fault redelivery) →
//!    resume. Anything else → no-op.
//! 3. Check the resource gate. Busy → ask the retry policy: redeliver later,
//!    or finalize as `error` ("resource busy").
//! 4. Run the generator and finalize as `done` or `error`.
//!
//! # 不変条件
//! - 書き込みは全て「読んだ / claim した status」を expected にした
//!   compare-and-update。重複・並行配送でも claim は高々 1 回、終端書き込みも 1 回
//! - store の障害は呼び出し側へ返す。回復は transport の再配送に任せる

use std::any::Any;
use std::sync::Arc;

use tokio::task::JoinError;

use crate::domain::{
    Decision, Delivery, EngineError, GenerationError, Outcome, Resolution, RetryPolicy,
    StoreError, Task, TaskEvent, TaskId, TaskStatus, transition,
};
use crate::ports::{Generator, ResourceGate, TaskStore};

/// `info` written when the retry budget runs out on a busy resource.
pub const RESOURCE_BUSY: &str = "resource busy";

/// `info` written on a successful generation.
pub const SUCCESS: &str = "success";

/// What happened inside the guarded section (gate check + generation).
enum AttemptResult {
    Busy,
    Generated(Result<(), GenerationError>),
}

pub struct Worker {
    store: Arc<dyn TaskStore>,
    gate: Arc<dyn ResourceGate>,
    generator: Arc<dyn Generator>,
    policy: RetryPolicy,
}

impl Worker {
    pub fn new(
        store: Arc<dyn TaskStore>,
        gate: Arc<dyn ResourceGate>,
        generator: Arc<dyn Generator>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            gate,
            generator,
            policy,
        }
    }

    /// Handle busy-retry number `attempt` (0-based) of `task_id`.
    pub async fn execute(&self, task_id: TaskId, attempt: u32) -> Result<Outcome, EngineError> {
        self.handle(Delivery {
            task_id,
            attempt,
            redeliveries: 0,
        })
        .await
    }

    /// Handle one transport message.
    #[tracing::instrument(
        name = "worker.execute",
        skip(self, delivery),
        fields(
            task_id = %delivery.task_id,
            attempt = delivery.attempt,
            redeliveries = delivery.redeliveries
        )
    )]
    pub async fn handle(&self, delivery: Delivery) -> Result<Outcome, EngineError> {
        let Delivery {
            task_id, attempt, ..
        } = delivery;
        let mut task = match self.store.get(task_id).await {
            Ok(task) => task,
            Err(StoreError::NotFound(_)) => {
                tracing::debug!("task not found, nothing to do");
                return Ok(Outcome::Done(Resolution::Missing));
            }
            Err(err) => return Err(err.into()),
        };

        match task.status() {
            TaskStatus::Waiting => {
                // The read above is only a hint; the conditional write decides.
                if !self.apply(task_id, TaskStatus::Waiting, TaskEvent::Claim, "").await? {
                    tracing::debug!("claim lost to a concurrent delivery");
                    return Ok(Outcome::Done(Resolution::LostClaim));
                }
                tracing::info!(from = %TaskStatus::Waiting, to = %TaskStatus::Pending, "task claimed");
                // Mirror the write so the generator sees the claimed document.
                task.apply_status(TaskStatus::Pending, "");
            }
            TaskStatus::Pending if delivery.is_repeat() => {
                tracing::info!("resuming claimed task on redelivery");
            }
            status => {
                tracing::debug!(%status, "task already progressed, nothing to do");
                return Ok(Outcome::Done(Resolution::AlreadyProgressed(status)));
            }
        }

        self.run_claimed(task, attempt).await
    }

    async fn run_claimed(&self, task: Task, attempt: u32) -> Result<Outcome, EngineError> {
        let task_id = task.task_id();
        let gate = Arc::clone(&self.gate);
        let generator = Arc::clone(&self.generator);

        // Run on its own task so a panic in the gate or the backend is caught
        // here instead of leaving the task `pending`.
        let guarded = tokio::spawn(async move {
            if !gate.available().await {
                return AttemptResult::Busy;
            }
            AttemptResult::Generated(generator.generate(&task).await)
        });

        let result = match guarded.await {
            Ok(result) => result,
            Err(err) => AttemptResult::Generated(Err(GenerationError::new(describe_fault(err)))),
        };

        match result {
            AttemptResult::Busy => match self.policy.decide(attempt) {
                Decision::Retry { delay } => {
                    tracing::warn!(?delay, max_attempts = self.policy.max_attempts, "resource busy, retry scheduled");
                    Ok(Outcome::RetryAfter(delay))
                }
                Decision::GiveUp => {
                    tracing::error!(max_attempts = self.policy.max_attempts, "resource busy, giving up");
                    self.finalize(task_id, TaskEvent::Fail, RESOURCE_BUSY).await
                }
            },
            AttemptResult::Generated(Ok(())) => {
                self.finalize(task_id, TaskEvent::Succeed, SUCCESS).await
            }
            AttemptResult::Generated(Err(err)) => {
                tracing::error!(reason = %err, "generation failed");
                self.finalize(task_id, TaskEvent::Fail, err.reason()).await
            }
        }
    }

    /// Finalize a claimed task whose busy retry could not be scheduled.
    ///
    /// Without this write the task would stay `pending` with nothing left on
    /// the transport to move it.
    pub async fn fail_retry(&self, task_id: TaskId, reason: &str) -> Result<Outcome, EngineError> {
        tracing::error!(%task_id, reason, "retry could not be scheduled");
        self.finalize(task_id, TaskEvent::Fail, &format!("retry scheduling failed: {reason}"))
            .await
    }

    /// Resolve `event` from `from` and write it conditionally.
    async fn apply(
        &self,
        task_id: TaskId,
        from: TaskStatus,
        event: TaskEvent,
        info: &str,
    ) -> Result<bool, EngineError> {
        let to = transition(from, event)?;
        let applied = self
            .store
            .compare_and_update_status(task_id, from, to, info)
            .await?;
        Ok(applied)
    }

    async fn finalize(
        &self,
        task_id: TaskId,
        event: TaskEvent,
        info: &str,
    ) -> Result<Outcome, EngineError> {
        let to = transition(TaskStatus::Pending, event)?;
        if self.apply(task_id, TaskStatus::Pending, event, info).await? {
            tracing::info!(from = %TaskStatus::Pending, %to, info, "task finalized");
            Ok(Outcome::Done(Resolution::Finalized(to)))
        } else {
            tracing::info!(%to, "final write superseded by a concurrent transition");
            Ok(Outcome::Done(Resolution::Superseded))
        }
    }
}

fn describe_fault(err: JoinError) -> String {
    if err.is_panic() {
        format!("generation panicked: {}", panic_message(err.into_panic()))
    } else {
        "generation aborted".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
