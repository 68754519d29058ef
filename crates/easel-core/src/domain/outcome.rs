//! What a worker invocation reports back to the transport.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ids::TaskId;
use super::state::TaskStatus;

/// Result of one `Worker::execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The delivery is consumed; `Resolution` says what happened.
    Done(Resolution),

    /// The resource was busy; redeliver after the delay. The task stays
    /// `pending`.
    RetryAfter(Duration),
}

/// How a consumed delivery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The task does not exist.
    Missing,

    /// The task was already past the point this delivery could act on.
    AlreadyProgressed(TaskStatus),

    /// Another invocation won the claim.
    LostClaim,

    /// This invocation wrote the terminal status.
    Finalized(TaskStatus),

    /// A concurrent transition (a cancel) landed before the final write.
    Superseded,
}

/// Transport message: which task, and how it got here.
///
/// The two counters move independently. `attempt` advances only when the
/// resource was busy and is what the retry policy reads; `redeliveries`
/// advances only after a store or transport fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delivery {
    pub task_id: TaskId,
    /// 0 on the first delivery, incremented on each busy retry.
    pub attempt: u32,
    /// Redeliveries caused by faults.
    #[serde(default)]
    pub redeliveries: u32,
}

impl Delivery {
    pub fn first(task_id: TaskId) -> Self {
        Self {
            task_id,
            attempt: 0,
            redeliveries: 0,
        }
    }

    /// The delivery that retries after a busy resource.
    pub fn retry(self) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
            ..self
        }
    }

    /// The delivery that repeats this one after a fault.
    pub fn redeliver(self) -> Self {
        Self {
            redeliveries: self.redeliveries.saturating_add(1),
            ..self
        }
    }

    /// Has this task already been seen by a worker through this message chain?
    pub fn is_repeat(&self) -> bool {
        self.attempt > 0 || self.redeliveries > 0
    }
}
