//! Task status and the transition table.
//!
//! This module is the only place that knows which status changes are legal.
//! Callers ask [`transition`] for the next status and then apply it through
//! [`TaskStore::compare_and_update_status`](crate::ports::TaskStore::compare_and_update_status)
//! with the current status as the expected value.
//!
//! ```text
//! WAITING --claim-->   PENDING
//! WAITING --cancel-->  CANCEL
//! WAITING --fail-->    ERROR     (dispatch failure only)
//! PENDING --succeed--> DONE
//! PENDING --fail-->    ERROR
//! PENDING --cancel-->  CANCEL
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::TransitionError;

/// Lifecycle status of a task, persisted as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created and handed to the transport; nobody has claimed it yet.
    Waiting,

    /// Claimed by a worker; generation running or waiting for the resource.
    Pending,

    /// Generation finished successfully.
    Done,

    /// Generation failed, or the resource never became available.
    Error,

    /// Cancelled on request.
    Cancel,
}

impl TaskStatus {
    /// Is this a terminal status (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error | TaskStatus::Cancel)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Waiting => "waiting",
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
            TaskStatus::Error => "error",
            TaskStatus::Cancel => "cancel",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no task status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid task status '{0}'")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(TaskStatus::Waiting),
            "pending" => Ok(TaskStatus::Pending),
            "done" => Ok(TaskStatus::Done),
            "error" => Ok(TaskStatus::Error),
            "cancel" => Ok(TaskStatus::Cancel),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

/// Events that drive a task through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskEvent {
    /// A worker takes exclusive ownership of the task.
    Claim,
    /// Generation succeeded.
    Succeed,
    /// Generation failed, the resource stayed busy, or dispatch failed.
    Fail,
    /// External cancel request.
    Cancel,
}

impl TaskEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskEvent::Claim => "claim",
            TaskEvent::Succeed => "succeed",
            TaskEvent::Fail => "fail",
            TaskEvent::Cancel => "cancel",
        }
    }
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve `event` against `from`.
///
/// Pure function: no store access. A rejected event is an ordinary outcome
/// ("already claimed", "already terminal") that callers turn into a no-op.
pub fn transition(from: TaskStatus, event: TaskEvent) -> Result<TaskStatus, TransitionError> {
    let to = match (from, event) {
        (TaskStatus::Waiting, TaskEvent::Claim) => TaskStatus::Pending,
        (TaskStatus::Waiting, TaskEvent::Cancel) => TaskStatus::Cancel,
        (TaskStatus::Waiting, TaskEvent::Fail) => TaskStatus::Error,
        (TaskStatus::Pending, TaskEvent::Succeed) => TaskStatus::Done,
        (TaskStatus::Pending, TaskEvent::Fail) => TaskStatus::Error,
        (TaskStatus::Pending, TaskEvent::Cancel) => TaskStatus::Cancel,
        (from, event) => return Err(TransitionError::InvalidTransition { from, event }),
    };
    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::claim(TaskStatus::Waiting, TaskEvent::Claim, TaskStatus::Pending)]
    #[case::cancel_waiting(TaskStatus::Waiting, TaskEvent::Cancel, TaskStatus::Cancel)]
    #[case::dispatch_failed(TaskStatus::Waiting, TaskEvent::Fail, TaskStatus::Error)]
    #[case::succeed(TaskStatus::Pending, TaskEvent::Succeed, TaskStatus::Done)]
    #[case::fail(TaskStatus::Pending, TaskEvent::Fail, TaskStatus::Error)]
    #[case::cancel_pending(TaskStatus::Pending, TaskEvent::Cancel, TaskStatus::Cancel)]
    fn test_legal_transitions(
        #[case] from: TaskStatus,
        #[case] event: TaskEvent,
        #[case] to: TaskStatus,
    ) {
        assert_eq!(transition(from, event), Ok(to));
    }

    #[rstest]
    #[case::claim_twice(TaskStatus::Pending, TaskEvent::Claim)]
    #[case::succeed_unclaimed(TaskStatus::Waiting, TaskEvent::Succeed)]
    #[case::claim_done(TaskStatus::Done, TaskEvent::Claim)]
    #[case::cancel_done(TaskStatus::Done, TaskEvent::Cancel)]
    #[case::cancel_error(TaskStatus::Error, TaskEvent::Cancel)]
    #[case::fail_cancelled(TaskStatus::Cancel, TaskEvent::Fail)]
    #[case::cancel_cancelled(TaskStatus::Cancel, TaskEvent::Cancel)]
    fn test_rejected_transitions(#[case] from: TaskStatus, #[case] event: TaskEvent) {
        assert_eq!(
            transition(from, event),
            Err(TransitionError::InvalidTransition { from, event })
        );
    }

    #[test]
    fn test_terminal_statuses_accept_no_event() {
        let events = [TaskEvent::Claim, TaskEvent::Succeed, TaskEvent::Fail, TaskEvent::Cancel];
        for status in [TaskStatus::Done, TaskStatus::Error, TaskStatus::Cancel] {
            assert!(status.is_terminal());
            for event in events {
                assert!(transition(status, event).is_err(), "{status} accepted {event}");
            }
        }
        assert!(!TaskStatus::Waiting.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let s = serde_json::to_string(&TaskStatus::Waiting).unwrap();
        assert_eq!(s, "\"waiting\"");
        let back: TaskStatus = serde_json::from_str("\"cancel\"").unwrap();
        assert_eq!(back, TaskStatus::Cancel);
        assert_eq!("done".parse::<TaskStatus>(), Ok(TaskStatus::Done));
        assert!("finished".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_unknown_status_names_the_input() {
        let err = "Done ".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid task status 'Done '");
        assert_eq!(
            "DONE".parse::<TaskStatus>(),
            Err(ParseTaskStatusError("DONE".to_string()))
        );
    }
}
