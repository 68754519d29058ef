//! Error types and their operational classification.

use thiserror::Error;

use super::ids::TaskId;
use super::state::{TaskEvent, TaskStatus};

/// Operational classification of a failure.
///
/// - Transient: may succeed if tried again later.
/// - Permanent: retrying cannot help.
/// - Infrastructure: the store or transport itself is failing; the transport's
///   redelivery is what recovers from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// The event does not apply to the task's current status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot apply '{event}' to a task in status '{from}'")]
    InvalidTransition { from: TaskStatus, event: TaskEvent },
}

/// Failure reported by a [`TaskStore`](crate::ports::TaskStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("task {0} already exists")]
    DuplicateKey(TaskId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) | StoreError::DuplicateKey(_) => ErrorKind::Permanent,
            StoreError::Unavailable(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Failure reported by a [`DeliveryQueue`](crate::ports::DeliveryQueue).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("queue closed")]
    Closed,

    #[error("queue operation failed: {0}")]
    OperationFailed(String),
}

/// The generator ran and reported failure. Recorded as the task's `info`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct GenerationError {
    reason: String,
}

impl GenerationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Error surfaced by the engine's entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(task_id) => EngineError::NotFound(task_id),
            other => EngineError::Store(other),
        }
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound(_)
            | EngineError::InvalidRequest(_)
            | EngineError::Transition(_) => ErrorKind::Permanent,
            EngineError::Store(err) => err.kind(),
            EngineError::Queue(_) => ErrorKind::Infrastructure,
        }
    }

    /// Should the transport redeliver after this error?
    pub fn is_infrastructure(&self) -> bool {
        self.kind() == ErrorKind::Infrastructure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn test_store_not_found_maps_to_engine_not_found() {
        let id = TaskId::from_ulid(Ulid::new());
        let err: EngineError = StoreError::NotFound(id).into();
        assert!(matches!(err, EngineError::NotFound(got) if got == id));
        assert_eq!(err.kind(), ErrorKind::Permanent);
    }

    #[test]
    fn test_faults_are_infrastructure() {
        let err: EngineError = StoreError::Unavailable("connection reset".into()).into();
        assert!(err.is_infrastructure());
        assert!(err.to_string().contains("connection reset"));

        let err: EngineError = QueueError::Closed.into();
        assert!(err.is_infrastructure());
    }

    #[test]
    fn test_invalid_transition_message_names_status_and_event() {
        let err = TransitionError::InvalidTransition {
            from: TaskStatus::Done,
            event: TaskEvent::Cancel,
        };
        assert_eq!(err.to_string(), "cannot apply 'cancel' to a task in status 'done'");
        assert!(!EngineError::from(err).is_infrastructure());
    }
}
