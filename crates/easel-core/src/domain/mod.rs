//! Domain model: ids, the task document, status transitions, retry decisions,
//! worker outcomes and errors.

pub mod decision;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod state;
pub mod task;

pub use decision::{Decision, RetryPolicy};
pub use errors::{
    EngineError, ErrorKind, GenerationError, QueueError, StoreError, TransitionError,
};
pub use ids::{ParseTaskIdError, TaskId};
pub use outcome::{Delivery, Outcome, Resolution};
pub use state::{ParseTaskStatusError, TaskEvent, TaskStatus, transition};
pub use task::{GenerateRequest, Task};
