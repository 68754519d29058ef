//! Generator port: the externalized generation work.

use async_trait::async_trait;

use crate::domain::{GenerationError, Task};

/// Runs the actual generation for a claimed task.
///
/// May take arbitrary time. `Err` is recorded as the task's failure reason and
/// is not retried.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, task: &Task) -> Result<(), GenerationError>;
}
