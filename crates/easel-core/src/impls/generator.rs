//! Generator implementations.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{GenerationError, Task};
use crate::ports::Generator;

/// Placeholder backend: waits `latency` and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGenerator {
    latency: Duration,
}

impl NoopGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl Generator for NoopGenerator {
    async fn generate(&self, task: &Task) -> Result<(), GenerationError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        tracing::debug!(task_id = %task.task_id(), prompt_chars = task.prompt().chars().count(), "generation finished");
        Ok(())
    }
}
