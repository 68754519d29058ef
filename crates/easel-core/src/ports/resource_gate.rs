//! ResourceGate port: is the accelerator free for one unit of work?

use async_trait::async_trait;

/// Capability check consulted once per execution attempt.
///
/// Must be cheap and free of side effects; it reserves nothing. A `false`
/// answer sends the task through the retry policy.
#[async_trait]
pub trait ResourceGate: Send + Sync {
    async fn available(&self) -> bool;
}
