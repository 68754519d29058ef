//! DeliveryQueue port: the job transport.
//!
//! Carries [`Delivery`] messages only; task state lives in the
//! [`TaskStore`](super::TaskStore). Delivery is at-least-once, so consumers
//! must tolerate duplicates.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Delivery, QueueError};

#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    /// Make `delivery` available immediately.
    async fn push(&self, delivery: Delivery) -> Result<(), QueueError>;

    /// Make `delivery` available once `delay` has elapsed.
    async fn push_after(&self, delivery: Delivery, delay: Duration) -> Result<(), QueueError>;

    /// Wait up to `timeout` for the next available delivery.
    async fn pop(&self, timeout: Duration) -> Result<Option<Delivery>, QueueError>;
}
