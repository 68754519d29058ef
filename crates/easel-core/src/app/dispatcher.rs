//! Dispatcher: hands new tasks to the transport.

use std::sync::Arc;

use crate::domain::{Delivery, QueueError, TaskId};
use crate::ports::DeliveryQueue;

/// Submits first deliveries. Knows the transport, not the store.
#[derive(Clone)]
pub struct Dispatcher {
    queue: Arc<dyn DeliveryQueue>,
}

impl Dispatcher {
    pub fn new(queue: Arc<dyn DeliveryQueue>) -> Self {
        Self { queue }
    }

    pub async fn submit(&self, task_id: TaskId) -> Result<(), QueueError> {
        self.queue.push(Delivery::first(task_id)).await?;
        tracing::debug!(%task_id, "task dispatched");
        Ok(())
    }
}
