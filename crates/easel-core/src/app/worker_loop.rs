//! WorkerGroup: consumer loops between the transport and the [`Worker`].
//!
//! Each loop pops one delivery at a time and maps the worker's answer back
//! onto the transport:
//! - `Done(_)`: nothing more to do
//! - `RetryAfter(delay)`: redeliver with `attempt + 1` after `delay`; if that
//!   cannot be scheduled, the worker finalizes the task as `error`
//! - infrastructure error: redeliver with `redeliveries + 1` after
//!   `fault_delay`, up to `max_redeliveries`. `attempt` is left alone, so
//!   faults never spend the busy-retry budget
//! - any other error: log and drop
//!
//! # 実装
//! 1. `watch` チャネルと `pop` を `select!` し、shutdown をすぐ検知する
//! 2. 1 配送ずつ [`Worker::handle`] に渡す
//! 3. 結果に応じて `push_after` で再配送を予約する

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{Delivery, Outcome, QueueError};
use crate::ports::DeliveryQueue;

use super::worker::Worker;

/// Knobs for the consumer loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    /// Upper bound on one `pop` wait; also how quickly a loop notices shutdown
    /// on transports that ignore the watch channel.
    pub poll_timeout: Duration,
    /// Delay before redelivering after a store or transport fault.
    pub fault_delay: Duration,
    /// Fault redeliveries allowed per delivery chain; past this it is dropped.
    pub max_redeliveries: u32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(500),
            fault_delay: Duration::from_secs(1),
            max_redeliveries: 16,
        }
    }
}

/// Worker group handle.
/// - `request_shutdown()` stops every loop before its next pop
/// - `shutdown_and_join()` also waits for in-flight deliveries to finish
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` consumer loops sharing one worker.
    pub fn spawn(
        n: usize,
        queue: Arc<dyn DeliveryQueue>,
        worker: Arc<Worker>,
        settings: LoopSettings,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let q = Arc::clone(&queue);
            let w = Arc::clone(&worker);
            let mut rx = shutdown_rx.clone();

            let join = tokio::spawn(async move {
                worker_loop(worker_id, q, w, settings, &mut rx).await;
            });
            joins.push(join);
        }
        tracing::info!(workers = n, "worker group started");

        Self { shutdown_tx, joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Ask every loop to stop. In-flight deliveries run to completion.
    pub fn request_shutdown(&self) {
        // Receivers may already be gone.
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            if let Err(err) = join.await {
                tracing::error!(error = %err, "worker loop terminated abnormally");
            }
        }
        tracing::info!("worker group stopped");
    }
}

#[tracing::instrument(name = "worker.loop", skip(queue, worker, settings, shutdown_rx))]
async fn worker_loop(
    worker_id: usize,
    queue: Arc<dyn DeliveryQueue>,
    worker: Arc<Worker>,
    settings: LoopSettings,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let popped = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    // Sender dropped: the group is gone.
                    break;
                }
                continue;
            }
            popped = queue.pop(settings.poll_timeout) => popped,
        };

        let delivery = match popped {
            Ok(Some(delivery)) => delivery,
            Ok(None) => continue,
            Err(QueueError::Closed) => {
                tracing::info!("transport closed, stopping");
                break;
            }
            Err(err) => {
                tracing::error!(error = %err, "pop failed, backing off");
                tokio::time::sleep(settings.fault_delay).await;
                continue;
            }
        };

        handle_delivery(queue.as_ref(), &worker, settings, delivery).await;
    }
    tracing::debug!("worker loop exited");
}

/// What a delivery needs after the worker is done with it.
enum FollowUp {
    Settled,
    Retry(Duration),
    Redeliver(Duration),
}

/// Run one delivery and schedule whatever follow-up it needs.
pub(crate) async fn handle_delivery(
    queue: &dyn DeliveryQueue,
    worker: &Worker,
    settings: LoopSettings,
    delivery: Delivery,
) {
    let task_id = delivery.task_id;
    let follow_up = match worker.handle(delivery).await {
        Ok(Outcome::Done(resolution)) => {
            tracing::debug!(%task_id, ?resolution, "delivery settled");
            FollowUp::Settled
        }
        Ok(Outcome::RetryAfter(delay)) => FollowUp::Retry(delay),
        Err(err) if err.is_infrastructure() => {
            if delivery.redeliveries >= settings.max_redeliveries {
                tracing::error!(
                    %task_id,
                    redeliveries = delivery.redeliveries,
                    error = %err,
                    "infrastructure fault, redelivery budget exhausted, dropping"
                );
                FollowUp::Settled
            } else {
                tracing::warn!(%task_id, redeliveries = delivery.redeliveries, error = %err, "infrastructure fault, redelivering");
                FollowUp::Redeliver(settings.fault_delay)
            }
        }
        Err(err) => {
            tracing::error!(%task_id, error = %err, "delivery failed, dropping");
            FollowUp::Settled
        }
    };

    match follow_up {
        FollowUp::Settled => {}
        FollowUp::Retry(delay) => {
            let next = delivery.retry();
            if let Err(err) = queue.push_after(next, delay).await {
                // The task is claimed; nothing else would ever move it.
                if let Err(err) = worker.fail_retry(task_id, &err.to_string()).await {
                    tracing::error!(%task_id, error = %err, "could not finalize task after failed retry scheduling");
                }
            }
        }
        FollowUp::Redeliver(delay) => {
            let next = delivery.redeliver();
            if let Err(err) = queue.push_after(next, delay).await {
                tracing::error!(%task_id, redeliveries = next.redeliveries, error = %err, "redelivery could not be scheduled");
            }
        }
    }
}
