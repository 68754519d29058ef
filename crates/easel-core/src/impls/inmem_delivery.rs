//! InMemoryDeliveryQueue: development transport.
//!
//! - `ready`: deliveries that can be popped now, FIFO.
//! - `scheduled`: min-heap of delayed redeliveries, promoted to `ready` when due.
//! - `Notify` wakes a waiting `pop` on push; a pending scheduled entry bounds
//!   the wait so delayed deliveries surface without a push.
//!
//! # 学習ポイント
//! - `tokio::sync::Notify` と `sleep_until` を `select!` で待つ async pop
//! - `Ord` を逆向きに実装し、`BinaryHeap` を期限の早い順の min-heap にする

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::domain::{Delivery, QueueError};
use crate::ports::DeliveryQueue;

/// Delayed delivery in the scheduled heap.
///
/// Ordering is reversed so `BinaryHeap` pops the earliest `due` first; `seq`
/// keeps FIFO order among entries due at the same instant.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledDelivery {
    due: Instant,
    seq: u64,
    delivery: Delivery,
}

impl PartialOrd for ScheduledDelivery {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledDelivery {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<Delivery>,
    scheduled: BinaryHeap<ScheduledDelivery>,
    next_seq: u64,
    closed: bool,
}

impl QueueState {
    fn promote_due(&mut self, now: Instant) {
        while let Some(entry) = self.scheduled.peek() {
            if entry.due > now {
                break;
            }
            if let Some(entry) = self.scheduled.pop() {
                self.ready.push_back(entry.delivery);
            }
        }
    }
}

pub struct InMemoryDeliveryQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl InMemoryDeliveryQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
        }
    }

    /// Stop accepting deliveries and wake every waiting consumer.
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
        self.notify.notify_waiters();
    }

    /// Deliveries not yet popped, ready or scheduled.
    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.ready.len() + state.scheduled.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryDeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryQueue for InMemoryDeliveryQueue {
    async fn push(&self, delivery: Delivery) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(QueueError::Closed);
            }
            state.ready.push_back(delivery);
        }
        // Notify outside the lock.
        self.notify.notify_one();
        Ok(())
    }

    async fn push_after(&self, delivery: Delivery, delay: Duration) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(QueueError::Closed);
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.scheduled.push(ScheduledDelivery {
                due: Instant::now() + delay,
                seq,
                delivery,
            });
        }
        // Wake a waiter so it re-arms its timer for the new entry.
        self.notify.notify_one();
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<Delivery>, QueueError> {
        let deadline = Instant::now() + timeout;
        loop {
            let wake_at = {
                let mut state = self.state.lock().await;
                if state.closed {
                    return Err(QueueError::Closed);
                }
                let now = Instant::now();
                state.promote_due(now);
                if let Some(delivery) = state.ready.pop_front() {
                    return Ok(Some(delivery));
                }
                if now >= deadline {
                    return Ok(None);
                }
                match state.scheduled.peek() {
                    Some(entry) if entry.due < deadline => entry.due,
                    _ => deadline,
                }
            };

            tokio::select! {
                _ = self.notify.notified() => {},
                _ = tokio::time::sleep_until(wake_at) => {},
            }
        }
    }
}
