//! ResourceGate implementations.

use async_trait::async_trait;

use crate::ports::ResourceGate;

/// Coin-flip gate.
///
/// Stands in for a real accelerator check: each call is available with
/// probability one half.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGate;

#[async_trait]
impl ResourceGate for RandomGate {
    async fn available(&self) -> bool {
        rand::random::<bool>()
    }
}

/// Gate with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedGate {
    available: bool,
}

impl FixedGate {
    pub fn open() -> Self {
        Self { available: true }
    }

    pub fn closed() -> Self {
        Self { available: false }
    }
}

#[async_trait]
impl ResourceGate for FixedGate {
    async fn available(&self) -> bool {
        self.available
    }
}
