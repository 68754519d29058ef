//! EngineBuilder: wiring and startup validation.
//!
//! Store and transport must be supplied; everything else has a development
//! default. `build()` fails fast on missing components or invalid config
//! instead of failing on the first delivery.
//!
//! # 学習ポイント
//! - Builder パターンで port 実装を差し替える
//! - 起動時検証（Fail-fast）: 設定と必須コンポーネントを `build()` で確認

use std::sync::Arc;

use crate::config::{ConfigError, EngineConfig};
use crate::domain::{EngineError, StoreError};
use crate::impls::{NoopGenerator, RandomGate};
use crate::ports::{
    Clock, DeliveryQueue, Generator, IdGenerator, ResourceGate, SystemClock, TaskStore,
    UlidGenerator,
};

use super::dispatcher::Dispatcher;
use super::service::TaskService;
use super::worker::Worker;
use super::worker_loop::WorkerGroup;

/// EngineBuilder assembles an [`Engine`].
///
/// # Example
/// ```ignore
/// let engine = EngineBuilder::new()
///     .store(Arc::new(InMemoryTaskStore::open()))
///     .queue(Arc::new(InMemoryDeliveryQueue::new()))
///     .config(EngineConfig::from_env())
///     .build()?;
/// let running = engine.start().await?;
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn TaskStore>>,
    queue: Option<Arc<dyn DeliveryQueue>>,
    gate: Option<Arc<dyn ResourceGate>>,
    generator: Option<Arc<dyn Generator>>,
    clock: Option<Arc<dyn Clock>>,
    id_generator: Option<Arc<dyn IdGenerator>>,
    config: EngineConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing component: {0}. Supply it on the builder before build().")]
    MissingComponent(&'static str),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn queue(mut self, queue: Arc<dyn DeliveryQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn gate(mut self, gate: Arc<dyn ResourceGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(id_generator);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Engine, BuildError> {
        self.config.validate()?;
        let store = self.store.ok_or(BuildError::MissingComponent("store"))?;
        let queue = self.queue.ok_or(BuildError::MissingComponent("queue"))?;
        let gate = self
            .gate
            .unwrap_or_else(|| Arc::new(RandomGate) as Arc<dyn ResourceGate>);
        let generator = self
            .generator
            .unwrap_or_else(|| Arc::new(NoopGenerator::new()) as Arc<dyn Generator>);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let id_generator = self.id_generator.unwrap_or_else(|| {
            Arc::new(UlidGenerator::new(Arc::clone(&clock))) as Arc<dyn IdGenerator>
        });

        let worker = Arc::new(Worker::new(
            Arc::clone(&store),
            gate,
            generator,
            self.config.retry_policy(),
        ));
        let service = TaskService::new(
            Arc::clone(&store),
            Dispatcher::new(Arc::clone(&queue)),
            id_generator,
            clock,
        );

        Ok(Engine {
            store,
            queue,
            worker,
            service,
            config: self.config,
        })
    }
}

/// A wired engine that has not started consuming yet.
pub struct Engine {
    store: Arc<dyn TaskStore>,
    queue: Arc<dyn DeliveryQueue>,
    worker: Arc<Worker>,
    service: TaskService,
    config: EngineConfig,
}

impl Engine {
    pub fn service(&self) -> &TaskService {
        &self.service
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check the store and spawn the consumer loops.
    pub async fn start(self) -> Result<RunningEngine, EngineError> {
        self.store.ping().await?;
        let workers = WorkerGroup::spawn(
            self.config.workers,
            Arc::clone(&self.queue),
            Arc::clone(&self.worker),
            self.config.loop_settings(),
        );
        tracing::info!(
            workers = self.config.workers,
            max_attempts = self.config.max_attempts,
            retry_delay = ?self.config.retry_delay,
            "engine started"
        );
        Ok(RunningEngine {
            store: self.store,
            service: self.service,
            workers,
        })
    }
}

/// An engine with live consumer loops.
pub struct RunningEngine {
    store: Arc<dyn TaskStore>,
    service: TaskService,
    workers: WorkerGroup,
}

impl RunningEngine {
    pub fn service(&self) -> &TaskService {
        &self.service
    }

    /// Stop the consumer loops, wait for in-flight deliveries, then close the
    /// store.
    pub async fn shutdown(self) -> Result<(), StoreError> {
        self.workers.shutdown_and_join().await;
        self.store.close().await?;
        tracing::info!("engine stopped");
        Ok(())
    }
}
