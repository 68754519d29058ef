//! App: the lifecycle engine assembled from the ports.
//!
//! # Components
//! - **TaskService**: intake (create, get, list, cancel)
//! - **Dispatcher**: hands new tasks to the transport
//! - **Worker**: claim, gate check, generation and the final write for one delivery
//! - **WorkerGroup**: consumer loops mapping worker outcomes onto redeliveries
//! - **EngineBuilder**: wiring and startup validation

pub mod builder;
pub mod dispatcher;
pub mod service;
pub mod worker;
pub mod worker_loop;

pub use self::builder::{BuildError, Engine, EngineBuilder, RunningEngine};
pub use self::dispatcher::Dispatcher;
pub use self::service::TaskService;
pub use self::worker::Worker;
pub use self::worker_loop::{LoopSettings, WorkerGroup};
