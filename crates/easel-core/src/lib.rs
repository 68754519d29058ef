//! easel-core
//!
//! Lifecycle engine for asynchronous generation tasks: a task is created
//! `waiting`, claimed into `pending` by exactly one worker, and finalized as
//! `done`, `error` or `cancel`. Every status write is a compare-and-update
//! checked against the transition table, so duplicate deliveries and racing
//! cancels stay consistent.
//!
//! # Modules
//! - **domain**: task model, status transitions, retry policy, errors
//! - **ports**: TaskStore, DeliveryQueue, ResourceGate, Generator, Clock, IdGenerator
//! - **impls**: in-memory store and transport, gates, stub generator
//! - **app**: TaskService, Dispatcher, Worker, WorkerGroup, EngineBuilder
//! - **config** / **telemetry**: environment configuration and logging setup

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod telemetry;

pub use app::{Engine, EngineBuilder, RunningEngine, TaskService};
pub use config::EngineConfig;
pub use domain::{EngineError, Task, TaskId, TaskStatus};
