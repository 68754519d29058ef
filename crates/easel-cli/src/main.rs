//! easel – run generation tasks against the in-memory engine.
//!
//! Startup order:
//! 1. Parse flags and load configuration from the environment.
//! 2. Initialise tracing.
//! 3. Build and start the engine.
//! 4. Submit the prompts, optionally cancel the first task.
//! 5. Wait until every task is terminal, print them as JSON and shut down.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;

use easel_core::impls::{FixedGate, InMemoryDeliveryQueue, InMemoryTaskStore, NoopGenerator, RandomGate};
use easel_core::ports::ResourceGate;
use easel_core::{EngineBuilder, EngineConfig, Task, TaskId, TaskService};

/// Submit prompts and report how each task ended.
#[derive(Debug, Parser)]
#[command(name = "easel", version, about = "Generation task lifecycle demo")]
struct Cli {
    /// Username attached to every task (4 to 32 characters).
    #[arg(short, long, default_value = "alice123")]
    username: String,

    /// Prompt to submit; repeat for several tasks (8 to 256 characters).
    #[arg(short, long = "prompt", default_value = "a sunset over mountains")]
    prompts: Vec<String>,

    /// How the resource gate answers.
    #[arg(long, value_enum, default_value_t = GateMode::Random)]
    gate: GateMode,

    /// Cancel the first task right after submitting it.
    #[arg(long)]
    cancel_first: bool,

    /// Busy-retry delay in milliseconds (overrides EASEL_RETRY_DELAY_SECS).
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Simulated generation latency in milliseconds.
    #[arg(long, default_value_t = 50)]
    latency_ms: u64,

    /// Give up waiting after this many seconds.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GateMode {
    /// Available half of the time.
    Random,
    /// Always available.
    Open,
    /// Never available.
    Closed,
}

impl GateMode {
    fn gate(self) -> Arc<dyn ResourceGate> {
        match self {
            GateMode::Random => Arc::new(RandomGate),
            GateMode::Open => Arc::new(FixedGate::open()),
            GateMode::Closed => Arc::new(FixedGate::closed()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    cancelled: Option<TaskId>,
    tasks: Vec<Task>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = EngineConfig::from_env();
    if let Some(ms) = cli.retry_delay_ms {
        cfg.retry_delay = Duration::from_millis(ms);
    }
    let _telemetry = easel_core::telemetry::init(&cfg);
    info!(version = env!("CARGO_PKG_VERSION"), "easel starting");

    let engine = EngineBuilder::new()
        .store(Arc::new(InMemoryTaskStore::open()))
        .queue(Arc::new(InMemoryDeliveryQueue::new()))
        .gate(cli.gate.gate())
        .generator(Arc::new(NoopGenerator::with_latency(Duration::from_millis(
            cli.latency_ms,
        ))))
        .config(cfg)
        .build()
        .context("engine configuration")?;
    let running = engine.start().await.context("engine start")?;
    let service = running.service().clone();

    let mut ids = Vec::with_capacity(cli.prompts.len());
    for prompt in &cli.prompts {
        let task = service
            .create_task(&cli.username, prompt)
            .await
            .with_context(|| format!("create task for prompt {prompt:?}"))?;
        ids.push(task.task_id());
    }

    let mut cancelled = None;
    if cli.cancel_first {
        if let Some(&first) = ids.first() {
            if service.cancel_task(first).await? {
                cancelled = Some(first);
            }
        }
    }

    let tasks = wait_for_terminal(&service, &ids, Duration::from_secs(cli.timeout_secs)).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&Report { cancelled, tasks })?
    );

    running.shutdown().await?;
    Ok(())
}

async fn wait_for_terminal(
    service: &TaskService,
    ids: &[TaskId],
    timeout: Duration,
) -> anyhow::Result<Vec<Task>> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let mut tasks = Vec::with_capacity(ids.len());
        for id in ids {
            tasks.push(service.get_task(*id).await?);
        }
        if tasks.iter().all(|t| t.status().is_terminal()) {
            return Ok(tasks);
        }
        if tokio::time::Instant::now() >= deadline {
            let pending: Vec<String> = tasks
                .iter()
                .filter(|t| !t.status().is_terminal())
                .map(|t| format!("{}={}", t.task_id(), t.status()))
                .collect();
            bail!("timed out waiting for tasks: {}", pending.join(", "));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
