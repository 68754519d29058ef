//! Engine configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::app::LoopSettings;
use crate::domain::RetryPolicy;

/// Runtime configuration for the lifecycle engine.
///
/// Every field has a default, so the engine runs without any environment
/// variables set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Total worker invocations allowed while the resource is busy (default: 3).
    pub max_attempts: u32,

    /// Constant delay between busy retries (default: 10s).
    pub retry_delay: Duration,

    /// Number of consumer loops (default: 2).
    pub workers: usize,

    /// Upper bound on a single transport wait (default: 500ms).
    pub poll_timeout: Duration,

    /// Delay before redelivering after a store or transport fault (default: 1s).
    pub fault_delay: Duration,

    /// Fault redeliveries allowed per task (default: 16).
    pub max_redeliveries: u32,

    /// `tracing` filter string, e.g. `"info"` or `"easel_core=debug"`.
    pub log_level: String,

    /// When `true`, stdout log records are newline-delimited JSON.
    pub log_json: bool,

    /// When set, JSON log records are also written to `<log_dir>/app.log`.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("workers must be at least 1")]
    ZeroWorkers,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(10),
            workers: 2,
            poll_timeout: Duration::from_millis(500),
            fault_delay: Duration::from_secs(1),
            max_redeliveries: 16,
            log_level: "info".to_owned(),
            log_json: false,
            log_dir: None,
        }
    }
}

impl EngineConfig {
    /// Build [`EngineConfig`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Malformed numbers fall back to the
    /// default for that key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: parse_or(&lookup, "EASEL_MAX_ATTEMPTS", defaults.max_attempts),
            retry_delay: Duration::from_secs(parse_or(
                &lookup,
                "EASEL_RETRY_DELAY_SECS",
                defaults.retry_delay.as_secs(),
            )),
            workers: parse_or(&lookup, "EASEL_WORKERS", defaults.workers),
            poll_timeout: Duration::from_millis(parse_or(
                &lookup,
                "EASEL_POLL_TIMEOUT_MS",
                millis(defaults.poll_timeout),
            )),
            fault_delay: Duration::from_millis(parse_or(
                &lookup,
                "EASEL_FAULT_DELAY_MS",
                millis(defaults.fault_delay),
            )),
            max_redeliveries: parse_or(
                &lookup,
                "EASEL_MAX_REDELIVERIES",
                defaults.max_redeliveries,
            ),
            log_level: lookup("EASEL_LOG").unwrap_or(defaults.log_level),
            log_json: lookup("EASEL_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            log_dir: lookup("EASEL_LOG_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_delay)
    }

    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            poll_timeout: self.poll_timeout,
            fault_delay: self.fault_delay,
            max_redeliveries: self.max_redeliveries,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
