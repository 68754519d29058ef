//! Structured logging setup.
//!
//! Stdout gets a plain or JSON `fmt` layer; when `log_dir` is configured, JSON
//! lines are also appended to `<log_dir>/app.log` through a non-blocking
//! writer. The filter comes from `RUST_LOG` when set, else the configured
//! level.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::EngineConfig;

/// File name of the JSON log sink inside `log_dir`.
pub const LOG_FILE_NAME: &str = "app.log";

/// Keeps the file writer flushing. Drop it last, at process exit.
#[must_use = "dropping the guard stops the file log writer"]
pub struct TelemetryGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// A second call (or a subscriber installed elsewhere) is not an error; the
/// existing subscriber stays in place.
pub fn init(cfg: &EngineConfig) -> TelemetryGuard {
    let filter = build_filter(&cfg.log_level);

    let stdout = if cfg.log_json {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .json()
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    };

    let (file, guard) = match &cfg.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .json()
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init();
    if installed.is_err() {
        tracing::debug!("global tracing subscriber already set, keeping it");
    }

    TelemetryGuard { _file: guard }
}

fn build_filter(level: &str) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match level.parse::<EnvFilter>() {
            Ok(filter) => filter,
            Err(e) => {
                eprintln!("WARN: EASEL_LOG='{level}' is not a valid tracing filter ({e}); falling back to 'info'");
                EnvFilter::new("info")
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let cfg = EngineConfig {
            log_level: "debug".to_owned(),
            ..EngineConfig::default()
        };
        let _first = init(&cfg);
        let _second = init(&cfg);
        tracing::info!("still logging");
    }

    #[test]
    fn test_invalid_level_falls_back() {
        // Either RUST_LOG or the fallback wins; neither panics.
        let _ = build_filter("not a [valid filter");
    }
}
