use std::{fs, path::PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DiagnosticsConfig;

/// Keeps the non-blocking file writer flushing until dropped.
pub struct TelemetryGuard {
    pub log_file: PathBuf,
    _file_guard: WorkerGuard,
}

/// Compact console output on stderr plus a JSON trace file under `config.logs_dir`.
///
/// `RUST_LOG` overrides the configured filter.
pub fn init_tracing(config: &DiagnosticsConfig) -> anyhow::Result<TelemetryGuard> {
    let log_dir = config.logs_dir.as_path();
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

    let file_name = trace_file_name(&config.trace_file_prefix, Utc::now());
    let (file_writer, file_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, &file_name));

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.rust_log_filter));

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .json()
                .with_writer(file_writer),
        )
        .try_init();

    let log_file = log_dir.join(file_name);
    match result {
        Ok(()) => info!(log_file = %log_file.display(), "tracing initialized"),
        Err(error) => warn!(?error, "global tracing subscriber already initialized"),
    }

    Ok(TelemetryGuard {
        log_file,
        _file_guard: file_guard,
    })
}

fn trace_file_name(prefix: &str, started_at: DateTime<Utc>) -> String {
    format!("{prefix}-{}.log", started_at.format("%Y%m%d-%H%M%S"))
}
