use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn env_filter() -> EnvFilter {
    // Respect RUST_LOG if set; otherwise info for our crate and dependencies
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("oar_pipeline=info,info"))
}

/// Initializes console logging for a single stage binary.
pub fn init_logging() {
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(console_layer)
        .try_init();
}

/// Initializes logging with both console and a timestamped JSON log file.
///
/// Returns the path of the log file and the guard that flushes it; keep the
/// guard alive until the process exits.
pub fn init_logging_with_file(logs_dir: &Path) -> std::io::Result<(PathBuf, WorkerGuard)> {
    fs::create_dir_all(logs_dir)?;

    let file_name = format!("pipeline_{}.log", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let file_appender = tracing_appender::rolling::never(logs_dir, &file_name);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(console_layer)
        .try_init();

    Ok((logs_dir.join(file_name), guard))
}
