use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::non_blocking;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the non-blocking writers flushing until dropped.
pub struct LoggingGuards {
    _file: WorkerGuard,
    _console: WorkerGuard,
}

pub fn init_logging(log_dir: &Path, service_name: &str) -> anyhow::Result<LoggingGuards> {
    std::fs::create_dir_all(log_dir)?;
    let rotated = rotate_logs_on_startup(log_dir, service_name);

    let file_appender = log_file_appender(log_dir, service_name);
    let (non_blocking_file, file_guard) = non_blocking(file_appender);
    let (non_blocking_stdout, console_guard) = non_blocking(std::io::stdout());

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let console_layer = fmt::layer()
        .with_writer(non_blocking_stdout)
        .with_ansi(true)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false);

    // RUST_LOG wins over the default
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    info!(
        "Logging initialized - logs will be written to {}/{service_name}.log",
        log_dir.display()
    );
    match rotated {
        Ok(Some(backup)) => info!("Previous log file backed up to: {}", backup.display()),
        Ok(None) => {}
        Err(e) => tracing::warn!("Could not rotate previous log file: {e}"),
    }

    Ok(LoggingGuards {
        _file: file_guard,
        _console: console_guard,
    })
}

/// Appends to `<service>.log` itself; rotation only happens on startup.
pub fn log_file_appender(log_dir: &Path, service_name: &str) -> RollingFileAppender {
    rolling::never(log_dir, format!("{service_name}.log"))
}

/// Moves an existing `<service>.log` aside with a timestamp suffix.
pub fn rotate_logs_on_startup(
    log_dir: &Path,
    service_name: &str,
) -> anyhow::Result<Option<std::path::PathBuf>> {
    let log_path = log_dir.join(format!("{service_name}.log"));
    if !log_path.exists() {
        return Ok(None);
    }

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let backup = log_dir.join(format!("{service_name}.{timestamp}.log"));
    std::fs::rename(&log_path, &backup)?;
    Ok(Some(backup))
}
