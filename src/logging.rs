use anyhow::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub fn get_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("issuedeck").join("logs"))
}

/// Route tracing output to a daily log file; the terminal belongs to the UI.
///
/// `RUST_LOG` wins over `default_level`. Keep the returned guard alive for the
/// life of the process or buffered lines are lost.
pub fn init_logging(default_level: &str) -> Result<WorkerGuard> {
    let log_dir = get_log_dir().ok_or_else(|| anyhow::anyhow!("Could not determine log dir"))?;
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::daily(&log_dir, "issuedeck.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(guard)
}
