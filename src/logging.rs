//! Tracing subscriber setup: console output plus an optional daily log file

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    Initialization(String),

    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),
}

/// `RUST_LOG` wins; otherwise the configured level for this crate and
/// debug for HTTP traces
fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = format!("library_catalog={},tower_http=debug", config.level);
    EnvFilter::try_new(&directives)
        .map_err(|e| LoggingError::InvalidLevel(format!("{}: {}", config.level, e)))
}

/// Install the global subscriber. Keep the returned guard alive for the
/// life of the process so buffered file output gets flushed.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = env_filter(config)?;

    let console_layer = if config.format.eq_ignore_ascii_case("json") {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            std::fs::create_dir_all(directory)?;

            let file_name = path
                .file_name()
                .ok_or_else(|| LoggingError::Initialization("Invalid log file path".to_string()))?;
            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Initialization(e.to_string()))?;

    Ok(guard)
}
