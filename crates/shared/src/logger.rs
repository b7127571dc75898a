use std::{fs::create_dir_all, io, path::Path};

use thiserror::Error;
use tracing::{Level, subscriber::set_global_default};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{filter::Targets, fmt, layer::SubscriberExt, registry};

/// Log files kept before the oldest is deleted, one per day.
const MAX_LOG_FILES: usize = 90;

/// Install the global logger.
///
/// Lines go to stdout and to `<directory>/<file_prefix>.<date>.log`. The returned guards
/// flush the writers when dropped and must be held until the process exits.
pub fn init_logger(directory: &Path, file_prefix: &str) -> Result<Vec<WorkerGuard>, LoggerError> {
    create_dir_all(directory)
        .map_err(|e| LoggerError::CreateDirectory(directory.display().to_string(), e))?;

    let appender = RollingFileAppender::builder()
        .filename_prefix(file_prefix)
        .filename_suffix("log")
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .build(directory)?;

    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(io::stdout());

    let subscriber = registry()
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .with(
            fmt::layer()
                .with_writer(stdout_writer)
                .with_ansi(true)
                .with_target(false),
        )
        .with(Targets::new().with_default(Level::INFO));

    set_global_default(subscriber)?;

    Ok(vec![file_guard, stdout_guard])
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to create log directory {0}:\n{1}")]
    CreateDirectory(String, #[source] io::Error),

    #[error("Failed to create the log file appender:\n{0}")]
    CreateRollingAppender(#[from] tracing_appender::rolling::InitError),

    #[error("A global logger is already installed:\n{0}")]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}
