//! Tracing setup shared by the relay server and the chat client.
//!
//! The server logs to stderr. The chat client owns the terminal for its
//! transcript, so it hands [`init`] a log file instead.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::AppError;

/// Install the global subscriber.
///
/// `level` is the `log_level` from config (or `SYMPTOM_RELAY_LOG_LEVEL`).
/// With `prefer_level` the configured level wins and `RUST_LOG` only rescues
/// an unparsable one; without it `RUST_LOG` wins when set.
pub fn init(level: &str, prefer_level: bool, log_file: Option<&Path>) -> Result<(), AppError> {
    let filter = build_filter(level, prefer_level)?;
    let writer = match log_file {
        Some(path) => file_writer(path)?,
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

fn build_filter(level: &str, prefer_level: bool) -> Result<EnvFilter, AppError> {
    if !prefer_level {
        return EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")));
    }
    EnvFilter::try_new(level).or_else(|level_err| {
        EnvFilter::try_from_default_env().map_err(|env_err| {
            AppError::Logger(format!(
                "invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}"
            ))
        })
    })
}

/// Append-mode writer; the work dir may not exist on a first run.
fn file_writer(path: &Path) -> Result<BoxMakeWriter, AppError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| {
            AppError::Logger(format!("cannot create log dir '{}': {e}", dir.display()))
        })?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path).map_err(|e| {
        AppError::Logger(format!("failed to open log file '{}': {e}", path.display()))
    })?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}

/// Reject a configured `log_level` before any subscriber exists, so a typo
/// fails startup with a config-style message.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}
