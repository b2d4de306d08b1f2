//! Optional exchange log.
//!
//! One [`LogRecord`] per answered query, written once and never read back
//! by the relay. Whether a store exists at all is decided once at startup
//! (`Config::log_store_enabled`); the relay holds an `Option<LogStore>`.
//!
//! Writes are best-effort: callers log failures and move on.

pub mod memory;
pub mod rest;
#[cfg(feature = "logstore-sqlite")]
pub mod sqlite;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{LogStoreBackend, LogStoreConfig};

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("log store backend unavailable: {0}")]
    Unavailable(String),
    #[error("invalid table name: {0}")]
    InvalidTable(String),
    #[error("log store write failed: {0}")]
    Write(String),
}

// ── Record ────────────────────────────────────────────────────────────────────

/// One persisted exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// RFC 3339 UTC, second precision.
    pub timestamp: String,
    pub query: String,
    pub response: String,
    /// The formatted search context block the answer was grounded on.
    pub context: String,
}

impl LogRecord {
    pub fn now(query: &str, response: &str, context: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            query: query.to_string(),
            response: response.to_string(),
            context: context.to_string(),
        }
    }
}

// ── Store enum ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum LogStore {
    #[cfg(feature = "logstore-sqlite")]
    Sqlite(sqlite::SqliteLogStore),
    Rest(rest::RestLogStore),
    Memory(memory::MemoryLogStore),
}

impl LogStore {
    pub async fn insert(&self, record: LogRecord) -> Result<(), LogStoreError> {
        match self {
            #[cfg(feature = "logstore-sqlite")]
            LogStore::Sqlite(s) => s.insert(record).await,
            LogStore::Rest(s) => s.insert(&record).await,
            LogStore::Memory(s) => s.insert(record),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "logstore-sqlite")]
            LogStore::Sqlite(_) => "sqlite",
            LogStore::Rest(_) => "rest",
            LogStore::Memory(_) => "memory",
        }
    }
}

/// Build the configured store, or `None` when logging is disabled.
pub fn build(
    config: &LogStoreConfig,
    enabled: bool,
    api_key: Option<String>,
) -> Result<Option<LogStore>, LogStoreError> {
    if !enabled {
        return Ok(None);
    }
    validate_table(&config.table)?;

    match config.backend {
        LogStoreBackend::None => Ok(None),
        #[cfg(feature = "logstore-sqlite")]
        LogStoreBackend::Sqlite => Ok(Some(LogStore::Sqlite(sqlite::SqliteLogStore::open(
            &config.path,
            &config.table,
        )?))),
        #[cfg(not(feature = "logstore-sqlite"))]
        LogStoreBackend::Sqlite => Err(LogStoreError::Unavailable(
            "built without the `logstore-sqlite` feature".into(),
        )),
        LogStoreBackend::Rest => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| LogStoreError::Unavailable("[log_store].url is not set".into()))?;
            let key = api_key
                .ok_or_else(|| LogStoreError::Unavailable("LOG_STORE_KEY is not set".into()))?;
            Ok(Some(LogStore::Rest(rest::RestLogStore::new(
                url,
                &config.table,
                key,
                config.timeout_seconds,
            )?)))
        }
    }
}

/// Table names are interpolated into SQL and URLs; keep them to `[A-Za-z0-9_]`.
fn validate_table(table: &str) -> Result<(), LogStoreError> {
    let ok = !table.is_empty() && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok { Ok(()) } else { Err(LogStoreError::InvalidTable(table.to_string())) }
}
