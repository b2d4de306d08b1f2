//! SQLite log store — one row per exchange in a local database file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, params};

use super::{LogRecord, LogStoreError};

#[derive(Debug, Clone)]
pub struct SqliteLogStore {
    db_path: PathBuf,
    table: String,
}

impl SqliteLogStore {
    /// Create the database file and table if needed.
    /// `table` must already be validated by the caller.
    pub fn open(db_path: &Path, table: &str) -> Result<Self, LogStoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LogStoreError::Unavailable(format!("create {}: {e}", parent.display()))
            })?;
        }
        let store = Self { db_path: db_path.to_path_buf(), table: table.to_string() };
        let conn = store.open_conn()?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                query TEXT NOT NULL,
                response TEXT NOT NULL,
                context TEXT NOT NULL
            );",
            store.table
        ))
        .map_err(|e| LogStoreError::Unavailable(format!("initialize schema: {e}")))?;
        Ok(store)
    }

    fn open_conn(&self) -> Result<Connection, LogStoreError> {
        let conn = Connection::open(&self.db_path).map_err(|e| {
            LogStoreError::Unavailable(format!("open {}: {e}", self.db_path.display()))
        })?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| LogStoreError::Unavailable(format!("set busy_timeout: {e}")))?;
        Ok(conn)
    }

    /// Blocking SQLite I/O runs on the blocking pool.
    pub async fn insert(&self, record: LogRecord) -> Result<(), LogStoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = store.open_conn()?;
            conn.execute(
                &format!(
                    "INSERT INTO {} (timestamp, query, response, context) VALUES (?1, ?2, ?3, ?4)",
                    store.table
                ),
                params![record.timestamp, record.query, record.response, record.context],
            )
            .map_err(|e| LogStoreError::Write(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| LogStoreError::Write(format!("insert task failed: {e}")))?
    }

    #[cfg(test)]
    fn count(&self) -> i64 {
        let conn = self.open_conn().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |r| r.get(0))
            .unwrap()
    }
}
