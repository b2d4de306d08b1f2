//! In-process log store. Records are kept in a shared vector; clones share it.

use std::sync::{Arc, Mutex};

use super::{LogRecord, LogStoreError};

#[derive(Debug, Clone, Default)]
pub struct MemoryLogStore {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: LogRecord) -> Result<(), LogStoreError> {
        self.records
            .lock()
            .map_err(|_| LogStoreError::Write("memory log store poisoned".into()))?
            .push(record);
        Ok(())
    }

    /// Snapshot of everything written so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}
