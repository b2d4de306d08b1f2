//! Transcript persistence.
//!
//! The whole transcript is stored as one JSON array under a fixed key (a
//! file for the terminal client). Stores are synchronous; transcripts are
//! small and written after every mutation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::AppError;

use super::message::Message;

/// Pluggable transcript backend.
pub trait TranscriptStore: Send + Sync {
    /// `Ok(None)` when nothing was ever stored; `Err` when stored data is
    /// unreadable or malformed.
    fn load(&self) -> Result<Option<Vec<Message>>, AppError>;

    fn save(&self, transcript: &[Message]) -> Result<(), AppError>;
}

fn decode(raw: &str, origin: &str) -> Result<Vec<Message>, AppError> {
    serde_json::from_str(raw).map_err(|e| AppError::Client(format!("malformed {origin}: {e}")))
}

fn encode(transcript: &[Message]) -> Result<String, AppError> {
    serde_json::to_string_pretty(transcript)
        .map_err(|e| AppError::Client(format!("serialise transcript: {e}")))
}

// ── File ──────────────────────────────────────────────────────────────────────

/// JSON file store, e.g. `~/.symptom-relay/chat-history.json`.
#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    path: PathBuf,
}

impl FileTranscriptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranscriptStore for FileTranscriptStore {
    fn load(&self) -> Result<Option<Vec<Message>>, AppError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Client(format!("cannot read {}: {e}", self.path.display())));
            }
        };
        decode(&raw, &self.path.display().to_string()).map(Some)
    }

    fn save(&self, transcript: &[Message]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = encode(transcript)?;
        fs::write(&self.path, data)
            .map_err(|e| AppError::Client(format!("cannot write {}: {e}", self.path.display())))
    }
}

// ── Memory ────────────────────────────────────────────────────────────────────

/// In-process store holding the serialised JSON, so loads still go through
/// the same decode path as the file store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryTranscriptStore {
    raw: Arc<Mutex<Option<String>>>,
    saves: Arc<Mutex<usize>>,
    fail_saves: bool,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed with arbitrary (possibly corrupt) stored text.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let store = Self::default();
        if let Ok(mut slot) = store.raw.lock() {
            *slot = Some(raw.into());
        }
        store
    }

    /// Every `save` fails, as a full or read-only disk would.
    pub fn failing() -> Self {
        Self { fail_saves: true, ..Self::default() }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|r| r.clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

impl TranscriptStore for MemoryTranscriptStore {
    fn load(&self) -> Result<Option<Vec<Message>>, AppError> {
        match self.raw() {
            None => Ok(None),
            Some(raw) => decode(&raw, "stored transcript").map(Some),
        }
    }

    fn save(&self, transcript: &[Message]) -> Result<(), AppError> {
        if self.fail_saves {
            return Err(AppError::Client("storage unavailable".into()));
        }
        let data = encode(transcript)?;
        let mut slot = self
            .raw
            .lock()
            .map_err(|_| AppError::Client("transcript store poisoned".into()))?;
        *slot = Some(data);
        if let Ok(mut n) = self.saves.lock() {
            *n += 1;
        }
        Ok(())
    }
}
