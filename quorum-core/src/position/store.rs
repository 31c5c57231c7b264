//! Durable persistence for the position state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::position::PositionState;

/// Errors while persisting position state.
///
/// Loading never errors (see `StateStore::load`); these cover the save
/// path only.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("state write failed: {0}")]
    Io(#[from] io::Error),

    #[error("atomic rename failed: {0}")]
    Rename(io::Error),
}

/// Where the engine persists its position state, so we can swap the
/// file-backed store for an in-memory one in replays and tests.
///
/// `load` is infallible by contract: a missing or corrupt file yields
/// the default flat state rather than an error, because a bot that
/// cannot read its state file should still come up (and log why)
/// instead of staying down.
pub trait StateStore: Send {
    fn load(&self) -> PositionState;
    fn save(&mut self, state: &PositionState) -> Result<(), StateError>;
}

/// JSON file on disk, written atomically (write to .tmp then rename).
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> PositionState {
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(state) => state,
                Err(e) => {
                    warn!(
                        "state file {} is corrupt, starting flat: {}",
                        self.path.display(),
                        e
                    );
                    PositionState::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => PositionState::default(),
            Err(e) => {
                warn!(
                    "state file {} is unreadable, starting flat: {}",
                    self.path.display(),
                    e
                );
                PositionState::default()
            }
        }
    }

    fn save(&mut self, state: &PositionState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(state)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;

        // Atomic rename
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            // Clean up temp file on rename failure
            let _ = fs::remove_file(&tmp_path);
            StateError::Rename(e)
        })?;

        Ok(())
    }
}

/// Keeps state in memory only. Used by replays and tests where restart
/// durability is irrelevant.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: PositionState,
}

impl MemoryStateStore {
    pub fn new(state: PositionState) -> Self {
        Self { state }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> PositionState {
        self.state.clone()
    }

    fn save(&mut self, state: &PositionState) -> Result<(), StateError> {
        self.state = state.clone();
        Ok(())
    }
}
