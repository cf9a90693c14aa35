//! Remembering the last submitted inputs between sessions.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The inputs of the last loan the user started processing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastInput {
    #[serde(rename = "lastAmount")]
    pub amount: f64,
    /// Days.
    #[serde(rename = "lastPeriod")]
    pub duration: u32,
}

pub trait InputStore: Send + Sync {
    fn save_last_input(&self, input: LastInput) -> Result<(), PersistError>;

    /// `Ok(None)` if nothing was saved yet.
    fn load_last_input(&self) -> Result<Option<LastInput>, PersistError>;
}

/// An [InputStore] which forgets everything when dropped.
#[derive(Debug, Default)]
pub struct MemoryInputStore {
    last: Mutex<Option<LastInput>>,
}

impl MemoryInputStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputStore for MemoryInputStore {
    fn save_last_input(&self, input: LastInput) -> Result<(), PersistError> {
        *self.last.lock() = Some(input);
        Ok(())
    }

    fn load_last_input(&self) -> Result<Option<LastInput>, PersistError> {
        Ok(*self.last.lock())
    }
}

/// An [InputStore] backed by a small JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileInputStore {
    path: PathBuf,
}

impl JsonFileInputStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileInputStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InputStore for JsonFileInputStore {
    fn save_last_input(&self, input: LastInput) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_vec_pretty(&input)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn load_last_input(&self) -> Result<Option<LastInput>, PersistError> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&content)?))
    }
}
