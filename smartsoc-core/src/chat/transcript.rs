//! Persisted chat transcript.
//!
//! The transcript is an ordered JSON array of `{role, content}` turns. Storage
//! problems never surface to the user: unreadable or corrupt data loads as an
//! empty history and failed writes are logged.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StorageError;

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::System => write!(f, "system"),
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// File-backed transcript storage.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    path: PathBuf,
}

impl TranscriptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the transcript, treating a missing file as empty.
    pub fn try_load(&self) -> Result<Vec<ChatTurn>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    message: e.to_string(),
                });
            }
        };
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Read the transcript. Any failure is logged and yields an empty history.
    pub fn load(&self) -> Vec<ChatTurn> {
        match self.try_load() {
            Ok(turns) => {
                debug!(path = %self.path.display(), turns = turns.len(), "Loaded chat transcript");
                turns
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable chat transcript");
                Vec::new()
            }
        }
    }

    /// Replace the stored transcript. The new contents land in a sibling
    /// `.tmp` file first and are renamed over the old one.
    pub fn save(&self, turns: &[ChatTurn]) -> Result<(), StorageError> {
        self.write_atomic(turns).map_err(|e| StorageError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn write_atomic(&self, turns: &[ChatTurn]) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(turns).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("tmp");
        std::fs::write(&staging, json)?;
        std::fs::rename(&staging, &self.path)
    }

    /// Save, logging instead of returning failures.
    pub fn save_or_log(&self, turns: &[ChatTurn]) {
        if let Err(e) = self.save(turns) {
            warn!(error = %e, "Failed to save chat transcript");
        }
    }
}
