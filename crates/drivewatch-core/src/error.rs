/// Error types for the watcher engine.
///
/// None of these ever terminate the process. Action errors abort at most
/// the current pass, counter errors degrade to a default value, and config
/// errors are surfaced once at startup.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of one step of a volume pass.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("failed to create folder {path}: {source}")]
    FolderCreateFailed { path: PathBuf, source: io::Error },

    #[error("failed to delete folder {path}: {source}")]
    FolderDeleteFailed { path: PathBuf, source: io::Error },

    #[error("failed to write file {path}: {source}")]
    FileWriteFailed { path: PathBuf, source: io::Error },

    #[error("failed to list volume contents {path}: {source}")]
    WipeListFailed { path: PathBuf, source: io::Error },

    #[error("failed to delete {path}: {source}")]
    WipeEntryFailed { path: PathBuf, source: io::Error },

    /// Operator input ended or the exit signal fired while a step waited
    /// for confirmation.
    #[error("pass interrupted while waiting for operator input")]
    Interrupted,
}

impl ActionError {
    /// Whether this error aborts the remaining steps of the pass.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FolderCreateFailed { .. }
                | Self::FolderDeleteFailed { .. }
                | Self::WipeListFailed { .. }
                | Self::Interrupted
        )
    }
}

/// Counter persistence failure. Never reaches callers of the store.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("failed to read counter {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("counter {path} does not hold a number: {content:?}")]
    Parse { path: PathBuf, content: String },

    #[error("failed to write counter {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config {path}: {field} {reason}")]
    Invalid {
        path: PathBuf,
        field: &'static str,
        reason: String,
    },
}
