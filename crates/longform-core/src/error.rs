//! Error types for the application object

use longform_compile::{CompileError, WorkflowError};
use longform_model::VaultPath;
use longform_sync::SyncError;
use std::path::PathBuf;
use thiserror::Error;

/// Settings store failure
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O failed
    #[error("settings io error at {}: {source}", .path.display())]
    Io {
        /// Settings file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Settings are not valid JSON
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),

    /// Store refused the operation
    #[error("settings store unavailable: {0}")]
    Unavailable(String),

    /// Persistence task is no longer running
    #[error("persistence task stopped")]
    Stopped,
}

/// Errors from the host-facing API
#[derive(Debug, Error)]
pub enum LongformError {
    /// Settings could not be loaded or saved
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Synchronization failure
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Workflow edit rejected
    #[error("workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Workflow run failed
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// No draft with this index note
    #[error("unknown draft: {0}")]
    UnknownDraft(VaultPath),
}
