//! Document store abstraction
//!
//! The [`Vault`] trait is the only way the rest of the workspace touches
//! files. Change notifications arrive separately as [`VaultEvent`]s, delivered
//! by whatever host owns the store.

use crate::path::{PathError, VaultPath};
use async_trait::async_trait;

mod fs;
mod memory;

pub use fs::FsVault;
pub use memory::MemoryVault;

/// Kind of a vault entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Folder
    Folder,
}

/// Immediate child of a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEntry {
    /// Entry path
    pub path: VaultPath,
    /// File or folder
    pub kind: EntryKind,
}

impl VaultEntry {
    /// File entry
    #[inline]
    #[must_use]
    pub fn file(path: VaultPath) -> Self {
        Self {
            path,
            kind: EntryKind::File,
        }
    }

    /// Folder entry
    #[inline]
    #[must_use]
    pub fn folder(path: VaultPath) -> Self {
        Self {
            path,
            kind: EntryKind::Folder,
        }
    }

    /// Check for a file entry
    #[inline]
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Errors from the document store
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Path does not exist
    #[error("not found: {0}")]
    NotFound(VaultPath),

    /// Path exists but has the wrong kind
    #[error("not a {expected}: {path}")]
    WrongKind {
        path: VaultPath,
        expected: &'static str,
    },

    /// Path could not be represented
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// IO error
    #[error("io error at {path}: {source}")]
    Io {
        path: VaultPath,
        #[source]
        source: std::io::Error,
    },
}

impl VaultError {
    /// Create IO error for path
    pub fn io_error(path: &VaultPath, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::NotFound(path.clone());
        }
        Self::Io {
            path: path.clone(),
            source,
        }
    }

    /// Check for a missing path
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// File I/O against the document store
#[async_trait]
pub trait Vault: Send + Sync + 'static {
    /// Read a file as UTF-8 text
    async fn read(&self, path: &VaultPath) -> Result<String, VaultError>;

    /// Create or replace a file, creating parent folders as needed
    async fn write(&self, path: &VaultPath, content: &str) -> Result<(), VaultError>;

    /// Check whether a file or folder exists
    async fn exists(&self, path: &VaultPath) -> bool;

    /// Check whether a folder exists
    async fn is_dir(&self, path: &VaultPath) -> bool;

    /// Immediate children of a folder, sorted by path
    async fn list(&self, dir: &VaultPath) -> Result<Vec<VaultEntry>, VaultError>;

    /// All files beneath a folder, sorted by path
    async fn walk(&self, dir: &VaultPath) -> Result<Vec<VaultPath>, VaultError> {
        let mut files = Vec::new();
        let mut pending = vec![dir.clone()];
        while let Some(next) = pending.pop() {
            for entry in self.list(&next).await? {
                match entry.kind {
                    EntryKind::File => files.push(entry.path),
                    EntryKind::Folder => pending.push(entry.path),
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Change notification from the document store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VaultEvent {
    /// A file or folder appeared
    Created(VaultPath),
    /// A file's content changed
    Modified(VaultPath),
    /// A file or folder disappeared
    Deleted(VaultPath),
    /// A file or folder moved
    Renamed {
        /// Previous path
        from: VaultPath,
        /// New path
        to: VaultPath,
    },
    /// The host re-parsed a note's metadata
    MetadataChanged(VaultPath),
}

impl VaultEvent {
    /// Every path the event mentions
    #[must_use]
    pub fn paths(&self) -> Vec<&VaultPath> {
        match self {
            Self::Created(p) | Self::Modified(p) | Self::Deleted(p) | Self::MetadataChanged(p) => {
                vec![p]
            }
            Self::Renamed { from, to } => vec![from, to],
        }
    }

    /// Short name for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Modified(_) => "modified",
            Self::Deleted(_) => "deleted",
            Self::Renamed { .. } => "renamed",
            Self::MetadataChanged(_) => "metadata-changed",
        }
    }

    /// Check if the event reports a content change
    #[inline]
    #[must_use]
    pub fn is_content_change(&self) -> bool {
        matches!(self, Self::Modified(_) | Self::MetadataChanged(_))
    }
}
