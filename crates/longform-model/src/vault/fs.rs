//! Filesystem-backed vault

use super::{Vault, VaultEntry, VaultError};
use crate::path::VaultPath;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Vault rooted at a directory on disk
///
/// Hidden entries (names starting with `.`) are not listed, so host
/// configuration folders never look like content.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Create vault rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute filesystem path of a vault path
    #[must_use]
    pub fn resolve(&self, path: &VaultPath) -> PathBuf {
        let mut out = self.root.clone();
        for segment in path.segments() {
            out.push(segment);
        }
        out
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn read(&self, path: &VaultPath) -> Result<String, VaultError> {
        tokio::fs::read_to_string(self.resolve(path))
            .await
            .map_err(|e| VaultError::io_error(path, e))
    }

    async fn write(&self, path: &VaultPath, content: &str) -> Result<(), VaultError> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VaultError::io_error(path, e))?;
        }
        tokio::fs::write(&target, content)
            .await
            .map_err(|e| VaultError::io_error(path, e))
    }

    async fn exists(&self, path: &VaultPath) -> bool {
        tokio::fs::try_exists(self.resolve(path))
            .await
            .unwrap_or(false)
    }

    async fn is_dir(&self, path: &VaultPath) -> bool {
        tokio::fs::metadata(self.resolve(path))
            .await
            .is_ok_and(|m| m.is_dir())
    }

    async fn list(&self, dir: &VaultPath) -> Result<Vec<VaultEntry>, VaultError> {
        let mut reader = tokio::fs::read_dir(self.resolve(dir))
            .await
            .map_err(|e| VaultError::io_error(dir, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| VaultError::io_error(dir, e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                tracing::debug!(dir = %dir, "skipping non-utf8 entry");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let path = dir.child(name)?;
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| VaultError::io_error(&path, e))?;
            if file_type.is_dir() {
                entries.push(VaultEntry::folder(path));
            } else if file_type.is_file() {
                entries.push(VaultEntry::file(path));
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
