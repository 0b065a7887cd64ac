//! In-memory vault
//!
//! Folders are implicit: a folder exists while some file lies beneath it.
//! Mutators outside the [`Vault`] trait return the [`VaultEvent`] a host
//! would deliver for the same change, so tests can replay them.

use super::{Vault, VaultEntry, VaultError, VaultEvent};
use crate::path::VaultPath;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Inner {
    files: RwLock<BTreeMap<VaultPath, String>>,
    writes: AtomicUsize,
}

/// Vault backed by a shared map of file contents
#[derive(Debug, Clone, Default)]
pub struct MemoryVault {
    inner: Arc<Inner>,
}

impl MemoryVault {
    /// Create empty vault
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file, returning the matching event
    pub fn insert(&self, path: VaultPath, content: impl Into<String>) -> VaultEvent {
        let previous = self.inner.files.write().insert(path.clone(), content.into());
        if previous.is_some() {
            VaultEvent::Modified(path)
        } else {
            VaultEvent::Created(path)
        }
    }

    /// Remove a file or a whole folder
    ///
    /// Returns `None` when nothing was removed.
    pub fn remove(&self, path: &VaultPath) -> Option<VaultEvent> {
        let mut files = self.inner.files.write();
        let before = files.len();
        files.retain(|p, _| !p.starts_with(path));
        (files.len() != before).then(|| VaultEvent::Deleted(path.clone()))
    }

    /// Move a file or a whole folder
    ///
    /// Returns `None` when `from` does not exist.
    pub fn rename(&self, from: &VaultPath, to: &VaultPath) -> Option<VaultEvent> {
        let mut files = self.inner.files.write();
        let moved: Vec<VaultPath> = files
            .keys()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        if moved.is_empty() {
            return None;
        }
        for old in moved {
            let Some(new) = old.rebase(from, to) else {
                continue;
            };
            if let Some(content) = files.remove(&old) {
                files.insert(new, content);
            }
        }
        Some(VaultEvent::Renamed {
            from: from.clone(),
            to: to.clone(),
        })
    }

    /// Content of a file, if present
    #[must_use]
    pub fn get(&self, path: &VaultPath) -> Option<String> {
        self.inner.files.read().get(path).cloned()
    }

    /// All file paths
    #[must_use]
    pub fn files(&self) -> Vec<VaultPath> {
        self.inner.files.read().keys().cloned().collect()
    }

    /// Number of writes made through [`Vault::write`]
    #[inline]
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Vault for MemoryVault {
    async fn read(&self, path: &VaultPath) -> Result<String, VaultError> {
        self.get(path).ok_or_else(|| VaultError::NotFound(path.clone()))
    }

    async fn write(&self, path: &VaultPath, content: &str) -> Result<(), VaultError> {
        if path.is_root() || self.is_dir(path).await {
            return Err(VaultError::WrongKind {
                path: path.clone(),
                expected: "file",
            });
        }
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        self.inner
            .files
            .write()
            .insert(path.clone(), content.to_string());
        Ok(())
    }

    async fn exists(&self, path: &VaultPath) -> bool {
        self.inner.files.read().contains_key(path) || self.is_dir(path).await
    }

    async fn is_dir(&self, path: &VaultPath) -> bool {
        self.inner
            .files
            .read()
            .keys()
            .any(|p| path.is_ancestor_of(p))
    }

    async fn list(&self, dir: &VaultPath) -> Result<Vec<VaultEntry>, VaultError> {
        let files = self.inner.files.read();
        if files.contains_key(dir) {
            return Err(VaultError::WrongKind {
                path: dir.clone(),
                expected: "folder",
            });
        }

        let mut file_entries = BTreeSet::new();
        let mut folder_entries = BTreeSet::new();
        for path in files.keys().filter(|p| dir.is_ancestor_of(p)) {
            let Ok(relative) = path.relative_to(dir) else {
                continue;
            };
            match relative.split_once('/') {
                None => {
                    file_entries.insert(path.clone());
                }
                Some((first, _)) => {
                    folder_entries.insert(dir.child(first)?);
                }
            }
        }

        if file_entries.is_empty() && folder_entries.is_empty() && !dir.is_root() {
            return Err(VaultError::NotFound(dir.clone()));
        }

        let mut entries: Vec<VaultEntry> = file_entries
            .into_iter()
            .map(VaultEntry::file)
            .chain(folder_entries.into_iter().map(VaultEntry::folder))
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
