//! Scene content cache using moka

use longform_model::{Vault, VaultError, VaultPath};
use moka::future::Cache;
use std::sync::Arc;

/// Default number of cached notes
pub const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Lazily loaded note contents keyed by path
#[derive(Debug, Clone)]
pub struct SceneCache {
    inner: Cache<VaultPath, Arc<str>>,
}

impl SceneCache {
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Get content, reading it from the vault on a miss
    ///
    /// # Errors
    /// Returns the vault error when the note cannot be read
    pub async fn load<V: Vault + ?Sized>(
        &self,
        vault: &V,
        path: &VaultPath,
    ) -> Result<Arc<str>, VaultError> {
        if let Some(cached) = self.inner.get(path).await {
            return Ok(cached);
        }

        let content: Arc<str> = Arc::from(vault.read(path).await?);
        self.inner.insert(path.clone(), Arc::clone(&content)).await;
        Ok(content)
    }

    /// Invalidate cache entry
    #[inline]
    pub async fn invalidate(&self, path: &VaultPath) {
        self.inner.invalidate(path).await;
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Check if cache holds a path
    #[inline]
    #[must_use]
    pub async fn contains(&self, path: &VaultPath) -> bool {
        self.inner.get(path).await.is_some()
    }
}

impl Default for SceneCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use longform_model::MemoryVault;

    #[tokio::test]
    async fn load_caches_until_invalidated() {
        let vault = MemoryVault::new();
        let path = VaultPath::new("Novel/A.md").unwrap();
        vault.insert(path.clone(), "first");

        let cache = SceneCache::default();
        assert_eq!(&*cache.load(&vault, &path).await.unwrap(), "first");
        assert!(cache.contains(&path).await);

        vault.insert(path.clone(), "second");
        assert_eq!(&*cache.load(&vault, &path).await.unwrap(), "first");

        cache.invalidate(&path).await;
        assert_eq!(&*cache.load(&vault, &path).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn missing_note_is_not_cached() {
        let vault = MemoryVault::new();
        let path = VaultPath::new("gone.md").unwrap();
        let cache = SceneCache::default();
        assert!(cache.load(&vault, &path).await.unwrap_err().is_not_found());
        assert!(!cache.contains(&path).await);
    }
}
