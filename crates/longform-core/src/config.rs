//! Runtime configuration

use longform_sync::DEFAULT_CACHE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default persistence debounce window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 3_000;

/// Longform configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongformConfig {
    /// Script folder overriding the persisted setting
    pub user_script_folder: Option<String>,
    /// Quiet period before settings are written
    pub debounce_ms: u64,
    /// Maximum number of cached scene notes
    pub cache_capacity: u64,
    /// Install shipped workflows missing from settings
    pub install_default_workflows: bool,
}

impl LongformConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With script folder override
    #[inline]
    #[must_use]
    pub fn with_user_script_folder(mut self, folder: impl Into<String>) -> Self {
        self.user_script_folder = Some(folder.into());
        self
    }

    /// With debounce window
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// With or without shipped workflows
    #[inline]
    #[must_use]
    pub fn with_default_workflows(mut self, install: bool) -> Self {
        self.install_default_workflows = install;
        self
    }

    /// Debounce window
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for LongformConfig {
    fn default() -> Self {
        Self {
            user_script_folder: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            install_default_workflows: true,
        }
    }
}
