//! Longform Core
//!
//! The application object hosts embed: it loads settings, discovers drafts,
//! loads user scripts, routes vault notifications and compiles drafts.
//!
//! # Core Concepts
//!
//! - [`Longform`]: Process-scoped owner of the model, registry and workflows
//! - [`SettingsStore`]: Durable home of [`PersistedSettings`]
//! - [`PersistenceStatus`]: Outcome of debounced settings writes
//! - [`LongformConfig`]: Runtime knobs (debounce window, cache size, ...)
//!
//! # Example
//!
//! ```rust,ignore
//! use longform_core::{JsonFileSettingsStore, Longform, LongformConfig};
//! use longform_model::FsVault;
//!
//! let vault = Arc::new(FsVault::new("/path/to/vault"));
//! let store = JsonFileSettingsStore::new("/path/to/vault/.longform/settings.json");
//! let mut longform = Longform::load(vault, store, LongformConfig::default()).await?;
//!
//! for draft in longform.list_drafts() {
//!     let name = longform.workflow_name_for(&draft);
//!     let artifact = longform.run_workflow(&name, &draft.vault_path).await?;
//!     println!("{}", artifact.text);
//! }
//! ```

#![warn(unreachable_pub)]

mod config;
mod error;
mod longform;
mod persist;
mod settings;

pub use config::{LongformConfig, DEFAULT_DEBOUNCE_MS};
pub use error::{LongformError, PersistenceError};
pub use longform::Longform;
pub use persist::PersistenceStatus;
pub use settings::{
    JsonFileSettingsStore, MemorySettingsStore, PersistedDraft, PersistedSettings, SettingsStore,
};
