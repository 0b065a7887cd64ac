//! Longform Sync
//!
//! Keeps the in-memory draft model consistent with a vault that other
//! programs mutate underneath it.
//!
//! # Core Concepts
//!
//! - [`VaultSync`]: Single writer that applies vault events to the model
//! - [`cross_reference`]: Reconciles a declared scene order with present files
//! - [`ModelReader`]: Read-only subscriber to committed models
//! - [`SceneCache`]: Moka-backed cache of scene contents
//!
//! # Example
//!
//! ```rust,ignore
//! use longform_sync::{SceneCache, VaultSync};
//!
//! let mut sync = VaultSync::new(vault, SceneCache::default());
//! sync.discover_drafts().await?;
//! let reader = sync.reader();
//!
//! sync.handle(&event).await?;
//! for draft in reader.current().list() {
//!     println!("{}", draft.title);
//! }
//! ```

#![warn(unreachable_pub)]

mod cache;
mod engine;
mod error;
mod reconcile;
mod view;

pub use cache::{SceneCache, DEFAULT_CACHE_CAPACITY};
pub use engine::VaultSync;
pub use error::SyncError;
pub use reconcile::{cross_reference, Inconsistency, Reconciled};
pub use view::{DraftSet, ModelReader};
