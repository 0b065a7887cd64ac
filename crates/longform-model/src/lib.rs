//! Longform Model
//!
//! Vault paths, drafts, scenes and the document store they live in.
//!
//! # Core Concepts
//!
//! - [`VaultPath`]: Normalized path relative to the vault root
//! - [`Draft`]: A writing project rooted at an index note
//! - [`Vault`]: Async file I/O against the document store
//! - [`VaultEvent`]: Change notification delivered by the host
//! - [`ContentHash`]: Blake3 digest used to detect content changes
//!
//! # Example
//!
//! ```rust,ignore
//! use longform_model::{frontmatter, MemoryVault, VaultPath};
//!
//! let vault = MemoryVault::new();
//! let index = VaultPath::new("Novel/Index.md")?;
//! vault.insert(index.clone(), "---\nlongform:\n  format: scenes\n---\n");
//!
//! let draft = frontmatter::read_draft(&index, &vault.read(&index).await?)?;
//! ```

#![warn(unreachable_pub)]

mod draft;
mod hash;
mod path;
mod vault;

pub mod frontmatter;

pub use draft::{
    join_scenes, wildcard_match, Draft, DraftFormat, DraftSnapshot, Scene, SceneEntry, SceneText,
    SAME_FOLDER, SCENE_SEPARATOR,
};
pub use frontmatter::FrontmatterError;
pub use hash::ContentHash;
pub use path::{PathError, VaultPath, MARKDOWN_EXTENSION};
pub use vault::{EntryKind, FsVault, MemoryVault, Vault, VaultEntry, VaultError, VaultEvent};
