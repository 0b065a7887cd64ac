//! Error types for vault synchronization

use longform_model::{FrontmatterError, PathError, VaultError, VaultPath};
use std::sync::Arc;
use thiserror::Error;

/// Errors from the synchronization engine
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// Document store failure
    #[error("vault error: {0}")]
    Vault(Arc<VaultError>),

    /// Index note frontmatter could not be rewritten
    #[error("frontmatter error in {path}: {message}")]
    Frontmatter {
        /// Index note
        path: VaultPath,
        /// Codec message
        message: String,
    },

    /// Scene folder setting is not a valid path
    #[error("invalid scene folder: {0}")]
    Path(#[from] PathError),

    /// No draft with this index note
    #[error("unknown draft: {0}")]
    UnknownDraft(VaultPath),
}

impl SyncError {
    /// Create frontmatter error
    pub fn frontmatter(path: &VaultPath, source: &FrontmatterError) -> Self {
        Self::Frontmatter {
            path: path.clone(),
            message: source.to_string(),
        }
    }
}

impl From<VaultError> for SyncError {
    fn from(e: VaultError) -> Self {
        Self::Vault(Arc::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let path = VaultPath::new("Novel/Index.md").unwrap();
        let err = SyncError::UnknownDraft(path.clone());
        assert_eq!(err.to_string(), "unknown draft: Novel/Index.md");

        let err: SyncError = VaultError::NotFound(path).into();
        assert_eq!(err.to_string(), "vault error: not found: Novel/Index.md");
    }
}
