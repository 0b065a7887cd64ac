//! Content hashing
//!
//! [`ContentHash`] tells whether a file's content changed since it was last
//! evaluated.

use std::fmt::{self, Display, Formatter};

/// Blake3 digest of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(blake3::Hash);

impl ContentHash {
    /// Hash a text document
    #[inline]
    #[must_use]
    pub fn of_text(text: &str) -> Self {
        Self(blake3::hash(text.as_bytes()))
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let hex = self.0.to_hex();
        f.write_str(&hex.as_str()[..16])
    }
}
