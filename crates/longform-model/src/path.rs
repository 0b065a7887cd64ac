//! Vault paths
//!
//! Provides [`VaultPath`], a normalized `/`-separated path relative to the
//! vault root. The root itself is the empty path.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Markdown extension used by notes and scenes
pub const MARKDOWN_EXTENSION: &str = "md";

/// Path of a file or folder inside the vault
///
/// Always normalized: no leading or trailing `/`, no empty, `.` or `..`
/// segments. Ordering is byte-wise on the normalized string.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VaultPath(String);

impl VaultPath {
    /// Parse and normalize a path
    ///
    /// Leading and trailing slashes are ignored, so `/Novel/` and `Novel`
    /// name the same folder.
    ///
    /// # Errors
    /// Returns error on empty, `.` or `..` segments
    pub fn new(path: impl AsRef<str>) -> Result<Self, PathError> {
        let trimmed = path.as_ref().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        for segment in trimmed.split('/') {
            validate_segment(segment)?;
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The vault root
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalized string form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the vault root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over segments from root to leaf
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Parent folder (root for top-level entries, `None` for the root)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => Some(Self::root()),
        }
    }

    /// Last segment
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    /// File name without its extension
    #[must_use]
    pub fn stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => Some(name),
            Some(idx) => Some(&name[..idx]),
        }
    }

    /// Extension of the last segment, without the dot
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Check for a `.md` extension (case-insensitive)
    #[inline]
    #[must_use]
    pub fn is_markdown(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MARKDOWN_EXTENSION))
    }

    /// Append a single segment
    ///
    /// # Errors
    /// Returns error if the segment is empty, `.`/`..`, or contains `/`
    pub fn child(&self, segment: &str) -> Result<Self, PathError> {
        if segment.contains('/') {
            return Err(PathError::InvalidSegment(segment.to_string()));
        }
        validate_segment(segment)?;
        if self.is_root() {
            Ok(Self(segment.to_string()))
        } else {
            Ok(Self(format!("{}/{}", self.0, segment)))
        }
    }

    /// Resolve a relative path against this folder
    ///
    /// `.` segments are dropped and `..` steps up one folder. A leading `/`
    /// is treated as relative to `self`, matching how scene folders are
    /// written in index frontmatter.
    ///
    /// # Errors
    /// Returns error if `..` would escape the vault root
    pub fn join(&self, relative: &str) -> Result<Self, PathError> {
        let mut segments: Vec<&str> = self.segments().collect();
        for segment in relative.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PathError::EscapesRoot(relative.to_string()));
                    }
                }
                other => segments.push(other),
            }
        }
        Ok(Self(segments.join("/")))
    }

    /// Check if `self` is a strict ancestor folder of `other`
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes()[self.0.len()] == b'/'
    }

    /// Check if `self` equals `other` or lies beneath it
    #[inline]
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        self == other || other.is_ancestor_of(self)
    }

    /// Path relative to an ancestor folder
    ///
    /// # Errors
    /// Returns error if `self` does not lie beneath `ancestor`
    pub fn relative_to(&self, ancestor: &Self) -> Result<String, PathError> {
        if self == ancestor {
            return Ok(String::new());
        }
        if !ancestor.is_ancestor_of(self) {
            return Err(PathError::NotDescendant {
                path: self.to_string(),
                ancestor: ancestor.to_string(),
            });
        }
        if ancestor.is_root() {
            return Ok(self.0.clone());
        }
        Ok(self.0[ancestor.0.len() + 1..].to_string())
    }

    /// Move this path from beneath `from` to beneath `to`
    ///
    /// Returns `None` when `self` does not start with `from`.
    #[must_use]
    pub fn rebase(&self, from: &Self, to: &Self) -> Option<Self> {
        let relative = self.relative_to(from).ok()?;
        if relative.is_empty() {
            return Some(to.clone());
        }
        to.join(&relative).ok()
    }

    /// Lower-cased form used for case-insensitive comparisons
    #[inline]
    #[must_use]
    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }
}

fn validate_segment(segment: &str) -> Result<(), PathError> {
    match segment {
        "" => Err(PathError::EmptySegment),
        "." | ".." => Err(PathError::RelativeSegment(segment.to_string())),
        s if s.contains('\0') => Err(PathError::InvalidSegment(s.to_string())),
        _ => Ok(()),
    }
}

impl Display for VaultPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VaultPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for VaultPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for VaultPath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VaultPath> for String {
    fn from(path: VaultPath) -> Self {
        path.0
    }
}

impl AsRef<str> for VaultPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors related to vault paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path (`a//b`)
    #[error("path contains empty segment")]
    EmptySegment,

    /// `.` or `..` where a normalized path is required
    #[error("relative segment not allowed: {0}")]
    RelativeSegment(String),

    /// Invalid segment characters
    #[error("invalid segment: {0}")]
    InvalidSegment(String),

    /// `..` walked above the vault root
    #[error("path escapes vault root: {0}")]
    EscapesRoot(String),

    /// Not a descendant path
    #[error("path '{path}' is not beneath '{ancestor}'")]
    NotDescendant { path: String, ancestor: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> VaultPath {
        VaultPath::new(s).unwrap()
    }

    #[test]
    fn new_normalizes_slashes() {
        assert_eq!(p("/Novel/Index.md/").as_str(), "Novel/Index.md");
        assert!(p("/").is_root());
        assert!(p("").is_root());
    }

    #[test]
    fn new_rejects_bad_segments() {
        assert_eq!(VaultPath::new("a//b"), Err(PathError::EmptySegment));
        assert!(matches!(
            VaultPath::new("a/../b"),
            Err(PathError::RelativeSegment(_))
        ));
    }

    #[test]
    fn parent_and_names() {
        let path = p("Novel/Scenes/Opening.md");
        assert_eq!(path.parent(), Some(p("Novel/Scenes")));
        assert_eq!(path.file_name(), Some("Opening.md"));
        assert_eq!(path.stem(), Some("Opening"));
        assert_eq!(path.extension(), Some("md"));
        assert!(path.is_markdown());

        assert_eq!(p("Index.md").parent(), Some(VaultPath::root()));
        assert_eq!(VaultPath::root().parent(), None);
    }

    #[test]
    fn stem_keeps_dotfiles_and_inner_dots() {
        assert_eq!(p(".hidden").stem(), Some(".hidden"));
        assert_eq!(p(".hidden").extension(), None);
        assert_eq!(p("v1.2 draft.md").stem(), Some("v1.2 draft"));
    }

    #[test]
    fn join_resolves_relative_segments() {
        let base = p("Novel");
        assert_eq!(base.join("/").unwrap(), p("Novel"));
        assert_eq!(base.join("./Scenes").unwrap(), p("Novel/Scenes"));
        assert_eq!(base.join("../Other").unwrap(), p("Other"));
        assert!(matches!(
            base.join("../../x"),
            Err(PathError::EscapesRoot(_))
        ));
    }

    #[test]
    fn ancestry() {
        let folder = p("Novel");
        assert!(folder.is_ancestor_of(&p("Novel/A.md")));
        assert!(!folder.is_ancestor_of(&p("Novella/A.md")));
        assert!(!folder.is_ancestor_of(&folder));
        assert!(VaultPath::root().is_ancestor_of(&folder));
        assert!(folder.starts_with(&folder));
    }

    #[test]
    fn relative_and_rebase() {
        let path = p("Novel/Scenes/A.md");
        assert_eq!(path.relative_to(&p("Novel")).unwrap(), "Scenes/A.md");
        assert!(path.relative_to(&p("Other")).is_err());
        assert_eq!(
            path.rebase(&p("Novel"), &p("Books/Novel")),
            Some(p("Books/Novel/Scenes/A.md"))
        );
        assert_eq!(path.rebase(&p("Other"), &p("X")), None);
        assert_eq!(p("Novel").rebase(&p("Novel"), &p("Saga")), Some(p("Saga")));
    }

    #[test]
    fn serde_as_plain_string() {
        let json = serde_json::to_string(&p("Novel/Index.md")).unwrap();
        assert_eq!(json, "\"Novel/Index.md\"");
        let back: VaultPath = serde_json::from_str("\"/Novel/Index.md\"").unwrap();
        assert_eq!(back, p("Novel/Index.md"));
        assert!(serde_json::from_str::<VaultPath>("\"a//b\"").is_err());
    }
}
