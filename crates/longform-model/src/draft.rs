//! Draft and Scene model
//!
//! A [`Draft`] is rooted at an index note whose frontmatter declares the
//! project. Multi-file drafts own an ordered list of [`SceneEntry`] names
//! resolved against the draft's scene folder.

use crate::path::{PathError, VaultPath, MARKDOWN_EXTENSION};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scene folder value meaning "next to the index note"
pub const SAME_FOLDER: &str = "/";

/// Separator used when scenes are rendered as a single text
pub const SCENE_SEPARATOR: &str = "\n\n";

/// Draft format discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftFormat {
    /// Multi-file draft: an index note plus one note per scene
    #[default]
    Scenes,
    /// The whole draft lives in the index note
    Single,
}

impl fmt::Display for DraftFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scenes => f.write_str("scenes"),
            Self::Single => f.write_str("single"),
        }
    }
}

/// One entry of a draft's persisted scene order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneEntry {
    /// File stem relative to the scene folder
    pub name: String,
    /// Nesting depth (0 = top level)
    pub indent: usize,
}

impl SceneEntry {
    /// Top-level entry
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indent: 0,
        }
    }

    /// Entry at a nesting depth
    #[inline]
    #[must_use]
    pub fn indented(name: impl Into<String>, indent: usize) -> Self {
        Self {
            name: name.into(),
            indent,
        }
    }
}

/// A long-form writing project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    /// Index note path; the draft's identity
    pub vault_path: VaultPath,
    /// Display title
    pub title: String,
    /// Single- or multi-file
    pub format: DraftFormat,
    /// Scene folder relative to the index note's folder
    pub scene_folder: String,
    /// Authoritative scene order
    pub scenes: Vec<SceneEntry>,
    /// Wildcard patterns of files that are never scenes
    pub ignored_files: Vec<String>,
    /// Workflow selected for this draft
    pub workflow: Option<String>,
}

impl Draft {
    /// Create a multi-file draft with no scenes
    #[must_use]
    pub fn new(vault_path: VaultPath, title: impl Into<String>) -> Self {
        Self {
            vault_path,
            title: title.into(),
            format: DraftFormat::Scenes,
            scene_folder: SAME_FOLDER.to_string(),
            scenes: Vec::new(),
            ignored_files: Vec::new(),
            workflow: None,
        }
    }

    /// Set format
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: DraftFormat) -> Self {
        self.format = format;
        self
    }

    /// Set scene order
    #[inline]
    #[must_use]
    pub fn with_scenes(mut self, scenes: Vec<SceneEntry>) -> Self {
        self.scenes = scenes;
        self
    }

    /// Check for the multi-file format
    #[inline]
    #[must_use]
    pub fn is_multi_file(&self) -> bool {
        self.format == DraftFormat::Scenes
    }

    /// Folder holding this draft's scenes
    ///
    /// # Errors
    /// Returns error if the configured scene folder escapes the vault
    pub fn scene_dir(&self) -> Result<VaultPath, PathError> {
        let base = self.vault_path.parent().unwrap_or_default();
        base.join(&self.scene_folder)
    }

    /// Path of a scene by name
    ///
    /// # Errors
    /// Returns error if the scene folder or name is not a valid path
    pub fn scene_path(&self, name: &str) -> Result<VaultPath, PathError> {
        self.scene_dir()?
            .child(&format!("{name}.{MARKDOWN_EXTENSION}"))
    }

    /// Resolved scenes in order
    #[must_use]
    pub fn scene_list(&self) -> Vec<Scene> {
        if !self.is_multi_file() {
            return Vec::new();
        }
        self.scenes
            .iter()
            .filter_map(|entry| {
                let path = self.scene_path(&entry.name).ok()?;
                Some(Scene {
                    path,
                    title: entry.name.clone(),
                    indent: entry.indent,
                })
            })
            .collect()
    }

    /// Check if a scene name is in the order
    #[inline]
    #[must_use]
    pub fn contains_scene(&self, name: &str) -> bool {
        self.scenes.iter().any(|s| s.name == name)
    }

    /// Position of a scene name in the order
    #[inline]
    #[must_use]
    pub fn scene_position(&self, name: &str) -> Option<usize> {
        self.scenes.iter().position(|s| s.name == name)
    }

    /// Scene name for a path, if the path is a candidate content file
    ///
    /// A candidate is a markdown file directly inside the scene folder that
    /// is neither this draft's index note nor ignored. It may or may not be
    /// in the order yet.
    #[must_use]
    pub fn candidate_scene_name(&self, path: &VaultPath) -> Option<String> {
        if !self.is_multi_file() || path == &self.vault_path || !path.is_markdown() {
            return None;
        }
        let dir = self.scene_dir().ok()?;
        if path.parent().as_ref() != Some(&dir) {
            return None;
        }
        let name = path.stem()?;
        if self.is_ignored(name) {
            return None;
        }
        Some(name.to_string())
    }

    /// Tracked scene for a path
    #[must_use]
    pub fn scene_for_path(&self, path: &VaultPath) -> Option<Scene> {
        let name = self.candidate_scene_name(path)?;
        let entry = self.scenes.iter().find(|s| s.name == name)?;
        Some(Scene {
            path: path.clone(),
            title: entry.name.clone(),
            indent: entry.indent,
        })
    }

    /// Check if a scene name matches one of the ignore patterns
    #[must_use]
    pub fn is_ignored(&self, name: &str) -> bool {
        let file_name = format!("{name}.{MARKDOWN_EXTENSION}");
        self.ignored_files
            .iter()
            .any(|pattern| wildcard_match(pattern, name) || wildcard_match(pattern, &file_name))
    }

    /// Check if the path is the index note or a tracked scene
    #[must_use]
    pub fn owns_path(&self, path: &VaultPath) -> bool {
        path == &self.vault_path || self.scene_for_path(path).is_some()
    }
}

/// Match a name against a `*` wildcard pattern (whole-name, case-sensitive)
#[must_use]
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == name;
    }
    let escaped: Vec<String> = pattern.split('*').map(regex::escape).collect();
    let source = format!("^{}$", escaped.join(".*"));
    Regex::new(&source).is_ok_and(|re| re.is_match(name))
}

/// A scene resolved against its draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// File path
    pub path: VaultPath,
    /// Display title (file stem)
    pub title: String,
    /// Nesting depth
    pub indent: usize,
}

/// Scene with its loaded content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneText {
    /// Display title
    pub title: String,
    /// File path
    pub path: VaultPath,
    /// Nesting depth
    pub indent: usize,
    /// Raw note content
    pub content: String,
}

/// Immutable copy of a draft and its content, taken when a compile starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSnapshot {
    /// The draft as it was at snapshot time
    pub draft: Draft,
    /// Scene contents in order (the index note body for single-file drafts)
    pub scenes: Vec<SceneText>,
}

impl DraftSnapshot {
    /// Create snapshot
    #[inline]
    #[must_use]
    pub fn new(draft: Draft, scenes: Vec<SceneText>) -> Self {
        Self { draft, scenes }
    }

    /// Snapshot of a single-file draft from its index note
    ///
    /// The note's frontmatter is dropped so every step sees only the body.
    #[must_use]
    pub fn single(draft: Draft, note: &str) -> Self {
        let index = SceneText {
            title: draft.title.clone(),
            path: draft.vault_path.clone(),
            indent: 0,
            content: crate::frontmatter::strip(note).to_string(),
        };
        Self::new(draft, vec![index])
    }

    /// Scene contents joined by a blank line
    #[must_use]
    pub fn compiled_text(&self) -> String {
        join_scenes(&self.scenes)
    }
}

/// Join scene contents with [`SCENE_SEPARATOR`]
#[must_use]
pub fn join_scenes(scenes: &[SceneText]) -> String {
    scenes
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join(SCENE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> VaultPath {
        VaultPath::new(s).unwrap()
    }

    fn novel() -> Draft {
        Draft::new(p("Novel/Index.md"), "Novel").with_scenes(vec![
            SceneEntry::new("Opening"),
            SceneEntry::indented("Flashback", 1),
        ])
    }

    #[test]
    fn scene_dir_defaults_to_index_folder() {
        let draft = novel();
        assert_eq!(draft.scene_dir().unwrap(), p("Novel"));
        assert_eq!(draft.scene_path("Opening").unwrap(), p("Novel/Opening.md"));
    }

    #[test]
    fn scene_dir_follows_scene_folder() {
        let mut draft = novel();
        draft.scene_folder = "Scenes".to_string();
        assert_eq!(draft.scene_dir().unwrap(), p("Novel/Scenes"));
    }

    #[test]
    fn scene_list_resolves_in_order() {
        let scenes = novel().scene_list();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].path, p("Novel/Opening.md"));
        assert_eq!(scenes[1].indent, 1);
    }

    #[test]
    fn single_file_has_no_scene_list() {
        let draft = novel().with_format(DraftFormat::Single);
        assert!(draft.scene_list().is_empty());
        assert!(draft.candidate_scene_name(&p("Novel/Opening.md")).is_none());
    }

    #[test]
    fn candidate_excludes_index_and_other_folders() {
        let draft = novel();
        assert_eq!(
            draft.candidate_scene_name(&p("Novel/New.md")),
            Some("New".to_string())
        );
        assert!(draft.candidate_scene_name(&p("Novel/Index.md")).is_none());
        assert!(draft.candidate_scene_name(&p("Novel/sub/New.md")).is_none());
        assert!(draft.candidate_scene_name(&p("Novel/image.png")).is_none());
    }

    #[test]
    fn ignored_files_use_wildcards() {
        let mut draft = novel();
        draft.ignored_files = vec!["Notes*".to_string(), "todo.md".to_string()];
        assert!(draft.is_ignored("Notes on plot"));
        assert!(draft.is_ignored("todo"));
        assert!(!draft.is_ignored("Opening"));
        assert!(draft.candidate_scene_name(&p("Novel/Notes 1.md")).is_none());
    }

    #[test]
    fn wildcard_escapes_regex_characters() {
        assert!(wildcard_match("a.b*", "a.b c"));
        assert!(!wildcard_match("a.b*", "axb"));
        assert!(wildcard_match("*", "anything"));
    }

    #[test]
    fn owns_path_covers_index_and_tracked_scenes() {
        let draft = novel();
        assert!(draft.owns_path(&p("Novel/Index.md")));
        assert!(draft.owns_path(&p("Novel/Flashback.md")));
        assert!(!draft.owns_path(&p("Novel/Untracked.md")));
    }

    #[test]
    fn compiled_text_joins_with_blank_line() {
        let scene = |title: &str, content: &str| SceneText {
            title: title.to_string(),
            path: p(&format!("Novel/{title}.md")),
            indent: 0,
            content: content.to_string(),
        };
        let snapshot = DraftSnapshot::new(novel(), vec![scene("A", "one"), scene("B", "two")]);
        assert_eq!(snapshot.compiled_text(), "one\n\ntwo");
    }

    #[test]
    fn single_file_snapshot_drops_frontmatter() {
        let draft = Draft::new(p("Story.md"), "Story").with_format(DraftFormat::Single);
        let note = "---\nlongform:\n  format: single\n---\nOnce upon a time.";
        let snapshot = DraftSnapshot::single(draft, note);
        assert_eq!(snapshot.scenes.len(), 1);
        assert_eq!(snapshot.scenes[0].path, p("Story.md"));
        assert_eq!(snapshot.scenes[0].content, "Once upon a time.");
        assert_eq!(snapshot.compiled_text(), "Once upon a time.");
    }
}
