//! YAML frontmatter codec
//!
//! Reads draft declarations out of index notes and rewrites the scene order
//! in place, preserving every other frontmatter key and the note body.

use crate::draft::{Draft, DraftFormat, SceneEntry, SAME_FOLDER};
use crate::path::VaultPath;
use serde_yaml::{Mapping, Value};

/// Frontmatter key holding the draft declaration
pub const DRAFT_KEY: &str = "longform";

const FENCE: &str = "---";

/// Errors while reading or writing frontmatter
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    /// YAML between the fences failed to parse
    #[error("invalid frontmatter yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Frontmatter is not a mapping
    #[error("frontmatter is not a mapping")]
    NotAMapping,

    /// Draft declaration missing where one is required
    #[error("note has no '{DRAFT_KEY}' declaration")]
    MissingDeclaration,

    /// Draft declaration has an unexpected shape
    #[error("invalid draft declaration: {0}")]
    InvalidDeclaration(String),
}

/// Split a note into its raw frontmatter and body
///
/// The note must open with a `---` line; the block ends at the next line
/// that is exactly `---`. Notes without a closed block have no frontmatter.
#[must_use]
pub fn split(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix(FENCE)
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }

    (None, content)
}

/// Note body with any frontmatter removed
#[inline]
#[must_use]
pub fn strip(content: &str) -> &str {
    split(content).1
}

/// Parse the frontmatter mapping of a note
///
/// # Errors
/// Returns error if the block is not valid YAML or not a mapping
pub fn parse(content: &str) -> Result<Option<Mapping>, FrontmatterError> {
    let Some(yaml) = split(content).0 else {
        return Ok(None);
    };
    if yaml.trim().is_empty() {
        return Ok(Some(Mapping::new()));
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(map) => Ok(Some(map)),
        Value::Null => Ok(Some(Mapping::new())),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Read a draft declaration from an index note
///
/// Returns `Ok(None)` for notes that are not draft roots.
///
/// # Errors
/// Returns error if the note carries a malformed declaration
pub fn read_draft(path: &VaultPath, content: &str) -> Result<Option<Draft>, FrontmatterError> {
    let Some(map) = parse(content)? else {
        return Ok(None);
    };
    let Some(Value::Mapping(decl)) = map.get(DRAFT_KEY) else {
        return Ok(None);
    };
    let Some(format) = decl.get("format") else {
        return Ok(None);
    };

    let format: DraftFormat = serde_yaml::from_value(format.clone())
        .map_err(|e| FrontmatterError::InvalidDeclaration(format!("format: {e}")))?;

    let title = match decl.get("title") {
        Some(Value::String(t)) if !t.trim().is_empty() => t.clone(),
        _ => path.stem().unwrap_or_default().to_string(),
    };

    let scene_folder = match decl.get("sceneFolder") {
        Some(Value::String(f)) => f.clone(),
        _ => SAME_FOLDER.to_string(),
    };

    let scenes = match decl.get("scenes") {
        Some(Value::Sequence(seq)) => {
            let mut out = Vec::new();
            flatten_scenes(seq, 0, &mut out)?;
            out
        }
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            return Err(FrontmatterError::InvalidDeclaration(format!(
                "scenes must be a list, found {other:?}"
            )))
        }
    };

    let ignored_files = match decl.get("ignoredFiles") {
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    let workflow = decl
        .get("workflow")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Some(Draft {
        vault_path: path.clone(),
        title,
        format,
        scene_folder,
        scenes,
        ignored_files,
        workflow,
    }))
}

fn flatten_scenes(
    seq: &[Value],
    depth: usize,
    out: &mut Vec<SceneEntry>,
) -> Result<(), FrontmatterError> {
    for item in seq {
        match item {
            Value::String(name) => out.push(SceneEntry::indented(name.clone(), depth)),
            Value::Number(n) => out.push(SceneEntry::indented(n.to_string(), depth)),
            Value::Sequence(nested) => flatten_scenes(nested, depth + 1, out)?,
            other => {
                return Err(FrontmatterError::InvalidDeclaration(format!(
                    "unexpected scene entry {other:?}"
                )))
            }
        }
    }
    Ok(())
}

/// Encode a flat scene list as nested YAML sequences
///
/// Each level of indentation becomes one level of sequence nesting, so
/// `[A(0), B(1), C(0)]` encodes as `[A, [B], C]`.
#[must_use]
pub fn nest_scenes(scenes: &[SceneEntry]) -> Value {
    let mut stack: Vec<Vec<Value>> = vec![Vec::new()];
    for entry in scenes {
        while stack.len() - 1 > entry.indent {
            close_level(&mut stack);
        }
        while stack.len() - 1 < entry.indent {
            stack.push(Vec::new());
        }
        if let Some(level) = stack.last_mut() {
            level.push(Value::String(entry.name.clone()));
        }
    }
    while stack.len() > 1 {
        close_level(&mut stack);
    }
    Value::Sequence(stack.pop().unwrap_or_default())
}

fn close_level(stack: &mut Vec<Vec<Value>>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.push(Value::Sequence(done));
        }
    }
}

/// Rewrite the scene order of an index note
///
/// # Errors
/// Returns error if the note has no draft declaration
pub fn write_scenes(content: &str, scenes: &[SceneEntry]) -> Result<String, FrontmatterError> {
    let mut map = parse(content)?.ok_or(FrontmatterError::MissingDeclaration)?;
    let decl = match map.get_mut(DRAFT_KEY) {
        Some(Value::Mapping(decl)) => decl,
        _ => return Err(FrontmatterError::MissingDeclaration),
    };
    decl.insert(Value::String("scenes".to_string()), nest_scenes(scenes));

    let yaml = serde_yaml::to_string(&map)?;
    let body = strip(content);
    Ok(format!("{FENCE}\n{yaml}{FENCE}\n{body}"))
}

/// Render a fresh index note declaring a draft
///
/// # Errors
/// Returns error if YAML serialization fails
pub fn render_index(draft: &Draft, body: &str) -> Result<String, FrontmatterError> {
    let mut decl = Mapping::new();
    decl.insert("format".into(), Value::String(draft.format.to_string()));
    decl.insert("title".into(), Value::String(draft.title.clone()));
    if let Some(workflow) = &draft.workflow {
        decl.insert("workflow".into(), Value::String(workflow.clone()));
    }
    if draft.is_multi_file() {
        decl.insert(
            "sceneFolder".into(),
            Value::String(draft.scene_folder.clone()),
        );
        decl.insert("scenes".into(), nest_scenes(&draft.scenes));
        if !draft.ignored_files.is_empty() {
            decl.insert(
                "ignoredFiles".into(),
                Value::Sequence(
                    draft
                        .ignored_files
                        .iter()
                        .map(|p| Value::String(p.clone()))
                        .collect(),
                ),
            );
        }
    }

    let mut map = Mapping::new();
    map.insert(DRAFT_KEY.into(), Value::Mapping(decl));
    let yaml = serde_yaml::to_string(&map)?;
    Ok(format!("{FENCE}\n{yaml}{FENCE}\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> VaultPath {
        VaultPath::new(s).unwrap()
    }

    const INDEX: &str = "---
tags: [novel]
longform:
  format: scenes
  title: The Long Road
  workflow: Default Workflow
  scenes:
    - Opening
    - - Flashback
      - - Dream
    - Ending
  ignoredFiles:
    - Notes*
---
Planning notes live here.
";

    #[test]
    fn split_separates_frontmatter() {
        let (yaml, body) = split("---\na: 1\n---\nbody\n");
        assert_eq!(yaml, Some("a: 1\n"));
        assert_eq!(body, "body\n");
    }

    #[test]
    fn split_without_frontmatter() {
        assert_eq!(split("just text"), (None, "just text"));
        assert_eq!(split("---\nunclosed"), (None, "---\nunclosed"));
        assert_eq!(split("----\nx\n---\n").0, None);
    }

    #[test]
    fn read_draft_parses_declaration() {
        let draft = read_draft(&p("Novel/Index.md"), INDEX).unwrap().unwrap();
        assert_eq!(draft.title, "The Long Road");
        assert_eq!(draft.format, DraftFormat::Scenes);
        assert_eq!(draft.workflow.as_deref(), Some("Default Workflow"));
        assert_eq!(
            draft.scenes,
            vec![
                SceneEntry::new("Opening"),
                SceneEntry::indented("Flashback", 1),
                SceneEntry::indented("Dream", 2),
                SceneEntry::new("Ending"),
            ]
        );
        assert_eq!(draft.ignored_files, vec!["Notes*".to_string()]);
    }

    #[test]
    fn read_draft_defaults_title_to_stem() {
        let content = "---\nlongform:\n  format: single\n---\nOnce upon a time\n";
        let draft = read_draft(&p("Stories/Tale.md"), content).unwrap().unwrap();
        assert_eq!(draft.title, "Tale");
        assert_eq!(draft.format, DraftFormat::Single);
        assert!(draft.scenes.is_empty());
    }

    #[test]
    fn read_draft_ignores_unmarked_notes() {
        assert!(read_draft(&p("a.md"), "plain").unwrap().is_none());
        assert!(read_draft(&p("a.md"), "---\ntags: [x]\n---\n")
            .unwrap()
            .is_none());
        assert!(read_draft(&p("a.md"), "---\nlongform:\n  title: x\n---\n")
            .unwrap()
            .is_none());
    }

    #[test]
    fn read_draft_rejects_bad_format() {
        let content = "---\nlongform:\n  format: chapters\n---\n";
        assert!(matches!(
            read_draft(&p("a.md"), content),
            Err(FrontmatterError::InvalidDeclaration(_))
        ));
    }

    #[test]
    fn nest_scenes_encodes_indentation() {
        let nested = nest_scenes(&[
            SceneEntry::new("A"),
            SceneEntry::indented("B", 1),
            SceneEntry::indented("C", 2),
            SceneEntry::new("D"),
        ]);
        let expected: Value = serde_yaml::from_str("[A, [B, [C]], D]").unwrap();
        assert_eq!(nested, expected);
    }

    #[test]
    fn write_scenes_preserves_other_keys_and_body() {
        let updated = write_scenes(
            INDEX,
            &[SceneEntry::new("Ending"), SceneEntry::new("Opening")],
        )
        .unwrap();

        assert!(updated.ends_with("---\nPlanning notes live here.\n"));
        let map = parse(&updated).unwrap().unwrap();
        assert!(map.get("tags").is_some());

        let draft = read_draft(&p("Novel/Index.md"), &updated).unwrap().unwrap();
        assert_eq!(draft.title, "The Long Road");
        assert_eq!(
            draft.scenes,
            vec![SceneEntry::new("Ending"), SceneEntry::new("Opening")]
        );
        assert_eq!(draft.ignored_files, vec!["Notes*".to_string()]);
    }

    #[test]
    fn write_scenes_requires_declaration() {
        assert!(matches!(
            write_scenes("no frontmatter", &[]),
            Err(FrontmatterError::MissingDeclaration)
        ));
    }

    #[test]
    fn render_index_reads_back() {
        let draft = Draft::new(p("Novel/Index.md"), "Novel")
            .with_scenes(vec![SceneEntry::new("A"), SceneEntry::indented("B", 1)]);
        let content = render_index(&draft, "").unwrap();
        let back = read_draft(&p("Novel/Index.md"), &content).unwrap().unwrap();
        assert_eq!(back, draft);
    }
}
