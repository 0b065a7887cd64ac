//! Testing utilities for the Longform workspace
//!
//! Vault fixtures, test steps and sample user scripts.

#![allow(missing_docs)]

use longform_compile::{Step, StepContext, StepDescriptor, StepError, StepKind, StepOptions, StepValue};
use longform_model::{
    frontmatter, Draft, DraftFormat, DraftSnapshot, MemoryVault, SceneEntry, SceneText, Vault,
    VaultError, VaultPath,
};
use std::sync::Arc;

/// Folder the sample scripts live in
pub const SCRIPT_FOLDER: &str = "Scripts";

/// Text → text script that upper-cases and appends its `mark` option
pub const SHOUT_SCRIPT: &str = "\
id: shout
name: Shout
input: text
output: text
options:
  - id: mark
    type: text
    default: '!'
ops:
  - uppercase
  - append: '{{mark}}'
";

/// Scenes → scenes script numbering each scene
pub const NUMBER_SCRIPT: &str = "\
id: number-scenes
input: scenes
output: scenes
ops:
  - prepend: '$index. '
";

/// Not valid YAML
pub const MALFORMED_SCRIPT: &str = "id: [unclosed\ninput: text\n";

pub fn vault_path(path: &str) -> VaultPath {
    VaultPath::new(path).unwrap()
}

/// Index note declaring a multi-file draft with scenes in the same folder
pub fn index_note(title: &str, scenes: &[&str]) -> String {
    let draft = Draft::new(vault_path(&format!("{title}/Index.md")), title)
        .with_scenes(scenes.iter().map(|s| SceneEntry::new(*s)).collect());
    frontmatter::render_index(&draft, "").unwrap()
}

/// Index note of a single-file draft
pub fn single_note(title: &str, body: &str) -> String {
    let draft = Draft::new(vault_path(&format!("{title}.md")), title)
        .with_format(DraftFormat::Single);
    frontmatter::render_index(&draft, body).unwrap()
}

/// Builder for vault contents
#[derive(Debug, Clone, Default)]
pub struct VaultFixture {
    files: Vec<(VaultPath, String)>,
}

impl VaultFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Multi-file draft at `<title>/Index.md` with one note per scene
    pub fn draft(mut self, title: &str, scenes: &[&str]) -> Self {
        self.files
            .push((vault_path(&format!("{title}/Index.md")), index_note(title, scenes)));
        for scene in scenes {
            self.files.push((
                vault_path(&format!("{title}/{scene}.md")),
                format!("{scene} text."),
            ));
        }
        self
    }

    /// Single-file draft at `<title>.md`
    pub fn single(mut self, title: &str, body: &str) -> Self {
        self.files
            .push((vault_path(&format!("{title}.md")), single_note(title, body)));
        self
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files.push((vault_path(path), content.to_string()));
        self
    }

    /// Script inside [`SCRIPT_FOLDER`]
    pub fn script(self, name: &str, content: &str) -> Self {
        self.file(&format!("{SCRIPT_FOLDER}/{name}"), content)
    }

    pub fn memory(&self) -> MemoryVault {
        let vault = MemoryVault::new();
        for (path, content) in &self.files {
            vault.insert(path.clone(), content.clone());
        }
        vault
    }

    /// Write every file through the vault trait
    pub async fn write_to<V: Vault>(&self, vault: &V) -> Result<(), VaultError> {
        for (path, content) in &self.files {
            vault.write(path, content).await?;
        }
        Ok(())
    }
}

/// Single-file draft snapshot whose compiled text is `text`
pub fn text_snapshot(text: &str) -> Arc<DraftSnapshot> {
    let path = vault_path("Story.md");
    let draft = Draft::new(path.clone(), "Story").with_format(DraftFormat::Single);
    let scene = SceneText {
        title: "Story".to_string(),
        path,
        indent: 0,
        content: text.to_string(),
    };
    Arc::new(DraftSnapshot::new(draft, vec![scene]))
}

fn expect_text(input: StepValue) -> Result<String, StepError> {
    match input {
        StepValue::Text(text) => Ok(text),
        other => Err(StepError::UnsupportedInput(other.kind())),
    }
}

/// `uppercase`: text → text
#[derive(Debug)]
pub struct UppercaseStep {
    descriptor: StepDescriptor,
}

impl UppercaseStep {
    pub fn new() -> Self {
        Self {
            descriptor: StepDescriptor::new("uppercase", "Uppercase", StepKind::Text, StepKind::Text),
        }
    }
}

impl Default for UppercaseStep {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for UppercaseStep {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        input: StepValue,
        _options: &StepOptions,
        _context: &StepContext,
    ) -> Result<StepValue, StepError> {
        Ok(StepValue::Text(expect_text(input)?.to_uppercase()))
    }
}

/// `append`: text → text, appends a fixed suffix
#[derive(Debug)]
pub struct AppendStep {
    descriptor: StepDescriptor,
    suffix: String,
}

impl AppendStep {
    pub fn new(suffix: &str) -> Self {
        Self {
            descriptor: StepDescriptor::new("append", "Append", StepKind::Text, StepKind::Text),
            suffix: suffix.to_string(),
        }
    }
}

impl Step for AppendStep {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        input: StepValue,
        _options: &StepOptions,
        _context: &StepContext,
    ) -> Result<StepValue, StepError> {
        Ok(StepValue::Text(expect_text(input)? + &self.suffix))
    }
}

/// `explode`: text → text, always fails
#[derive(Debug)]
pub struct FailingStep {
    descriptor: StepDescriptor,
}

impl FailingStep {
    pub fn new() -> Self {
        Self {
            descriptor: StepDescriptor::new("explode", "Explode", StepKind::Text, StepKind::Text),
        }
    }
}

impl Default for FailingStep {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for FailingStep {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        _input: StepValue,
        _options: &StepOptions,
        _context: &StepContext,
    ) -> Result<StepValue, StepError> {
        Err(StepError::failed("boom"))
    }
}
