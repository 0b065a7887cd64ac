//! Built-in steps

use crate::error::StepError;
use crate::step::{OptionSpec, OptionType, Step, StepContext, StepDescriptor, StepOptions};
use crate::text;
use crate::value::{StepKind, StepValue};
use longform_model::{frontmatter, SceneText, SCENE_SEPARATOR};
use serde_json::json;
use std::sync::Arc;

/// Every built-in step
#[must_use]
pub fn builtin_steps() -> Vec<Arc<dyn Step>> {
    vec![
        Arc::new(SceneFilter::strip_frontmatter()),
        Arc::new(SceneFilter::remove_comments()),
        Arc::new(SceneFilter::remove_links()),
        Arc::new(PrependTitle::new()),
        Arc::new(ConcatenateText::new()),
        Arc::new(WriteHeading::new()),
    ]
}

/// Expand `$title` and `$index` (1-based) in a template
#[must_use]
pub fn expand_scene_vars(template: &str, title: &str, index: usize) -> String {
    template
        .replace("$title", title)
        .replace("$index", &(index + 1).to_string())
}

fn expect_scenes(input: StepValue) -> Result<Vec<SceneText>, StepError> {
    match input {
        StepValue::Scenes(scenes) => Ok(scenes),
        other => Err(StepError::UnsupportedInput(other.kind())),
    }
}

/// Scenes → scenes step applying a plain text function to each scene
#[derive(Debug)]
pub struct SceneFilter {
    descriptor: StepDescriptor,
    apply: fn(&str) -> String,
}

impl SceneFilter {
    /// `strip-frontmatter`
    #[must_use]
    pub fn strip_frontmatter() -> Self {
        Self {
            descriptor: StepDescriptor::new(
                "strip-frontmatter",
                "Strip Frontmatter",
                StepKind::Scenes,
                StepKind::Scenes,
            )
            .with_description("Removes the YAML frontmatter block from each scene."),
            apply: |s| frontmatter::strip(s).to_string(),
        }
    }

    /// `remove-comments`
    #[must_use]
    pub fn remove_comments() -> Self {
        Self {
            descriptor: StepDescriptor::new(
                "remove-comments",
                "Remove Comments",
                StepKind::Scenes,
                StepKind::Scenes,
            )
            .with_description("Removes %% and HTML comments from each scene."),
            apply: |s| text::remove_comments(s).into_owned(),
        }
    }

    /// `remove-links`
    #[must_use]
    pub fn remove_links() -> Self {
        Self {
            descriptor: StepDescriptor::new(
                "remove-links",
                "Remove Links",
                StepKind::Scenes,
                StepKind::Scenes,
            )
            .with_description("Replaces wiki and markdown links with their display text."),
            apply: text::remove_links,
        }
    }
}

impl Step for SceneFilter {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        input: StepValue,
        _options: &StepOptions,
        _context: &StepContext,
    ) -> Result<StepValue, StepError> {
        let scenes = expect_scenes(input)?
            .into_iter()
            .map(|mut scene| {
                scene.content = (self.apply)(&scene.content);
                scene
            })
            .collect();
        Ok(StepValue::Scenes(scenes))
    }
}

/// `prepend-title`: puts a formatted title line above each scene
#[derive(Debug)]
pub struct PrependTitle {
    descriptor: StepDescriptor,
}

impl PrependTitle {
    /// Create step
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: StepDescriptor::new(
                "prepend-title",
                "Prepend Title",
                StepKind::Scenes,
                StepKind::Scenes,
            )
            .with_description("Prepends each scene with its title.")
            .with_option(
                OptionSpec::new("format", "Title Format", OptionType::text(), json!("## $title"))
                    .with_description("$title is the scene title, $index its 1-based position."),
            )
            .with_option(OptionSpec::new(
                "separator",
                "Separator",
                OptionType::text(),
                json!(SCENE_SEPARATOR),
            )),
        }
    }
}

impl Default for PrependTitle {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for PrependTitle {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        input: StepValue,
        options: &StepOptions,
        _context: &StepContext,
    ) -> Result<StepValue, StepError> {
        let format = options.text("format").unwrap_or("## $title");
        let separator = options.text("separator").unwrap_or(SCENE_SEPARATOR);
        let scenes = expect_scenes(input)?
            .into_iter()
            .enumerate()
            .map(|(index, mut scene)| {
                let title = expand_scene_vars(format, &scene.title, index);
                scene.content = format!("{title}{separator}{}", scene.content);
                scene
            })
            .collect();
        Ok(StepValue::Scenes(scenes))
    }
}

/// `concatenate-text`: joins scenes into one manuscript
#[derive(Debug)]
pub struct ConcatenateText {
    descriptor: StepDescriptor,
}

impl ConcatenateText {
    /// Create step
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: StepDescriptor::new(
                "concatenate-text",
                "Concatenate Text",
                StepKind::Scenes,
                StepKind::Text,
            )
            .with_description("Joins all scenes into a single manuscript.")
            .with_option(OptionSpec::new(
                "separator",
                "Separator",
                OptionType::text(),
                json!(SCENE_SEPARATOR),
            )),
        }
    }
}

impl Default for ConcatenateText {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for ConcatenateText {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        input: StepValue,
        options: &StepOptions,
        _context: &StepContext,
    ) -> Result<StepValue, StepError> {
        let separator = options.text("separator").unwrap_or(SCENE_SEPARATOR);
        let joined = expect_scenes(input)?
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join(separator);
        Ok(StepValue::Text(joined))
    }
}

/// `write-heading`: puts the draft title at the top of the manuscript
#[derive(Debug)]
pub struct WriteHeading {
    descriptor: StepDescriptor,
}

impl WriteHeading {
    /// Create step
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: StepDescriptor::new(
                "write-heading",
                "Write Heading",
                StepKind::Text,
                StepKind::Text,
            )
            .with_description("Adds the draft title as a heading.")
            .with_option(OptionSpec::new(
                "level",
                "Heading Level",
                OptionType::Number {
                    min: Some(1.0),
                    max: Some(6.0),
                },
                json!(1),
            )),
        }
    }
}

impl Default for WriteHeading {
    fn default() -> Self {
        Self::new()
    }
}

impl Step for WriteHeading {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        input: StepValue,
        options: &StepOptions,
        context: &StepContext,
    ) -> Result<StepValue, StepError> {
        let StepValue::Text(body) = input else {
            return Err(StepError::UnsupportedInput(input.kind()));
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let level = options.number("level").unwrap_or(1.0).clamp(1.0, 6.0) as usize;
        let hashes = "#".repeat(level);
        Ok(StepValue::Text(format!(
            "{hashes} {}{SCENE_SEPARATOR}{body}",
            context.title()
        )))
    }
}
