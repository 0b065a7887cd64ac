//! Values flowing between workflow steps

use longform_model::{join_scenes, DraftSnapshot, SceneText};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Kind of value a step consumes or produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// The whole draft snapshot
    Draft,
    /// Scene texts in order
    Scenes,
    /// A single manuscript text
    Text,
}

impl StepKind {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scenes => "scenes",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value passed from one step to the next
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    /// Draft snapshot
    Draft(Arc<DraftSnapshot>),
    /// Scene texts in order
    Scenes(Vec<SceneText>),
    /// Manuscript text
    Text(String),
}

impl StepValue {
    /// Kind of this value
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Draft(_) => StepKind::Draft,
            Self::Scenes(_) => StepKind::Scenes,
            Self::Text(_) => StepKind::Text,
        }
    }

    /// Initial value for a run whose first step consumes `kind`
    #[must_use]
    pub fn seed(kind: StepKind, snapshot: &Arc<DraftSnapshot>) -> Self {
        match kind {
            StepKind::Draft => Self::Draft(Arc::clone(snapshot)),
            StepKind::Scenes => Self::Scenes(snapshot.scenes.clone()),
            StepKind::Text => Self::Text(snapshot.compiled_text()),
        }
    }

    /// Render as manuscript text
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Draft(snapshot) => snapshot.compiled_text(),
            Self::Scenes(scenes) => join_scenes(&scenes),
            Self::Text(text) => text,
        }
    }
}
