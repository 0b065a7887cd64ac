//! Persisted workflow form
//!
//! The serialized form holds step ids and option values only. Deserializing
//! never consults the registry, so workflows referencing steps that are not
//! loaded survive a save/load cycle unchanged.

use crate::workflow::{StepInvocation, Workflow};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Name of the default multi-file workflow
pub const DEFAULT_WORKFLOW: &str = "Default Workflow";

/// Name of the default single-file workflow
pub const SINGLE_FILE_WORKFLOW: &str = "Single File";

/// Serialized step invocation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SerializedStep {
    /// Step id
    pub id: String,
    /// Bound option values
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// Serialized workflow
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SerializedWorkflow {
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Invocations in run order
    #[serde(default)]
    pub steps: Vec<SerializedStep>,
}

/// Build a workflow from its serialized form
#[must_use]
pub fn deserialize_workflow(serialized: &SerializedWorkflow) -> Workflow {
    Workflow {
        description: serialized.description.clone(),
        steps: serialized
            .steps
            .iter()
            .map(|s| StepInvocation {
                id: s.id.clone(),
                options: s.options.clone(),
            })
            .collect(),
    }
}

/// Serialize a workflow
#[must_use]
pub fn serialize_workflow(workflow: &Workflow) -> SerializedWorkflow {
    SerializedWorkflow {
        description: workflow.description.clone(),
        steps: workflow
            .steps
            .iter()
            .map(|s| SerializedStep {
                id: s.id.clone(),
                options: s.options.clone(),
            })
            .collect(),
    }
}

impl From<&SerializedWorkflow> for Workflow {
    fn from(serialized: &SerializedWorkflow) -> Self {
        deserialize_workflow(serialized)
    }
}

impl From<&Workflow> for SerializedWorkflow {
    fn from(workflow: &Workflow) -> Self {
        serialize_workflow(workflow)
    }
}

fn step(id: &str, options: Value) -> SerializedStep {
    SerializedStep {
        id: id.to_string(),
        options: match options {
            Value::Object(map) => map,
            _ => Map::new(),
        },
    }
}

/// Workflows shipped with the engine, by name
#[must_use]
pub fn default_workflows() -> BTreeMap<String, SerializedWorkflow> {
    let mut workflows = BTreeMap::new();
    workflows.insert(
        DEFAULT_WORKFLOW.to_string(),
        SerializedWorkflow {
            description: Some(
                "Cleans up each scene, titles it and joins the draft into one manuscript."
                    .to_string(),
            ),
            steps: vec![
                step("strip-frontmatter", json!({})),
                step("remove-comments", json!({})),
                step("remove-links", json!({})),
                step("prepend-title", json!({ "format": "## $title", "separator": "\n\n" })),
                step("concatenate-text", json!({ "separator": "\n\n" })),
                step("write-heading", json!({ "level": 1 })),
            ],
        },
    );
    workflows.insert(
        SINGLE_FILE_WORKFLOW.to_string(),
        SerializedWorkflow {
            description: Some("Cleans up a single-file draft.".to_string()),
            steps: vec![
                step("strip-frontmatter", json!({})),
                step("remove-comments", json!({})),
                step("remove-links", json!({})),
                step("concatenate-text", json!({})),
            ],
        },
    );
    workflows
}
