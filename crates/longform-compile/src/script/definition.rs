//! Script document format

use crate::value::StepKind;
use serde::Deserialize;
use serde_json::Value;

/// Parsed script document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptDefinition {
    /// Step id
    pub id: String,
    /// Display name (defaults to the id)
    #[serde(default)]
    pub name: Option<String>,
    /// Help text
    #[serde(default)]
    pub description: String,
    /// Behavior version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Kind consumed
    pub input: StepKind,
    /// Kind produced
    pub output: StepKind,
    /// Declared options
    #[serde(default)]
    pub options: Vec<ScriptOption>,
    /// Operations applied in order
    #[serde(default)]
    pub ops: Vec<OpDef>,
}

fn default_version() -> u32 {
    1
}

/// Option type keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptOptionType {
    /// Free text
    Text,
    /// `true` / `false`
    Boolean,
    /// Number
    Number,
}

/// Declared script option
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptOption {
    /// Key
    pub id: String,
    /// Display name (defaults to the id)
    #[serde(default)]
    pub name: Option<String>,
    /// Help text
    #[serde(default)]
    pub description: String,
    /// Value type
    #[serde(rename = "type")]
    pub kind: ScriptOptionType,
    /// Default value
    #[serde(default)]
    pub default: Value,
    /// Allowed text values
    #[serde(default)]
    pub choices: Vec<String>,
    /// Lower bound for numbers
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound for numbers
    #[serde(default)]
    pub max: Option<f64>,
}

/// One operation as written in a script
///
/// Bare names (`- uppercase`) and single-key mappings (`- append: "!"`)
/// are both accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpDef {
    /// Upper-case the text
    Uppercase,
    /// Lower-case the text
    Lowercase,
    /// Trim surrounding whitespace
    Trim,
    /// Drop a leading frontmatter block
    StripFrontmatter,
    /// Drop `%% %%` and `<!-- -->` comments
    RemoveComments,
    /// Replace links with their display text
    RemoveLinks,
    /// Put a template before the text
    Prepend(String),
    /// Put a template after the text
    Append(String),
    /// Regex replacement
    Replace {
        /// Regular expression
        pattern: String,
        /// Replacement template (`$1` refers to capture groups)
        with: String,
    },
    /// Conditional on a boolean option
    When {
        /// Boolean option id
        option: String,
        /// Ops applied when the option is true
        #[serde(default)]
        then: Vec<OpDef>,
        /// Ops applied otherwise
        #[serde(default)]
        otherwise: Vec<OpDef>,
    },
}

/// Script document syntax, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptSyntax {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ScriptSyntax {
    /// Syntax for an extension, if it is a script extension
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a script document
///
/// YAML is read into a JSON value first so both syntaxes share one
/// decoding path.
///
/// # Errors
/// Returns the parser message on syntax or shape errors
pub fn parse_definition(source: &str, syntax: ScriptSyntax) -> Result<ScriptDefinition, String> {
    let value: Value = match syntax {
        ScriptSyntax::Yaml => serde_yaml::from_str(source).map_err(|e| e.to_string())?,
        ScriptSyntax::Json => serde_json::from_str(source).map_err(|e| e.to_string())?,
    };
    serde_json::from_value(value).map_err(|e| e.to_string())
}
