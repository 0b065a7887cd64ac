//! Step trait and option handling
//!
//! A [`Step`] is an immutable transformation with a [`StepDescriptor`]
//! declaring its id, kinds and options. Bound option values are merged over
//! the declared defaults and checked before each execution.

use crate::error::{OptionError, StepError};
use crate::value::{StepKind, StepValue};
use longform_model::{DraftSnapshot, VaultPath};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Type of a step option
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OptionType {
    /// Free text, optionally restricted to a set of choices
    Text {
        /// Allowed values (empty = any)
        #[serde(skip_serializing_if = "Vec::is_empty")]
        choices: Vec<String>,
    },
    /// `true` / `false`
    Boolean,
    /// Number with an optional inclusive range
    Number {
        /// Lower bound
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        /// Upper bound
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
}

impl OptionType {
    /// Unrestricted text
    #[inline]
    #[must_use]
    pub fn text() -> Self {
        Self::Text {
            choices: Vec::new(),
        }
    }

    /// Unbounded number
    #[inline]
    #[must_use]
    pub fn number() -> Self {
        Self::Number {
            min: None,
            max: None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Boolean => "boolean",
            Self::Number { .. } => "number",
        }
    }
}

/// Declared option of a step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSpec {
    /// Key used in bound options
    pub id: String,
    /// Display name
    pub name: String,
    /// Help text
    pub description: String,
    /// Value type and restrictions
    #[serde(flatten)]
    pub kind: OptionType,
    /// Value used when none is bound
    pub default: Value,
}

impl OptionSpec {
    /// Create option spec
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: OptionType, default: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind,
            default,
        }
    }

    /// Set description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check a value against this spec
    ///
    /// `null` is accepted and means "unset".
    ///
    /// # Errors
    /// Returns error on type, range or choice violations
    pub fn check(&self, value: &Value) -> Result<(), OptionError> {
        let mismatch = || OptionError::TypeMismatch {
            option: self.id.clone(),
            expected: self.kind.name(),
        };
        match (&self.kind, value) {
            (_, Value::Null) | (OptionType::Boolean, Value::Bool(_)) => Ok(()),
            (OptionType::Text { choices }, Value::String(s)) => {
                if choices.is_empty() || choices.contains(s) {
                    Ok(())
                } else {
                    Err(OptionError::NotAChoice {
                        option: self.id.clone(),
                        value: s.clone(),
                        choices: choices.clone(),
                    })
                }
            }
            (OptionType::Number { min, max }, Value::Number(n)) => {
                let v = n.as_f64().ok_or_else(mismatch)?;
                let below = min.is_some_and(|m| v < m);
                let above = max.is_some_and(|m| v > m);
                if below || above {
                    return Err(OptionError::OutOfRange {
                        option: self.id.clone(),
                        value: n.to_string(),
                        min: min.map_or_else(|| "-inf".to_string(), |m| m.to_string()),
                        max: max.map_or_else(|| "inf".to_string(), |m| m.to_string()),
                    });
                }
                Ok(())
            }
            _ => Err(mismatch()),
        }
    }
}

/// Static description of a step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepDescriptor {
    /// Registry key
    pub id: String,
    /// Display name
    pub name: String,
    /// Help text
    pub description: String,
    /// Behavior version
    pub version: u32,
    /// Kind consumed
    pub input: StepKind,
    /// Kind produced
    pub output: StepKind,
    /// Declared options
    pub options: Vec<OptionSpec>,
}

impl StepDescriptor {
    /// Create descriptor with no options
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        input: StepKind,
        output: StepKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: 1,
            input,
            output,
            options: Vec::new(),
        }
    }

    /// Set description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Add an option
    #[inline]
    #[must_use]
    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Look up an option spec
    #[must_use]
    pub fn option(&self, id: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Check bound options without resolving them
    ///
    /// # Errors
    /// Returns the first invalid option
    pub fn check_options(&self, bound: &Map<String, Value>) -> Result<(), OptionError> {
        StepOptions::resolve(&self.options, bound).map(|_| ())
    }
}

/// Effective option values for one execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOptions {
    values: Map<String, Value>,
}

impl StepOptions {
    /// Merge bound values over spec defaults and check them
    ///
    /// Bound keys with no matching spec are dropped.
    ///
    /// # Errors
    /// Returns the first value that violates its spec
    pub fn resolve(specs: &[OptionSpec], bound: &Map<String, Value>) -> Result<Self, OptionError> {
        let mut values = Map::new();
        for spec in specs {
            let value = bound.get(&spec.id).unwrap_or(&spec.default);
            spec.check(value)?;
            if !value.is_null() {
                values.insert(spec.id.clone(), value.clone());
            }
        }
        for key in bound.keys().filter(|k| !specs.iter().any(|s| &s.id == *k)) {
            tracing::debug!(option = %key, "ignoring undeclared option");
        }
        Ok(Self { values })
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    /// Text value
    #[must_use]
    pub fn text(&self, id: &str) -> Option<&str> {
        self.values.get(id).and_then(Value::as_str)
    }

    /// Boolean value (unset = `false`)
    #[must_use]
    pub fn flag(&self, id: &str) -> bool {
        self.values.get(id).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Number value
    #[must_use]
    pub fn number(&self, id: &str) -> Option<f64> {
        self.values.get(id).and_then(Value::as_f64)
    }

    /// Value rendered for text substitution
    #[must_use]
    pub fn display(&self, id: &str) -> Option<String> {
        match self.values.get(id)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Context handed to a step alongside its input
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Draft being compiled
    pub draft: Arc<DraftSnapshot>,
    /// Workflow name
    pub workflow: String,
    /// Position of the step in the workflow
    pub position: usize,
}

impl StepContext {
    /// Draft title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.draft.draft.title
    }
}

/// Where a registered step came from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepOrigin {
    /// Shipped with the engine
    Builtin,
    /// Loaded from a user script
    UserScript(VaultPath),
}

impl fmt::Display for StepOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("built-in"),
            Self::UserScript(path) => write!(f, "script {path}"),
        }
    }
}

/// Workflow transformation
///
/// # Contract
/// `execute` is a pure function of its input, options and context. It must
/// return a value of the descriptor's output kind or an error.
pub trait Step: Send + Sync + fmt::Debug {
    /// Static description
    fn descriptor(&self) -> &StepDescriptor;

    /// Transform the input
    ///
    /// # Errors
    /// Returns error if the transformation cannot be applied
    fn execute(
        &self,
        input: StepValue,
        options: &StepOptions,
        context: &StepContext,
    ) -> Result<StepValue, StepError>;

    /// Registry key
    fn id(&self) -> &str {
        &self.descriptor().id
    }
}
