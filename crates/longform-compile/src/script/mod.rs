//! User-script steps
//!
//! Scripts are declarative documents compiled into [`ScriptStep`] values by
//! a restricted evaluator. Each file compiles on its own; a failure never
//! affects another script.

mod definition;

pub use definition::{
    parse_definition, OpDef, ScriptDefinition, ScriptOption, ScriptOptionType, ScriptSyntax,
};

use crate::builtin::expand_scene_vars;
use crate::error::StepError;
use crate::step::{OptionSpec, OptionType, Step, StepContext, StepDescriptor, StepOptions};
use crate::text;
use crate::value::{StepKind, StepValue};
use longform_model::{frontmatter, SceneText, VaultPath, SCENE_SEPARATOR};
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

/// Option consulted by `scenes → text` scripts to join scenes
pub const SEPARATOR_OPTION: &str = "separator";

#[derive(Debug, Clone)]
enum Op {
    Uppercase,
    Lowercase,
    Trim,
    StripFrontmatter,
    RemoveComments,
    RemoveLinks,
    Prepend(String),
    Append(String),
    Replace { pattern: Regex, with: String },
    When { option: String, then: Vec<Op>, otherwise: Vec<Op> },
}

/// Step compiled from a user script
#[derive(Debug, Clone)]
pub struct ScriptStep {
    descriptor: StepDescriptor,
    source: VaultPath,
    ops: Vec<Op>,
}

impl ScriptStep {
    /// Compile a parsed definition
    ///
    /// # Errors
    /// Returns a reason when the definition does not describe a valid step
    pub fn compile(definition: ScriptDefinition, source: VaultPath) -> Result<Self, String> {
        if definition.id.trim().is_empty() {
            return Err("step id must not be empty".to_string());
        }
        match (definition.input, definition.output) {
            (StepKind::Scenes | StepKind::Draft, StepKind::Scenes | StepKind::Text)
            | (StepKind::Text, StepKind::Text) => {}
            (input, output) => {
                return Err(format!("unsupported kinds {input} -> {output}"));
            }
        }

        let mut options = Vec::with_capacity(definition.options.len());
        for option in &definition.options {
            options.push(compile_option(option)?);
        }
        let ops = compile_ops(&definition.ops, &options)?;

        let mut descriptor = StepDescriptor::new(
            definition.id.clone(),
            definition.name.unwrap_or(definition.id),
            definition.input,
            definition.output,
        )
        .with_description(definition.description)
        .with_version(definition.version);
        descriptor.options = options;

        Ok(Self {
            descriptor,
            source,
            ops,
        })
    }

    /// Script this step was compiled from
    #[inline]
    #[must_use]
    pub fn source(&self) -> &VaultPath {
        &self.source
    }

    fn apply(&self, text: &str, vars: &Vars<'_>) -> String {
        apply_ops(&self.ops, text.to_string(), vars)
    }
}

fn compile_option(option: &ScriptOption) -> Result<OptionSpec, String> {
    if option.id.trim().is_empty() {
        return Err("option id must not be empty".to_string());
    }
    let kind = match option.kind {
        ScriptOptionType::Text => OptionType::Text {
            choices: option.choices.clone(),
        },
        ScriptOptionType::Boolean => OptionType::Boolean,
        ScriptOptionType::Number => OptionType::Number {
            min: option.min,
            max: option.max,
        },
    };
    let spec = OptionSpec::new(
        option.id.clone(),
        option.name.clone().unwrap_or_else(|| option.id.clone()),
        kind,
        option.default.clone(),
    )
    .with_description(option.description.clone());
    spec.check(&spec.default)
        .map_err(|e| format!("bad default: {e}"))?;
    Ok(spec)
}

fn compile_ops(defs: &[OpDef], options: &[OptionSpec]) -> Result<Vec<Op>, String> {
    defs.iter()
        .map(|def| {
            Ok(match def {
                OpDef::Uppercase => Op::Uppercase,
                OpDef::Lowercase => Op::Lowercase,
                OpDef::Trim => Op::Trim,
                OpDef::StripFrontmatter => Op::StripFrontmatter,
                OpDef::RemoveComments => Op::RemoveComments,
                OpDef::RemoveLinks => Op::RemoveLinks,
                OpDef::Prepend(t) => Op::Prepend(t.clone()),
                OpDef::Append(t) => Op::Append(t.clone()),
                OpDef::Replace { pattern, with } => Op::Replace {
                    pattern: Regex::new(pattern).map_err(|e| format!("bad pattern: {e}"))?,
                    with: with.clone(),
                },
                OpDef::When {
                    option,
                    then,
                    otherwise,
                } => {
                    let declared = options.iter().find(|o| &o.id == option);
                    if !matches!(declared.map(|o| &o.kind), Some(OptionType::Boolean)) {
                        return Err(format!("'when' needs a boolean option, got '{option}'"));
                    }
                    Op::When {
                        option: option.clone(),
                        then: compile_ops(then, options)?,
                        otherwise: compile_ops(otherwise, options)?,
                    }
                }
            })
        })
        .collect()
}

struct Vars<'a> {
    options: &'a StepOptions,
    title: &'a str,
    index: usize,
}

impl Vars<'_> {
    fn expand(&self, template: &str) -> String {
        let with_options = text::substitute(template, |key| {
            self.options.display(key).map(Cow::Owned)
        });
        expand_scene_vars(&with_options, self.title, self.index)
    }

    // Same as `expand` but keeps substituted text literal inside a regex
    // replacement template.
    fn expand_replacement(&self, template: &str) -> String {
        let escape = |s: &str| s.replace('$', "$$");
        let with_options = text::substitute(template, |key| {
            self.options.display(key).map(|v| Cow::Owned(escape(&v)))
        });
        with_options
            .replace("$title", &escape(self.title))
            .replace("$index", &(self.index + 1).to_string())
    }
}

fn apply_ops(ops: &[Op], mut text: String, vars: &Vars<'_>) -> String {
    for op in ops {
        text = match op {
            Op::Uppercase => text.to_uppercase(),
            Op::Lowercase => text.to_lowercase(),
            Op::Trim => text.trim().to_string(),
            Op::StripFrontmatter => frontmatter::strip(&text).to_string(),
            Op::RemoveComments => text::remove_comments(&text).into_owned(),
            Op::RemoveLinks => text::remove_links(&text),
            Op::Prepend(t) => format!("{}{text}", vars.expand(t)),
            Op::Append(t) => format!("{text}{}", vars.expand(t)),
            Op::Replace { pattern, with } => pattern
                .replace_all(&text, vars.expand_replacement(with).as_str())
                .into_owned(),
            Op::When {
                option,
                then,
                otherwise,
            } => {
                let branch = if vars.options.flag(option) { then } else { otherwise };
                apply_ops(branch, text, vars)
            }
        };
    }
    text
}

impl Step for ScriptStep {
    fn descriptor(&self) -> &StepDescriptor {
        &self.descriptor
    }

    fn execute(
        &self,
        input: StepValue,
        options: &StepOptions,
        context: &StepContext,
    ) -> Result<StepValue, StepError> {
        let scenes: Vec<SceneText> = match input {
            StepValue::Text(body) => {
                let vars = Vars {
                    options,
                    title: context.title(),
                    index: 0,
                };
                return Ok(StepValue::Text(self.apply(&body, &vars)));
            }
            StepValue::Scenes(scenes) => scenes,
            StepValue::Draft(snapshot) => snapshot.scenes.clone(),
        };

        let transformed: Vec<SceneText> = scenes
            .into_iter()
            .enumerate()
            .map(|(index, mut scene)| {
                let vars = Vars {
                    options,
                    title: &scene.title,
                    index,
                };
                scene.content = self.apply(&scene.content, &vars);
                scene
            })
            .collect();

        match self.descriptor.output {
            StepKind::Scenes => Ok(StepValue::Scenes(transformed)),
            StepKind::Text => {
                let separator = match options.get(SEPARATOR_OPTION) {
                    Some(Value::String(s)) => s.as_str(),
                    _ => SCENE_SEPARATOR,
                };
                let joined = transformed
                    .iter()
                    .map(|s| s.content.as_str())
                    .collect::<Vec<_>>()
                    .join(separator);
                Ok(StepValue::Text(joined))
            }
            StepKind::Draft => Err(StepError::failed("scripts cannot produce a draft")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use longform_model::{Draft, DraftSnapshot};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};
    use std::sync::Arc;

    fn compile(source: &str) -> Result<ScriptStep, String> {
        let def = parse_definition(source, ScriptSyntax::Yaml)?;
        ScriptStep::compile(def, VaultPath::new("Scripts/test.yaml").unwrap())
    }

    fn context() -> StepContext {
        let draft = Draft::new(VaultPath::new("Novel/Index.md").unwrap(), "Novel");
        StepContext {
            draft: Arc::new(DraftSnapshot::new(draft, Vec::new())),
            workflow: "w".to_string(),
            position: 0,
        }
    }

    fn run(step: &ScriptStep, input: StepValue, bound: &Map<String, Value>) -> StepValue {
        let options = StepOptions::resolve(&step.descriptor().options, bound).unwrap();
        step.execute(input, &options, &context()).unwrap()
    }

    fn scene(title: &str, content: &str) -> SceneText {
        SceneText {
            title: title.to_string(),
            path: VaultPath::new(format!("Novel/{title}.md")).unwrap(),
            indent: 0,
            content: content.to_string(),
        }
    }

    #[test]
    fn text_script_with_placeholders() {
        let step = compile(
            "id: shout\ninput: text\noutput: text\noptions:\n  - id: mark\n    type: text\n    default: '!'\nops:\n  - uppercase\n  - append: '{{mark}}'\n",
        )
        .unwrap();
        assert_eq!(step.descriptor().name, "shout");
        let out = run(&step, StepValue::Text("hello".into()), &Map::new());
        assert_eq!(out, StepValue::Text("HELLO!".into()));

        let mut bound = Map::new();
        bound.insert("mark".into(), json!("?"));
        let out = run(&step, StepValue::Text("hi".into()), &bound);
        assert_eq!(out, StepValue::Text("HI?".into()));
    }

    #[test]
    fn scenes_script_uses_scene_vars() {
        let step = compile(
            "id: number\ninput: scenes\noutput: scenes\nops:\n  - prepend: '$index. $title: '\n",
        )
        .unwrap();
        let out = run(
            &step,
            StepValue::Scenes(vec![scene("A", "one"), scene("B", "two")]),
            &Map::new(),
        );
        assert_eq!(
            out,
            StepValue::Scenes(vec![scene("A", "1. A: one"), scene("B", "2. B: two")])
        );
    }

    #[test]
    fn scenes_to_text_joins_with_separator_option() {
        let step = compile(
            "id: join\ninput: scenes\noutput: text\noptions:\n  - id: separator\n    type: text\n    default: ' | '\nops:\n  - trim\n",
        )
        .unwrap();
        let out = run(
            &step,
            StepValue::Scenes(vec![scene("A", " one "), scene("B", "two\n")]),
            &Map::new(),
        );
        assert_eq!(out, StepValue::Text("one | two".into()));
    }

    #[test]
    fn when_branches_on_boolean() {
        let step = compile(
            "id: maybe\ninput: text\noutput: text\noptions:\n  - id: loud\n    type: boolean\n    default: false\nops:\n  - when:\n      option: loud\n      then: [uppercase]\n      otherwise: [lowercase]\n",
        )
        .unwrap();
        assert_eq!(
            run(&step, StepValue::Text("MiXeD".into()), &Map::new()),
            StepValue::Text("mixed".into())
        );
        let mut bound = Map::new();
        bound.insert("loud".into(), json!(true));
        assert_eq!(
            run(&step, StepValue::Text("MiXeD".into()), &bound),
            StepValue::Text("MIXED".into())
        );
    }

    #[test]
    fn replace_keeps_substituted_dollars_literal() {
        let step = compile(
            "id: price\ninput: text\noutput: text\noptions:\n  - id: cost\n    type: text\n    default: '$5'\nops:\n  - replace: { pattern: 'PRICE', with: '{{cost}}' }\n",
        )
        .unwrap();
        assert_eq!(
            run(&step, StepValue::Text("It is PRICE.".into()), &Map::new()),
            StepValue::Text("It is $5.".into())
        );
    }

    #[test]
    fn compile_rejects_bad_scripts() {
        assert!(compile("id: ''\ninput: text\noutput: text\n").is_err());
        assert!(compile("id: x\ninput: text\noutput: scenes\n").is_err());
        assert!(compile("id: x\ninput: text\noutput: text\nops:\n  - replace: { pattern: '(', with: '' }\n").is_err());
        assert!(compile("id: x\ninput: text\noutput: text\nops:\n  - when: { option: nope, then: [trim] }\n").is_err());
        assert!(compile("id: x\ninput: text\noutput: text\noptions:\n  - id: n\n    type: number\n    default: 10\n    max: 5\n").is_err());
    }
}
