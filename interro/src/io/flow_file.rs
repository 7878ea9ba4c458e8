//! Flow definitions stored as TOML.
//!
//! ```toml
//! entry = "TOS"
//!
//! [[question]]
//! name = "TOS"
//! kind = "yes_no"
//! prompt = "Do you agree to the TOS?"
//! default_next = "noTOS"
//! branches = [{ when = true, goto = "email" }]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::core::flow::validate_flow;
use crate::core::question::Question;
use crate::core::rules::Rule;
use crate::core::value::Value;
use crate::engine::Engine;
use crate::error::EngineError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FlowFile {
    entry: String,
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default, rename = "question")]
    questions: Vec<QuestionSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KindSpec {
    Text,
    YesNo,
    Number,
    Message,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuestionSpec {
    name: String,
    kind: KindSpec,
    #[serde(default)]
    prompt: String,
    intro: Option<String>,
    #[serde(default)]
    confirm: bool,
    default_next: Option<String>,
    #[serde(default)]
    allow_empty: bool,
    #[serde(default)]
    positive_only: bool,
    #[serde(default)]
    integer_only: bool,
    #[serde(default)]
    branches: Vec<BranchSpec>,
    #[serde(default)]
    rules: Vec<RuleSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BranchSpec {
    when: Value,
    goto: String,
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    #[serde(flatten)]
    check: CheckSpec,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CheckSpec {
    Contains(String),
    Matches(String),
    MinLength(usize),
    MaxLength(usize),
    AtLeast(f64),
    AtMost(f64),
    OneOf(Vec<String>),
}

impl CheckSpec {
    fn into_rule(self) -> Result<Rule> {
        Ok(match self {
            CheckSpec::Contains(needle) => Rule::Contains(needle),
            CheckSpec::Matches(pattern) => Rule::Matches(
                Regex::new(&pattern).with_context(|| format!("compile regex {:?}", pattern))?,
            ),
            CheckSpec::MinLength(n) => Rule::MinLength(n),
            CheckSpec::MaxLength(n) => Rule::MaxLength(n),
            CheckSpec::AtLeast(n) => Rule::AtLeast(n),
            CheckSpec::AtMost(n) => Rule::AtMost(n),
            CheckSpec::OneOf(options) => Rule::OneOf(options),
        })
    }
}

impl QuestionSpec {
    fn into_question(self) -> Result<Question> {
        let name = self.name;
        if self.allow_empty && self.kind != KindSpec::Text {
            bail!("{}: allow_empty only applies to text questions", name);
        }
        if (self.positive_only || self.integer_only) && self.kind != KindSpec::Number {
            bail!(
                "{}: positive_only/integer_only only apply to number questions",
                name
            );
        }
        if self.kind == KindSpec::Message && !self.prompt.is_empty() {
            bail!("{}: message questions take `intro`, not `prompt`", name);
        }

        let mut question = match self.kind {
            KindSpec::Text => Question::text(name.as_str(), self.prompt),
            KindSpec::YesNo => Question::yes_no(name.as_str(), self.prompt),
            KindSpec::Number => Question::number(name.as_str(), self.prompt),
            KindSpec::Message => Question::message(name.as_str(), String::new()),
        };
        if let Some(intro) = self.intro {
            question = question.intro(intro);
        }
        if self.confirm {
            question = question.confirm();
        }
        if let Some(next) = self.default_next {
            question = question.default_next(next);
        }
        if self.allow_empty {
            question = question.allow_empty();
        }
        if self.positive_only {
            question = question.positive_only();
        }
        if self.integer_only {
            question = question.integer_only();
        }
        for branch in self.branches {
            question = question.branch(branch.when, branch.goto);
        }
        for spec in self.rules {
            let rule = spec
                .check
                .into_rule()
                .with_context(|| format!("{}: invalid rule", name))?;
            question = question.validator(rule, spec.message);
        }
        Ok(question)
    }
}

/// A loaded flow: entry point, wording and question templates.
#[derive(Debug, Clone)]
pub struct Flow {
    pub entry: String,
    pub config: EngineConfig,
    pub questions: Vec<Question>,
}

impl Flow {
    /// Structural problems with the flow (empty on success): duplicate or empty
    /// names, then the graph checks the engine runs on `start`.
    pub fn check(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut index: HashMap<String, Question> = HashMap::new();
        for question in &self.questions {
            if question.name().is_empty() {
                errors.push("question name must not be empty".to_string());
                continue;
            }
            if index.contains_key(question.name()) {
                errors.push(format!("duplicate question '{}'", question.name()));
                continue;
            }
            index.insert(question.name().to_string(), question.clone());
        }
        errors.extend(validate_flow(&index, &self.entry));
        errors
    }

    /// Fresh, unstarted engine with every question registered.
    pub fn engine(&self) -> Result<Engine, EngineError> {
        let mut engine = Engine::new().with_config(self.config.clone())?;
        for question in &self.questions {
            engine.register(question.clone())?;
        }
        Ok(engine)
    }
}

/// Parse a flow definition from TOML text.
pub fn parse_flow(contents: &str) -> Result<Flow> {
    let file: FlowFile = toml::from_str(contents).context("parse flow toml")?;
    file.engine.validate().context("invalid [engine] table")?;
    let questions = file
        .questions
        .into_iter()
        .map(QuestionSpec::into_question)
        .collect::<Result<Vec<_>>>()?;
    Ok(Flow {
        entry: file.entry,
        config: file.engine,
        questions,
    })
}

/// Load a flow definition from a TOML file.
pub fn load_flow(path: &Path) -> Result<Flow> {
    debug!(path = %path.display(), "loading flow");
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let flow = parse_flow(&contents).with_context(|| format!("load {}", path.display()))?;
    debug!(entry = %flow.entry, questions = flow.questions.len(), "flow loaded");
    Ok(flow)
}
