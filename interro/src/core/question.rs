//! Question templates: prompt, validation pipeline, coercion and branching.
//!
//! A [`Question`] is immutable once built. Per-conversation state (the stored
//! value and the last validation error) lives in the engine, so a template can
//! be cloned into any number of independent engines.

use crate::core::rules::{Rule, Validator, first_failure, parse_number, whole_number};
use crate::core::value::Value;
use crate::error::EngineError;

/// Tokens accepted as "yes", after trimming and lower-casing.
pub const AFFIRMATIVE: &[&str] = &["y", "yes"];
/// Tokens accepted as "no", after trimming and lower-casing.
pub const NEGATIVE: &[&str] = &["n", "no"];

pub const EMPTY_ERROR: &str = "This may not be empty.";
pub const YES_NO_ERROR: &str = "Please enter yes or no.";
pub const NUMBER_ERROR: &str = "Please enter a number.";
pub const WHOLE_NUMBER_ERROR: &str = "Please enter a whole number.";
pub const POSITIVE_ERROR: &str = "Please enter a positive number.";

/// True if `raw` is an affirmative token (case-insensitive, surrounding
/// whitespace ignored).
pub fn is_affirmative(raw: &str) -> bool {
    let token = raw.trim().to_lowercase();
    AFFIRMATIVE.contains(&token.as_str())
}

fn is_yes_no(token: &str) -> bool {
    AFFIRMATIVE.contains(&token) || NEGATIVE.contains(&token)
}

/// Closed set of question variants. Each contributes its own preprocessing,
/// type-level checks and coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Text { allow_empty: bool },
    YesNo,
    Number { positive_only: bool, integer_only: bool },
    Message,
}

impl QuestionKind {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::Text { .. } => "text",
            QuestionKind::YesNo => "yes_no",
            QuestionKind::Number { .. } => "number",
            QuestionKind::Message => "message",
        }
    }

    /// Whether a branch keyed on `key` could ever match a value of this kind.
    pub fn accepts_branch_key(&self, key: &Value) -> bool {
        match self {
            QuestionKind::Text { .. } => matches!(key, Value::Text(_)),
            QuestionKind::YesNo => matches!(key, Value::Bool(_)),
            QuestionKind::Number { .. } => key.is_numeric(),
            QuestionKind::Message => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Question {
    name: String,
    prompt: String,
    intro: Option<String>,
    confirm: bool,
    default_next: Option<String>,
    branches: Vec<(Value, String)>,
    validators: Vec<Validator>,
    kind: QuestionKind,
}

impl Question {
    fn new(kind: QuestionKind, name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            intro: None,
            confirm: false,
            default_next: None,
            branches: Vec::new(),
            validators: Vec::new(),
            kind,
        }
    }

    /// Free-text question. Rejects empty answers unless [`allow_empty`](Self::allow_empty).
    pub fn text(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(QuestionKind::Text { allow_empty: false }, name, prompt)
    }

    /// Yes/no question; stores a boolean.
    pub fn yes_no(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(QuestionKind::YesNo, name, prompt)
    }

    /// Numeric question; stores an integer when the answer is whole, else a float.
    pub fn number(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(
            QuestionKind::Number {
                positive_only: false,
                integer_only: false,
            },
            name,
            prompt,
        )
    }

    /// Prompt-less node that delivers `message` and ends the flow.
    pub fn message(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(QuestionKind::Message, name, String::new()).intro(message)
    }

    pub fn intro(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.intro = (!message.is_empty()).then_some(message);
        self
    }

    /// Require a yes/no confirmation round after a valid answer.
    pub fn confirm(mut self) -> Self {
        self.confirm = true;
        self
    }

    pub fn default_next(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.default_next = (!name.is_empty()).then_some(name);
        self
    }

    /// Move to `target` when the parsed answer equals `when`.
    pub fn branch(mut self, when: impl Into<Value>, target: impl Into<String>) -> Self {
        self.branches.push((when.into(), target.into()));
        self
    }

    /// Append a user rule. User rules run after the kind's own checks.
    pub fn validator(mut self, rule: Rule, message: impl Into<String>) -> Self {
        self.validators.push(Validator::new(rule, message));
        self
    }

    /// Append a closure rule.
    pub fn check<F>(self, check: F, message: impl Into<String>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.validator(Rule::custom(check), message)
    }

    /// Text only: accept empty answers. No effect on other kinds.
    pub fn allow_empty(mut self) -> Self {
        if let QuestionKind::Text { allow_empty } = &mut self.kind {
            *allow_empty = true;
        }
        self
    }

    /// Number only: require a value greater than zero.
    pub fn positive_only(mut self) -> Self {
        if let QuestionKind::Number { positive_only, .. } = &mut self.kind {
            *positive_only = true;
        }
        self
    }

    /// Number only: reject fractional answers.
    pub fn integer_only(mut self) -> Self {
        if let QuestionKind::Number { integer_only, .. } = &mut self.kind {
            *integer_only = true;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn intro_message(&self) -> Option<&str> {
        self.intro.as_deref()
    }

    pub fn requires_confirmation(&self) -> bool {
        self.confirm
    }

    pub fn default_target(&self) -> Option<&str> {
        self.default_next.as_deref()
    }

    pub fn branches(&self) -> &[(Value, String)] {
        &self.branches
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    /// A node without a prompt never waits for an answer; reaching it ends the flow.
    pub fn is_terminal(&self) -> bool {
        self.prompt.is_empty()
    }

    /// Normalize raw input before validation and parsing.
    pub fn preprocess(&self, raw: &str) -> String {
        match self.kind {
            QuestionKind::Text { .. } | QuestionKind::Number { .. } => raw.trim().to_string(),
            QuestionKind::YesNo => raw.trim().to_lowercase(),
            QuestionKind::Message => raw.to_string(),
        }
    }

    /// Run the kind's checks, then user rules, against the preprocessed input.
    ///
    /// Returns the message of the first failing check. Never touches stored state.
    pub fn validate(&self, raw: &str) -> Result<(), String> {
        let input = self.preprocess(raw);
        if let Some(message) = self.type_failure(&input) {
            return Err(message.to_string());
        }
        match first_failure(&self.validators, &input) {
            Some(message) => Err(message.to_string()),
            None => Ok(()),
        }
    }

    fn type_failure(&self, input: &str) -> Option<&'static str> {
        match self.kind {
            QuestionKind::Text { allow_empty } => {
                (!allow_empty && input.is_empty()).then_some(EMPTY_ERROR)
            }
            QuestionKind::YesNo => (!is_yes_no(input)).then_some(YES_NO_ERROR),
            QuestionKind::Number {
                positive_only,
                integer_only,
            } => {
                let Some(number) = parse_number(input) else {
                    return Some(NUMBER_ERROR);
                };
                if integer_only && whole_number(number).is_none() {
                    return Some(WHOLE_NUMBER_ERROR);
                }
                if positive_only && number <= 0.0 {
                    return Some(POSITIVE_ERROR);
                }
                None
            }
            QuestionKind::Message => None,
        }
    }

    /// Coerce already-validated input into the question's value type.
    ///
    /// A failure here means the kind's checks accepted something its parser
    /// cannot handle; it is reported as [`EngineError::Coercion`].
    pub fn parse(&self, raw: &str) -> Result<Value, EngineError> {
        let input = self.preprocess(raw);
        match self.kind {
            QuestionKind::Text { .. } | QuestionKind::Message => Ok(Value::Text(input)),
            QuestionKind::YesNo => Ok(Value::Bool(AFFIRMATIVE.contains(&input.as_str()))),
            QuestionKind::Number { integer_only, .. } => {
                if let Ok(n) = input.parse::<i64>() {
                    return Ok(Value::Int(n));
                }
                let number = parse_number(&input).ok_or_else(|| EngineError::Coercion {
                    question: self.name.clone(),
                    input: raw.to_string(),
                    reason: "not a finite number".to_string(),
                })?;
                match whole_number(number) {
                    Some(n) if integer_only => Ok(Value::Int(n)),
                    _ => Ok(Value::Float(number)),
                }
            }
        }
    }

    /// Resolve the next question from the stored value: a matching branch
    /// wins, otherwise `default_next`. `None` means the flow ends here.
    pub fn next_target(&self, value: Option<&Value>) -> Option<&str> {
        value
            .and_then(|value| {
                self.branches
                    .iter()
                    .find(|(when, _)| when == value)
                    .map(|(_, target)| target.as_str())
            })
            .or(self.default_next.as_deref())
    }
}
