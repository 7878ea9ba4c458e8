//! Validation rules applied to preprocessed answers.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

/// Predicate shared between clones of a question template.
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A single check against a preprocessed answer.
#[derive(Clone)]
pub enum Rule {
    /// Input contains the given substring.
    Contains(String),
    /// Input matches the regular expression somewhere.
    Matches(Regex),
    /// Input has at least this many characters.
    MinLength(usize),
    /// Input has at most this many characters.
    MaxLength(usize),
    /// Input parses as a number `>=` the bound.
    AtLeast(f64),
    /// Input parses as a number `<=` the bound.
    AtMost(f64),
    /// Input equals one of the listed options.
    OneOf(Vec<String>),
    /// Caller-supplied predicate.
    Custom(Predicate),
}

impl Rule {
    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Rule::Custom(Arc::new(check))
    }

    pub fn check(&self, input: &str) -> bool {
        match self {
            Rule::Contains(needle) => input.contains(needle.as_str()),
            Rule::Matches(re) => re.is_match(input),
            Rule::MinLength(min) => input.chars().count() >= *min,
            Rule::MaxLength(max) => input.chars().count() <= *max,
            Rule::AtLeast(bound) => parse_number(input).is_some_and(|n| n >= *bound),
            Rule::AtMost(bound) => parse_number(input).is_some_and(|n| n <= *bound),
            Rule::OneOf(options) => options.iter().any(|opt| opt == input),
            Rule::Custom(check) => check(input),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Contains(needle) => f.debug_tuple("Contains").field(needle).finish(),
            Rule::Matches(re) => f.debug_tuple("Matches").field(&re.as_str()).finish(),
            Rule::MinLength(n) => f.debug_tuple("MinLength").field(n).finish(),
            Rule::MaxLength(n) => f.debug_tuple("MaxLength").field(n).finish(),
            Rule::AtLeast(n) => f.debug_tuple("AtLeast").field(n).finish(),
            Rule::AtMost(n) => f.debug_tuple("AtMost").field(n).finish(),
            Rule::OneOf(options) => f.debug_tuple("OneOf").field(options).finish(),
            Rule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A rule paired with the message shown when it fails.
#[derive(Debug, Clone)]
pub struct Validator {
    pub rule: Rule,
    pub message: String,
}

impl Validator {
    pub fn new(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

/// Run validators in order; return the message of the first one that fails.
pub fn first_failure<'a, I>(validators: I, input: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a Validator>,
{
    validators
        .into_iter()
        .find(|validator| !validator.rule.check(input))
        .map(|validator| validator.message.as_str())
}

/// Parse a finite number. `inf`/`NaN` are not answers anyone means to give.
pub fn parse_number(input: &str) -> Option<f64> {
    input.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// The integer a float represents exactly, if it is whole and fits in `i64`.
pub fn whole_number(n: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (n.fract() == 0.0 && (-LIMIT..LIMIT).contains(&n)).then_some(n as i64)
}
