//! Engine wording, configurable per flow (`[engine]` table of a flow file).

use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const DEFAULT_CONFIRM_TEMPLATE: &str = "You entered {{ value }}.  Are you certain? [yes/no]";
pub const DEFAULT_ERROR_PREFIX: &str = "Error: ";

/// Text the engine wraps around user-facing messages.
///
/// Missing fields default to the built-in English wording.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// minijinja template for the confirmation prompt; `value` is the raw answer.
    pub confirm_template: String,

    /// Prepended to every validation error message.
    pub error_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confirm_template: DEFAULT_CONFIRM_TEMPLATE.to_string(),
            error_prefix: DEFAULT_ERROR_PREFIX.to_string(),
        }
    }
}

impl EngineConfig {
    /// The confirmation template must render and must echo the answer back.
    pub fn validate(&self) -> Result<(), EngineError> {
        const PROBE: &str = "\u{1f}probe\u{1f}";
        let rendered = self.render_confirmation(PROBE)?;
        if !rendered.contains(PROBE) {
            return Err(EngineError::Template(
                "confirm_template must reference `value`".to_string(),
            ));
        }
        Ok(())
    }

    pub fn render_confirmation(&self, raw: &str) -> Result<String, EngineError> {
        Environment::new()
            .render_str(&self.confirm_template, context! { value => raw })
            .map_err(|err| EngineError::Template(err.to_string()))
    }

    pub fn format_error(&self, message: &str) -> String {
        format!("{}{}", self.error_prefix, message)
    }
}
