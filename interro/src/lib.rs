//! Conversational data collection.
//!
//! A set of questions with validation rules, optional confirmation rounds and
//! answer-dependent branching is walked one answer at a time. The engine never
//! performs I/O: callers feed raw answers in and relay the messages it emits,
//! so the same flow can run behind a terminal, a chat bot or a web handler.
//!
//! - **[`core`]**: Question templates, rules, values and graph checks. Pure.
//! - **[`engine`]**: The state machine sequencing questions and confirmations.
//! - **[`io`]**: TOML flow files and a line-oriented terminal driver.
//!
//! ```
//! use interro::{Engine, Question, Value};
//!
//! let mut engine = Engine::new();
//! engine.register(Question::yes_no("tos", "Do you agree?")).unwrap();
//! engine.start("tos").unwrap();
//! assert_eq!(engine.drain_messages(), vec!["Do you agree?".to_string()]);
//!
//! engine.answer("yes").unwrap();
//! assert!(engine.is_complete());
//! assert_eq!(engine.results()["tos"], Value::Bool(true));
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod sink;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::config::EngineConfig;
pub use crate::core::question::{Question, QuestionKind};
pub use crate::core::rules::{Rule, Validator};
pub use crate::core::value::Value;
pub use crate::engine::{Engine, EngineState};
pub use crate::error::EngineError;
pub use crate::sink::{MessageBuffer, MessageSink};
