//! Deterministic, pure logic behind the engine.
//!
//! Core modules are free of I/O. They define question templates, their
//! validation and coercion rules, and the structural checks on a question
//! graph.

pub mod flow;
pub mod question;
pub mod rules;
pub mod value;
