//! Test-only helpers: the canonical TOS signup flow in code and on disk.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::core::question::Question;
use crate::engine::Engine;

/// TOML form of [`tos_questions`].
pub const TOS_FLOW_TOML: &str = include_str!("../flows/tos.toml");

/// `TOS` (yes -> `email`, else `noTOS`), `email` (confirmed, -> `age`),
/// `age` (positive number, end), `noTOS` (terminal message).
pub fn tos_questions() -> Vec<Question> {
    vec![
        Question::yes_no("TOS", "Do you agree to the TOS?")
            .branch(true, "email")
            .default_next("noTOS"),
        Question::text("email", "What is your email address?")
            .intro("We will not share this with bad people")
            .check(|s| s.contains('@'), "Invalid address.")
            .confirm()
            .default_next("age"),
        Question::number("age", "How old are you?").positive_only(),
        Question::message("noTOS", "Well, that's unfortunate. Bye!"),
    ]
}

/// Unstarted engine with the TOS flow registered.
pub fn tos_engine() -> Engine {
    let mut engine = Engine::new();
    for question in tos_questions() {
        engine
            .register(question)
            .expect("tos questions have unique names");
    }
    engine
}

/// TOS engine started at `TOS`; its prompt is still buffered.
pub fn started_tos_engine() -> Engine {
    let mut engine = tos_engine();
    engine.start("TOS").expect("tos flow is valid");
    engine
}

/// Write `contents` to `flow.toml` in a fresh temp dir. Keep the `TempDir`
/// alive for as long as the path is used.
pub fn write_flow_file(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("flow.toml");
    fs::write(&path, contents).expect("write flow file");
    (dir, path)
}
