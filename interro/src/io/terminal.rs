//! Line-oriented driver: one answer per input line.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::value::Value;
use crate::engine::{Engine, EngineState};

/// Marker written before each answer is read.
pub const INPUT_MARKER: &str = "> ";

/// Why [`drive`] returned.
#[derive(Debug, Clone, PartialEq)]
pub enum DriveOutcome {
    /// The flow completed; all collected answers.
    Complete(BTreeMap<String, Value>),
    /// Input ended first; whatever had been collected.
    InputClosed(BTreeMap<String, Value>),
}

/// Run a conversation over `input`/`output` until it completes or input ends.
///
/// Starts the engine at `entry` if it has not been started yet. Every message
/// the engine emits is written on its own line.
pub fn drive<R: BufRead, W: Write>(
    engine: &mut Engine,
    entry: &str,
    mut input: R,
    mut output: W,
) -> Result<DriveOutcome> {
    if engine.state() == EngineState::NotStarted {
        engine.start(entry).context("start conversation")?;
    }
    write_messages(engine, &mut output)?;

    let mut line = String::new();
    while !engine.is_complete() {
        output.write_all(INPUT_MARKER.as_bytes())?;
        output.flush().context("flush output")?;

        line.clear();
        let read = input.read_line(&mut line).context("read answer")?;
        if read == 0 {
            debug!(current = ?engine.current(), "input closed before completion");
            writeln!(output)?;
            return Ok(DriveOutcome::InputClosed(engine.results()));
        }
        engine
            .answer(line.trim_end_matches(['\r', '\n']))
            .context("answer")?;
        write_messages(engine, &mut output)?;
    }

    Ok(DriveOutcome::Complete(engine.results()))
}

fn write_messages<W: Write>(engine: &mut Engine, output: &mut W) -> Result<()> {
    for message in engine.drain_messages() {
        writeln!(output, "{}", message).context("write message")?;
    }
    Ok(())
}
