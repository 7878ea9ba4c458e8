//! `interro`: run a TOML question flow in the terminal.
//!
//! Prompts and messages go to stdout, one per line; answers are read from
//! stdin, one per line. The collected results are printed as JSON at the end.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use interro::exit_codes;
use interro::io::flow_file::load_flow;
use interro::io::terminal::{DriveOutcome, drive};
use interro::logging;

#[derive(Parser)]
#[command(
    name = "interro",
    version,
    about = "Conversational data collection from a question flow"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the flow's questions on stdin/stdout and print the results as JSON.
    Run {
        /// Path to the flow definition (TOML).
        flow: PathBuf,
    },
    /// Check a flow definition for dangling targets, duplicates and bad rules.
    Check {
        /// Path to the flow definition (TOML).
        flow: PathBuf,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run { flow } => cmd_run(&flow),
        Command::Check { flow } => cmd_check(&flow),
    }
}

fn cmd_run(path: &Path) -> Result<i32> {
    let flow = load_flow(path)?;
    let mut engine = flow
        .engine()
        .with_context(|| format!("build engine from {}", path.display()))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let outcome = drive(&mut engine, &flow.entry, stdin.lock(), stdout.lock())?;

    let (results, code) = match outcome {
        DriveOutcome::Complete(results) => (results, exit_codes::OK),
        DriveOutcome::InputClosed(results) => (results, exit_codes::INCOMPLETE),
    };
    info!(answered = results.len(), exit_code = code, "run finished");
    let payload = serde_json::to_string_pretty(&results).context("serialize results")?;
    println!("{}", payload);
    Ok(code)
}

fn cmd_check(path: &Path) -> Result<i32> {
    let flow = load_flow(path)?;
    let errors = flow.check();
    if !errors.is_empty() {
        bail!("invalid flow:\n- {}", errors.join("\n- "));
    }
    println!("ok");
    Ok(exit_codes::OK)
}
