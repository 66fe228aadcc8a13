//! specstream - stream a spec run as newline-delimited JSON
//!
//! Invocation mirrors the runner contract: a base directory, a JSON options
//! object, then the spec files to load. Stdout carries exactly one snapshot
//! line followed by one line per lifecycle event; diagnostics go to stderr.

use anyhow::Context;
use clap::Parser;
use specstream_rs::{Adapter, ExecutionSummary, RunConfig, ScriptEngine};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "specstream")]
#[command(author, version, about = "Runs spec files and streams lifecycle events as JSON lines")]
struct Cli {
    /// Base project directory
    base_dir: PathBuf,

    /// Engine configuration as a JSON object, forwarded unexamined
    options: String,

    /// Spec files to load, resolved against the spec directory
    spec_files: Vec<PathBuf>,

    /// Let the engine load helpers and specs on demand instead of up front
    #[arg(long)]
    lazy_load: bool,

    /// Leave the engine's built-in progress reporter attached
    #[arg(long)]
    keep_default_reporter: bool,
}

fn run(cli: Cli) -> anyhow::Result<ExecutionSummary> {
    let config = RunConfig::new(&cli.base_dir, &cli.options, cli.spec_files)
        .context("invalid configuration")?;

    let mut engine = ScriptEngine::new(&cli.base_dir);
    let adapter = Adapter::new(config)
        .explicit_load(!cli.lazy_load)
        .suppress_default_reporter(!cli.keep_default_reporter);

    let stdout = io::stdout();
    let summary = adapter.run(&mut engine, stdout.lock())?;
    Ok(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(summary) if summary.failures == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("specstream: {:#}", err);
            ExitCode::from(2)
        }
    }
}
