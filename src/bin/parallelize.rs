// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Parallelize the Go tests of one module.
//!
//! Loads the package in the given module directory, injects `t.Parallel()`
//! into every test function (into the first subtest closure when one
//! exists), repairs the table-test capture idiom, and prints the rewritten
//! `_test.go` files to stdout. One concurrent task per test-build
//! compilation unit.

use anyhow::Result;
use clap::Parser;
use parallelize::dispatch::run_units;
use parallelize::loader::load_module;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "parallelize", about = "Inject t.Parallel() into Go test functions")]
struct Cli {
    /// Go module directory to rewrite
    module_dir: PathBuf,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log warnings and errors only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let default = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    // Logs go to stderr; stdout carries only rewritten source.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let units = load_module(&cli.module_dir)?;
    let sink = Mutex::new(io::stdout());
    let summary = run_units(&cli.module_dir, units, &sink)?;

    let rewritten: usize = summary.units.iter().map(|u| u.rewritten_functions()).sum();
    info!(units = summary.units.len(), rewritten, "run complete");

    if let Some(path) = &cli.summary {
        fs::write(path, summary.to_json()?)?;
        info!(path = %path.display(), "summary written");
    }
    Ok(())
}
