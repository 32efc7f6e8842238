//! Filter command: extracts one user's visit events from the raw log.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use vt_core::{FilterOutcome, UserName, decode_raw_events, filter_raw_events};

use super::util::{read_text, write_json};
use crate::Config;

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Name of the user to filter events for (exact match).
    pub username: UserName,

    /// Raw events from `vt collect` [default: <rundata>/lockdata.json].
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file [default: <rundata>/filtered.json].
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suppress output.
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &FilterArgs, config: &Config) -> Result<FilterOutcome> {
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| config.rundata_path("lockdata.json"));
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.rundata_path("filtered.json"));
    tracing::info!(input = %input.display(), output = %output.display(), "filtering events");

    let events = decode_raw_events(&read_text(&input)?)
        .with_context(|| format!("invalid events in {}", input.display()))?;
    let outcome = filter_raw_events(events, &args.username);

    write_json(&output, &outcome.records)?;
    if !args.quiet {
        writeln!(writer, "Found {} visits", outcome.visits_found)?;
    }
    Ok(outcome)
}
