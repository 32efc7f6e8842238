//! Summarize command: turns filtered records into visit summaries.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use vt_core::{Summary, UserName, decode_records, summarize_visits};

use super::util::{read_text, write_json};
use crate::Config;

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    /// Name of the user to summarize visits for.
    pub username: UserName,

    /// Filtered records from `vt filter` [default: <rundata>/filtered.json].
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file [default: <rundata>/summary.json].
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suppress output.
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &SummarizeArgs, config: &Config) -> Result<Summary> {
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| config.rundata_path("filtered.json"));
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.rundata_path("summary.json"));
    tracing::info!(input = %input.display(), output = %output.display(), "summarizing visits");

    let records = decode_records(&read_text(&input)?)
        .with_context(|| format!("invalid records in {}", input.display()))?;
    let summary = summarize_visits(records, &args.username)?;

    write_json(&output, &summary.visits)?;
    if !args.quiet {
        writeln!(writer, "{}", format_summary_line(&summary))?;
    }
    Ok(summary)
}

/// One-line report of the visit count and average duration.
#[allow(clippy::cast_possible_truncation)]
pub fn format_summary_line(summary: &Summary) -> String {
    let total = summary.visits.len();
    let open = summary.issues.len();
    let count = if open == 0 {
        format!("Found {total} visits")
    } else {
        format!("Found {total} visits ({open} without an end event)")
    };
    match summary.average_minutes() {
        Some(average) => format!(
            "{count}, averaging {} minutes.",
            average.round_ties_even() as i64
        ),
        None => format!("{count}."),
    }
}
