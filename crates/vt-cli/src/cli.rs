//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::commands::archive::ArchiveArgs;
use crate::commands::auth::AuthArgs;
use crate::commands::collect::CollectArgs;
use crate::commands::export::ExportArgs;
use crate::commands::filter::FilterArgs;
use crate::commands::summarize::SummarizeArgs;

/// Lock visit tracker.
///
/// Turns a smart lock's event log into per-user visits with entry and exit
/// times, and exports them as timesheet rows.
#[derive(Debug, Parser)]
#[command(name = "vt", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in to the vendor web app and save the session cookie.
    Auth(AuthArgs),

    /// Download raw lock events from the vendor API.
    Collect(CollectArgs),

    /// Extract the visit events of one user from the raw event log.
    Filter(FilterArgs),

    /// Pair visit starts with their closing events and compute durations.
    Summarize(SummarizeArgs),

    /// Write visit summaries as timesheet CSV rows.
    Export(ExportArgs),

    /// Zip the run-data files for safekeeping.
    Archive(ArchiveArgs),
}

/// Log filter directive for a `-v` count.
///
/// Returns `None` when no flag was given, leaving `RUST_LOG` in charge.
pub const fn log_directive(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        _ => Some("debug"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_directive() {
        assert_eq!(log_directive(0), None);
        assert_eq!(log_directive(1), Some("info"));
        assert_eq!(log_directive(2), Some("debug"));
        assert_eq!(log_directive(5), Some("debug"));
    }

    #[test]
    fn parses_repeated_verbose_flag() {
        let cli = Cli::parse_from(["vt", "-vv", "filter", "My Cleaning Team"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Filter(_))));
    }

    #[test]
    fn parses_archive_and_auth() {
        let cli = Cli::parse_from(["vt", "archive", "-o", "august"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Archive(ArchiveArgs { output: Some(ref path), .. })) if path.as_os_str() == "august"
        ));
        let cli = Cli::parse_from(["vt", "auth", "-e", "ops@example.com"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Auth(AuthArgs { email: Some(ref email), .. })) if email == "ops@example.com"
        ));
    }

    #[test]
    fn rejects_empty_username() {
        assert!(Cli::try_parse_from(["vt", "summarize", ""]).is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
