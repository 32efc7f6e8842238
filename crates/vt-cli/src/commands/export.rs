//! Export command: writes visit summaries as timesheet CSV rows.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use vt_core::{Timesheet, VisitSummary};

use super::util::{read_text, write_text};
use crate::Config;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Property address for every row [default: config `property_address`].
    pub property_address: Option<String>,

    /// Description column value.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Activity group column value.
    #[arg(short, long)]
    pub activity_group: Option<String>,

    /// Team member column value [default: the visits' username].
    #[arg(short, long)]
    pub team_member: Option<String>,

    /// Visit summaries from `vt summarize` [default: <rundata>/summary.json].
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// CSV output file [default: <rundata>/summary.csv].
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run<W: Write>(writer: &mut W, args: &ExportArgs, config: &Config) -> Result<usize> {
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| config.rundata_path("summary.json"));
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.rundata_path("summary.csv"));

    let property_address = args
        .property_address
        .clone()
        .or_else(|| config.property_address.clone())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!("missing property address (pass it or set VT_PROPERTY_ADDRESS)")
        })?;

    let visits: Vec<VisitSummary> = serde_json::from_str(&read_text(&input)?)
        .with_context(|| format!("invalid visit summaries in {}", input.display()))?;

    let team_member = args
        .team_member
        .clone()
        .or_else(|| visits.first().map(|visit| visit.username.to_string()))
        .unwrap_or_default();

    let sheet = Timesheet {
        property_address,
        team_member,
        description: args.description.clone().or_else(|| config.description.clone()),
        activity_group: args
            .activity_group
            .clone()
            .or_else(|| config.activity_group.clone()),
    };

    write_text(&output, &sheet.render(&visits)?)?;
    let rows = visits.iter().filter(|visit| !visit.is_open()).count();
    writeln!(writer, "Wrote {rows} rows to {}", output.display())?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"[
        {"username": "My Cleaning Team", "start_time": "2023-08-21T11:31:46Z",
         "end_time": "2023-08-21T12:00:19Z", "time_between_events": 28.55},
        {"username": "My Cleaning Team", "start_time": "2023-08-28T10:00:00Z",
         "end_time": null, "duration_minutes": null}
    ]"#;

    fn args(dir: &std::path::Path) -> ExportArgs {
        ExportArgs {
            property_address: Some("12 Elm St".to_string()),
            description: None,
            activity_group: None,
            team_member: None,
            input: Some(dir.join("summary.json")),
            output: Some(dir.join("summary.csv")),
        }
    }

    #[test]
    fn export_writes_closed_visits() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("summary.json"), SUMMARY).unwrap();
        let mut output = Vec::new();

        let rows = run(&mut output, &args(temp.path()), &Config::default()).unwrap();

        assert_eq!(rows, 1);
        let csv = std::fs::read_to_string(temp.path().join("summary.csv")).unwrap();
        insta::assert_snapshot!(csv, @r"
        Date,Hours,Minutes,Property Address,Team Member
        08/21/2023,0,29,12 Elm St,My Cleaning Team
        ");
    }

    #[test]
    fn export_uses_config_defaults() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("summary.json"), SUMMARY).unwrap();
        let config = Config {
            property_address: Some("Lake House".to_string()),
            description: Some("Turnover".to_string()),
            ..Config::default()
        };
        let args = ExportArgs {
            property_address: None,
            team_member: Some("Cleaners".to_string()),
            ..args(temp.path())
        };

        run(&mut Vec::new(), &args, &config).unwrap();

        let csv = std::fs::read_to_string(temp.path().join("summary.csv")).unwrap();
        insta::assert_snapshot!(csv, @r"
        Date,Description,Hours,Minutes,Property Address,Team Member
        08/21/2023,Turnover,0,29,Lake House,Cleaners
        ");
    }

    #[test]
    fn export_requires_property_address() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("summary.json"), SUMMARY).unwrap();
        let args = ExportArgs {
            property_address: None,
            ..args(temp.path())
        };

        let err = run(&mut Vec::new(), &args, &Config::default()).unwrap_err();

        assert!(err.to_string().contains("missing property address"));
    }
}
