//! Timesheet rows for import into an external time-tracking service.
//!
//! Each closed visit becomes one CSV row with the visit date and its
//! duration split into whole hours and minutes. The `Description` and
//! `Activity Group` columns are only present when configured.

use crate::error::CoreError;
use crate::summarize::VisitSummary;

/// Static column values shared by every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timesheet {
    pub property_address: String,
    pub team_member: String,
    pub description: Option<String>,
    pub activity_group: Option<String>,
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimesheetRow {
    /// Visit start date as `MM/DD/YYYY`.
    pub date: String,
    pub hours: i64,
    pub minutes: i64,
}

impl Timesheet {
    /// Column headers, in output order.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = vec!["Date"];
        if self.description.is_some() {
            fields.push("Description");
        }
        fields.extend(["Hours", "Minutes", "Property Address", "Team Member"]);
        if self.activity_group.is_some() {
            fields.push("Activity Group");
        }
        fields
    }

    /// Builds the row for a visit, or `None` if the visit is still open.
    #[allow(clippy::cast_possible_truncation)]
    pub fn row(visit: &VisitSummary) -> Option<TimesheetRow> {
        let duration = visit.duration_minutes?;
        let total = duration.round_ties_even() as i64;
        Some(TimesheetRow {
            date: visit.start_time.format("%m/%d/%Y").to_string(),
            hours: total / 60,
            minutes: total % 60,
        })
    }

    /// Renders the header and one line per closed visit.
    pub fn render(&self, visits: &[VisitSummary]) -> Result<String, CoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.fields())?;

        for visit in visits {
            let Some(row) = Self::row(visit) else {
                tracing::warn!(start = %visit.start_time, "skipping open visit");
                continue;
            };
            let hours = row.hours.to_string();
            let minutes = row.minutes.to_string();
            let mut cells = vec![row.date.as_str()];
            if let Some(description) = &self.description {
                cells.push(description);
            }
            cells.extend([
                hours.as_str(),
                minutes.as_str(),
                self.property_address.as_str(),
                self.team_member.as_str(),
            ]);
            if let Some(group) = &self.activity_group {
                cells.push(group);
            }
            writer.write_record(&cells)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|err| csv::Error::from(err.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
