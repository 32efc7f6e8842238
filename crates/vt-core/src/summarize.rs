//! Visit summarizer: pairs each visit start with the event that closes it.
//!
//! A visit starts at a record attributed to the target user. It ends at the
//! last record before the next handoff (a credentialed unlock by someone
//! else), which is the final lock state change the visitor made. The next
//! visit is searched for after that end record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::record::{FilteredRecord, HandoffRule};
use crate::types::UserName;

/// One visit by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitSummary {
    pub username: UserName,
    pub start_time: DateTime<Utc>,
    /// Last lock state change of the visit; `None` while the visit is open.
    pub end_time: Option<DateTime<Utc>>,
    /// Elapsed minutes, fractional; `None` while the visit is open.
    #[serde(alias = "time_between_events")]
    pub duration_minutes: Option<f64>,
}

impl VisitSummary {
    fn closed(user: &UserName, start: &FilteredRecord, end: &FilteredRecord) -> Self {
        Self {
            username: user.clone(),
            start_time: start.time,
            end_time: Some(end.time),
            duration_minutes: Some(minutes_between(start.time, end.time)),
        }
    }

    fn open(user: &UserName, start: &FilteredRecord) -> Self {
        Self {
            username: user.clone(),
            start_time: start.time,
            end_time: None,
            duration_minutes: None,
        }
    }

    /// Returns true if no closing event was found for the visit.
    pub const fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// A per-visit problem that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryIssue {
    /// The record list ended before anyone else unlocked with a credential.
    NoEndEventFound { start_time: DateTime<Utc> },
}

/// All visits of one user, with any issues found along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub visits: Vec<VisitSummary>,
    pub issues: Vec<SummaryIssue>,
}

impl Summary {
    /// Visits with both a start and an end.
    pub fn closed_visits(&self) -> impl Iterator<Item = &VisitSummary> {
        self.visits.iter().filter(|visit| !visit.is_open())
    }

    /// Mean duration of closed visits, or `None` when there are none.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_minutes(&self) -> Option<f64> {
        let durations: Vec<f64> = self
            .closed_visits()
            .filter_map(|visit| visit.duration_minutes)
            .collect();
        if durations.is_empty() {
            return None;
        }
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    }
}

/// Minutes from `start` to `end`, keeping fractions of a minute.
#[allow(clippy::cast_precision_loss)]
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}

/// Index of the first record at or after `from` attributed to `user`.
pub fn find_next(records: &[FilteredRecord], from: usize, user: &UserName) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, record)| record.username.is(user))
        .map(|(index, _)| index)
}

/// Index of the record that closes the visit starting at `start`.
///
/// This is the record just before the first handoff after `start`, or
/// `None` if the list ends first. Handoffs follow
/// [`HandoffRule::for_records`].
pub fn find_end(records: &[FilteredRecord], start: usize, user: &UserName) -> Option<usize> {
    let rule = HandoffRule::for_records(records);
    records
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, record)| record.is_handoff(user, rule))
        .map(|(index, _)| index - 1)
}

/// Builds a summary of every visit by `user` in the filtered records.
///
/// Records are re-sorted by time first (stable). Fails with
/// [`CoreError::NoEventsForUser`] if the user never appears. A visit with no
/// closing event is kept as an open summary and reported in
/// [`Summary::issues`]; every later record belongs to it, so scanning stops.
pub fn summarize_visits(
    mut records: Vec<FilteredRecord>,
    user: &UserName,
) -> Result<Summary, CoreError> {
    records.sort_by_key(|record| record.time);

    let Some(mut start) = find_next(&records, 0, user) else {
        return Err(CoreError::NoEventsForUser {
            user: user.to_string(),
        });
    };

    let mut summary = Summary::default();
    loop {
        let start_record = &records[start];
        let Some(end) = find_end(&records, start, user) else {
            tracing::error!(
                user = %user,
                start = %start_record.time,
                "no end event found for visit"
            );
            summary.issues.push(SummaryIssue::NoEndEventFound {
                start_time: start_record.time,
            });
            summary.visits.push(VisitSummary::open(user, start_record));
            break;
        };

        let visit = VisitSummary::closed(user, start_record, &records[end]);
        tracing::debug!(
            start = %visit.start_time,
            end = ?visit.end_time,
            minutes = ?visit.duration_minutes,
            "visit summarized"
        );
        summary.visits.push(visit);

        match find_next(&records, end + 1, user) {
            Some(next) => start = next,
            None => break,
        }
    }

    Ok(summary)
}
