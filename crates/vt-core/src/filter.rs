//! Event filter: extracts each visit instance of a user from the event log.
//!
//! # Algorithm Summary
//!
//! A single forward cursor walks the sorted lock events through a two-state
//! machine:
//!
//! 1. `Seeking`: skip events until one is attributed to the target user. That
//!    event starts a visit instance and is recorded.
//! 2. `Capturing`: record every event unconditionally. A credentialed unlock
//!    by anyone other than the target is recorded and closes the instance,
//!    returning to `Seeking`. Thumbturn operation and lock events never close
//!    it, whoever performed them.
//!
//! Events consumed while capturing are never re-examined, so a new visit can
//! only start after the handoff that closed the previous one.

use crate::event::{LockEvent, RawEvent, prepare_events};
use crate::record::FilteredRecord;
use crate::types::UserName;

/// Where the scan currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Looking for the next event by the target user.
    Seeking,
    /// Recording a visit instance that began at `start_index`.
    Capturing { start_index: usize },
}

/// What a step did with the event under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// Event is not part of any visit instance.
    Skip,
    /// Event was recorded; the state says whether a visit is open.
    Record,
    /// Event was recorded and closed the open visit instance.
    RecordAndClose,
}

/// Advances the state machine by one event.
pub fn step(
    state: ScanState,
    index: usize,
    event: &LockEvent,
    user: &UserName,
) -> (ScanState, StepAction) {
    match state {
        ScanState::Seeking if event.is_by(user) => (
            ScanState::Capturing { start_index: index },
            StepAction::Record,
        ),
        ScanState::Seeking => (ScanState::Seeking, StepAction::Skip),
        ScanState::Capturing { .. } if event.is_handoff(user) => {
            (ScanState::Seeking, StepAction::RecordAndClose)
        }
        ScanState::Capturing { .. } => (state, StepAction::Record),
    }
}

/// Result of filtering an event log for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Records of every visit instance, in event order.
    pub records: Vec<FilteredRecord>,
    /// Number of visit instances found, including one left open at the end.
    pub visits_found: usize,
}

/// Filters sorted lock events down to the visit instances of `user`.
///
/// Events must already be sorted and restricted to lock state changes; see
/// [`filter_raw_events`] for the full pipeline. A user with no events yields
/// an empty outcome.
pub fn filter_events(events: &[LockEvent], user: &UserName) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    let mut state = ScanState::Seeking;

    for (index, event) in events.iter().enumerate() {
        let (next, action) = step(state, index, event, user);
        tracing::trace!(index, ?state, ?next, ?action, user = %event.user, "filter step");
        match action {
            StepAction::Skip => {}
            StepAction::Record => outcome.records.push(FilteredRecord::from(event)),
            StepAction::RecordAndClose => {
                outcome.records.push(FilteredRecord::from(event));
                outcome.visits_found += 1;
                if let ScanState::Capturing { start_index } = state {
                    tracing::debug!(
                        start = %events[start_index].occurred_at,
                        handoff = %event.occurred_at,
                        by = %event.user,
                        "visit closed by credentialed unlock"
                    );
                }
            }
        }
        state = next;
    }

    if let ScanState::Capturing { start_index } = state {
        outcome.visits_found += 1;
        tracing::debug!(
            start = %events[start_index].occurred_at,
            "visit still open at end of event log"
        );
    }

    outcome
}

/// Sorts, type-filters and scans raw vendor events for `user`.
pub fn filter_raw_events(events: Vec<RawEvent>, user: &UserName) -> FilterOutcome {
    let events = prepare_events(events);
    filter_events(&events, user)
}
