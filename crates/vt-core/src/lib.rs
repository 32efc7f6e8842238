//! Core domain logic for lock visit tracking.
//!
//! This crate contains the fundamental types and logic for:
//! - Decoding: flattening the lock vendor's event envelope
//! - Filtering: extracting each visit instance of a user from the event log
//! - Summarizing: pairing visit starts with their closing events
//! - Timesheets: rendering visits as CSV rows for an external tracker

mod error;
pub mod event;
pub mod event_type;
pub mod filter;
pub mod record;
pub mod summarize;
pub mod timesheet;
pub mod types;

pub use error::CoreError;
pub use event::{LockEvent, RawEvent, decode_raw_events, prepare_events};
pub use event_type::{LockEventType, UnknownEventType, UnlockMethod};
pub use filter::{FilterOutcome, filter_events, filter_raw_events};
pub use record::{FilteredRecord, HandoffRule, decode_records};
pub use summarize::{Summary, SummaryIssue, VisitSummary, summarize_visits};
pub use timesheet::Timesheet;
pub use types::{Identity, UNATTRIBUTED_NAME, UserName, ValidationError};
