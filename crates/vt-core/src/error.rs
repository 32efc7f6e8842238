//! Errors raised while processing a run.

use thiserror::Error;

/// Errors from the filter and summarizer stages.
///
/// All errors are local to a single run; nothing here is retried.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The target user has no records in the filtered set.
    #[error("no events found for user: {user}")]
    NoEventsForUser { user: String },
    /// An event or record is missing a required field or has an invalid value.
    #[error("malformed input at index {index}: {message}")]
    MalformedInput { index: usize, message: String },
    /// The input is not valid JSON or is not an array.
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
    /// Writing timesheet CSV failed.
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}
