//! Filtered records passed from the filter to the summarizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::event::LockEvent;
use crate::event_type::{LockEventType, UnlockMethod};
use crate::types::{Identity, UserName};

/// One lock state change belonging to a visit instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredRecord {
    /// Who triggered the event; unattributed events read as "Someone".
    pub username: Identity,
    /// When the event occurred.
    pub time: DateTime<Utc>,
    /// The vendor event type.
    pub event: LockEventType,
    /// Credential mechanism. Absent in files written before it was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<UnlockMethod>,
}

/// How the summarizer recognizes the unlock that ends a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffRule {
    /// A credentialed unlock by anyone other than the target; the rule the
    /// filter applies to raw events.
    Credential,
    /// An unlock attributed to a named user other than the target. Only for
    /// files written before unlock methods were recorded.
    Attribution,
}

impl HandoffRule {
    /// Picks the rule for a record list: [`HandoffRule::Attribution`] only
    /// when no record carries a method.
    pub fn for_records(records: &[FilteredRecord]) -> Self {
        if records.iter().any(|record| record.method.is_some()) {
            Self::Credential
        } else {
            Self::Attribution
        }
    }
}

impl FilteredRecord {
    /// Returns true if this record shows a different party gaining entry.
    pub fn is_handoff(&self, user: &UserName, rule: HandoffRule) -> bool {
        if self.event != LockEventType::Unlocked || self.username.is(user) {
            return false;
        }
        match rule {
            HandoffRule::Credential => self
                .method
                .as_ref()
                .is_some_and(UnlockMethod::is_credential),
            HandoffRule::Attribution => self.username.is_attributed(),
        }
    }
}

impl From<&LockEvent> for FilteredRecord {
    fn from(event: &LockEvent) -> Self {
        Self {
            username: event.user.clone(),
            time: event.occurred_at,
            event: event.kind,
            method: event.method.clone(),
        }
    }
}

/// Decodes a JSON array of filtered records.
pub fn decode_records(json: &str) -> Result<Vec<FilteredRecord>, CoreError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|err| CoreError::MalformedInput {
                index,
                message: err.to_string(),
            })
        })
        .collect()
}
