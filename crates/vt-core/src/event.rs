//! Raw lock events as returned by the vendor API.
//!
//! The API wraps each event in a JSON:API style envelope:
//!
//! ```json
//! {
//!   "type": "unlocked_event",
//!   "attributes": { "occurred_at": "2023-08-21T11:31:46Z", "method": "pin" },
//!   "relationships": {
//!     "associated_resource": { "attributes": { "name": "My Cleaning Team" } }
//!   }
//! }
//! ```
//!
//! Decoding flattens the envelope into [`RawEvent`]. Preprocessing then sorts
//! the events and keeps only lock state changes as [`LockEvent`]s.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::CoreError;
use crate::event_type::{LockEventType, UnlockMethod};
use crate::types::{Identity, UserName};

/// A single event from the vendor, of any type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Vendor event type (e.g. `unlocked_event`, `access_denied_event`).
    pub kind: String,
    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,
    /// Credential mechanism, when the vendor reports one.
    pub method: Option<UnlockMethod>,
    /// Who triggered the event.
    pub user: Identity,
}

/// A lock state change, ready for scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEvent {
    pub kind: LockEventType,
    pub occurred_at: DateTime<Utc>,
    pub method: Option<UnlockMethod>,
    pub user: Identity,
}

impl LockEvent {
    /// Returns true if the event is attributed to the given user.
    pub fn is_by(&self, user: &UserName) -> bool {
        self.user.is(user)
    }

    /// Returns true if the event shows a different party gaining entry with a
    /// credential, which ends the current visit of `user`.
    pub fn is_handoff(&self, user: &UserName) -> bool {
        self.kind == LockEventType::Unlocked
            && self.method.as_ref().is_some_and(UnlockMethod::is_credential)
            && !self.user.is(user)
    }
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: WireAttributes,
    relationships: Option<WireRelationships>,
}

#[derive(Debug, Default, Deserialize)]
struct WireAttributes {
    occurred_at: Option<String>,
    method: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRelationships {
    associated_resource: Option<WireResource>,
}

#[derive(Debug, Deserialize)]
struct WireResource {
    attributes: Option<WireResourceAttributes>,
}

#[derive(Debug, Deserialize)]
struct WireResourceAttributes {
    name: Option<String>,
}

impl WireEvent {
    fn into_raw(self, index: usize) -> Result<RawEvent, CoreError> {
        let occurred_at = self
            .attributes
            .occurred_at
            .ok_or_else(|| CoreError::MalformedInput {
                index,
                message: "missing attributes.occurred_at".to_string(),
            })?;
        let occurred_at = DateTime::parse_from_rfc3339(&occurred_at)
            .map_err(|err| CoreError::MalformedInput {
                index,
                message: format!("invalid occurred_at {occurred_at:?}: {err}"),
            })?
            .with_timezone(&Utc);

        let name = self
            .relationships
            .and_then(|rel| rel.associated_resource)
            .and_then(|resource| resource.attributes)
            .and_then(|attrs| attrs.name);

        let method = self.attributes.method.as_deref().map(UnlockMethod::from);
        if method.is_none() && self.kind == LockEventType::Unlocked.as_str() {
            return Err(CoreError::MalformedInput {
                index,
                message: "unlocked_event without attributes.method".to_string(),
            });
        }

        Ok(RawEvent {
            kind: self.kind,
            occurred_at,
            method,
            user: Identity::from(name),
        })
    }
}

/// Decodes the vendor's JSON array of events.
///
/// Missing attribution is not an error; it decodes as
/// [`Identity::Unattributed`]. A missing or invalid `occurred_at` fails the
/// whole decode, naming the offending index.
pub fn decode_raw_events(json: &str) -> Result<Vec<RawEvent>, CoreError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let wire: WireEvent =
                serde_json::from_value(value).map_err(|err| CoreError::MalformedInput {
                    index,
                    message: err.to_string(),
                })?;
            wire.into_raw(index)
        })
        .collect()
}

/// Sorts events chronologically and keeps only lock state changes.
///
/// The sort is stable, so events sharing a timestamp keep their original
/// relative order.
pub fn prepare_events(mut events: Vec<RawEvent>) -> Vec<LockEvent> {
    events.sort_by_key(|event| event.occurred_at);
    let total = events.len();
    let retained: Vec<LockEvent> = events
        .into_iter()
        .filter_map(|event| {
            let kind = event.kind.parse::<LockEventType>().ok()?;
            Some(LockEvent {
                kind,
                occurred_at: event.occurred_at,
                method: event.method,
                user: event.user,
            })
        })
        .collect();
    tracing::debug!(
        total,
        retained = retained.len(),
        "discarded events outside the lock/unlock types"
    );
    retained
}
