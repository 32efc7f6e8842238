//! Lock event types and unlock methods as the single source of truth for
//! their vendor strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lock state changes retained for visit tracking.
///
/// The vendor reports many other event types (access denied, battery
/// level, ...); those fail to parse and are dropped before scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockEventType {
    Locked,
    Unlocked,
}

impl LockEventType {
    /// Vendor string for this event type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked_event",
            Self::Unlocked => "unlocked_event",
        }
    }
}

impl fmt::Display for LockEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LockEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locked_event" => Ok(Self::Locked),
            "unlocked_event" => Ok(Self::Unlocked),
            _ => Err(UnknownEventType(s.to_string())),
        }
    }
}

impl Serialize for LockEventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LockEventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for event type strings outside the retained set.
#[derive(Debug, Clone)]
pub struct UnknownEventType(String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

/// How the lock was operated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnlockMethod {
    /// Keypad PIN entry.
    Pin,
    /// Manual thumbturn on the inside of the door.
    Thumbturn,
    /// Any other vendor-specific mechanism, kept verbatim.
    Other(String),
}

impl UnlockMethod {
    /// Returns true if the method proves who gained entry.
    ///
    /// A credentialed unlock by another party is what ends a visit; manual
    /// operation of the lock never does.
    pub const fn is_credential(&self) -> bool {
        matches!(self, Self::Pin)
    }

    /// Vendor string for this method.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pin => "pin",
            Self::Thumbturn => "thumbturn",
            Self::Other(method) => method,
        }
    }
}

impl fmt::Display for UnlockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for UnlockMethod {
    fn from(s: &str) -> Self {
        match s {
            "pin" => Self::Pin,
            "thumbturn" => Self::Thumbturn,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for UnlockMethod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UnlockMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}
