//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name rendered in place of a user when an event carries no attribution.
pub const UNATTRIBUTED_NAME: &str = "Someone";

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// A validated user display name, as shown by the lock vendor.
///
/// Names are matched exactly (case-sensitive, no trimming), so the value is
/// stored as given. Only empty names are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Creates a new user name after validation.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::Empty { field: "user name" });
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

impl std::str::FromStr for UserName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Who triggered a lock event.
///
/// Kept as a tagged state rather than a magic string so that an unattributed
/// event never matches a real user, even one literally named "Someone".
/// On the wire the unattributed state is written as [`UNATTRIBUTED_NAME`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// The vendor associated the event with a named user.
    Attributed(String),
    /// No user is associated with the event (e.g. a thumbturn).
    Unattributed,
}

impl Identity {
    /// Returns true if this identity is exactly the given user.
    pub fn is(&self, user: &UserName) -> bool {
        match self {
            Self::Attributed(name) => name == user.as_str(),
            Self::Unattributed => false,
        }
    }

    /// Returns true if the vendor attributed the event to anyone.
    pub const fn is_attributed(&self) -> bool {
        matches!(self, Self::Attributed(_))
    }

    /// The name used when rendering this identity.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Attributed(name) => name,
            Self::Unattributed => UNATTRIBUTED_NAME,
        }
    }
}

impl From<Option<String>> for Identity {
    fn from(name: Option<String>) -> Self {
        name.map_or(Self::Unattributed, Self::Attributed)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl Serialize for Identity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.display_name())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        if name == UNATTRIBUTED_NAME {
            Ok(Self::Unattributed)
        } else {
            Ok(Self::Attributed(name))
        }
    }
}
