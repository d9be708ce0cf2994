//! Status tokens.

use std::fmt;

/// The last observed status of an entity, e.g. `PENDING` or `PRESENT`.
///
/// A record that arrives without a status is represented by the empty
/// status, which compares unequal to every real token. The next time a real
/// status arrives for that entity it is therefore reported as a change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Status(String);

impl Status {
    /// The empty sentinel used for a missing status.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Borrow the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the missing-status sentinel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<Option<String>> for Status {
    fn from(s: Option<String>) -> Self {
        s.map(Self).unwrap_or_default()
    }
}

impl From<Option<&str>> for Status {
    fn from(s: Option<&str>) -> Self {
        s.map(Status::from).unwrap_or_default()
    }
}

impl PartialEq<str> for Status {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Status {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
