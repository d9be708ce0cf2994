//! Stable identity of a tracked entity.

use std::fmt;

/// Identifier of an entity, as assigned by the backend.
///
/// Backends hand out either integer keys (leave requests) or string keys
/// (derived keys such as `"7:2024-05-01"` for attendance rows). Both forms
/// compare by value; an integer id never equals a string id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum EntityId {
    /// Numeric key.
    Int(i64),
    /// Textual or composite key.
    Str(String),
}

impl EntityId {
    /// Returns the integer key, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            EntityId::Int(id) => Some(*id),
            EntityId::Str(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(id) => write!(f, "{}", id),
            EntityId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId::Int(id)
    }
}

impl From<i32> for EntityId {
    fn from(id: i32) -> Self {
        EntityId::Int(i64::from(id))
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::Str(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId::Str(id)
    }
}
