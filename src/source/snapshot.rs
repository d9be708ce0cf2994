//! Records as delivered by the backend and the rules for keying them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use statuswatch_types::{EntityId, Status};

/// A complete, point-in-time collection as returned by one fetch.
pub type Snapshot = Vec<Record>;

/// One element of a fetched collection.
///
/// Only `status` is interpreted by the watcher; every other field is kept
/// as raw JSON for keying and for message templates.
///
/// ```json
/// { "id": 3, "startDate": "2024-05-01", "endDate": "2024-05-03", "status": "PENDING" }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Status token; absent or `null` means "unknown".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// All remaining fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create a record with the given status and no fields.
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style helper to add a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The record's status, with a missing one mapped to the empty sentinel.
    pub fn status(&self) -> Status {
        Status::from(self.status.as_deref())
    }

    /// Raw value of a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// A field rendered as text: strings as-is, numbers and booleans via
    /// their JSON form. `null`, arrays and objects yield `None`.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// How an entity id is derived from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    /// A single field. Integer values give [`EntityId::Int`], strings give
    /// [`EntityId::Str`].
    Field(String),
    /// Several fields joined with `:` into an [`EntityId::Str`], for rows
    /// without an id of their own (attendance is keyed by employee and date).
    Composite(Vec<String>),
}

impl Default for RecordKey {
    fn default() -> Self {
        RecordKey::Field("id".to_string())
    }
}

impl RecordKey {
    /// Key on a single field.
    pub fn field(name: &str) -> Self {
        RecordKey::Field(name.to_string())
    }

    /// Key on several fields.
    pub fn composite(names: &[&str]) -> Self {
        RecordKey::Composite(names.iter().map(|n| n.to_string()).collect())
    }

    /// Derive the entity id of `record`, or `None` if a key field is missing.
    pub fn entity_id(&self, record: &Record) -> Option<EntityId> {
        match self {
            RecordKey::Field(name) => match record.get(name)? {
                Value::Number(n) => match n.as_i64() {
                    Some(id) => Some(EntityId::Int(id)),
                    None => Some(EntityId::Str(n.to_string())),
                },
                Value::String(s) => Some(EntityId::Str(s.clone())),
                _ => None,
            },
            RecordKey::Composite(names) => {
                let parts = names
                    .iter()
                    .map(|name| record.text(name))
                    .collect::<Option<Vec<_>>>()?;
                Some(EntityId::Str(parts.join(":")))
            }
        }
    }
}
