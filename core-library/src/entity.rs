//! Entity types served by the site API.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::LibraryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityType {
    Medium,
    Song,
    Artist,
    Location,
    Tag,
    Role,
    Privilege,
    Event,
    EventTime,
    Occurrence,
}

impl EntityType {
    pub const ALL: [EntityType; 10] = [
        EntityType::Medium,
        EntityType::Song,
        EntityType::Artist,
        EntityType::Location,
        EntityType::Tag,
        EntityType::Role,
        EntityType::Privilege,
        EntityType::Event,
        EntityType::EventTime,
        EntityType::Occurrence,
    ];

    /// Key of this type's table in the normalized graph.
    pub fn key(self) -> &'static str {
        match self {
            EntityType::Medium => "media",
            EntityType::Song => "song",
            EntityType::Artist => "artist",
            EntityType::Location => "location",
            EntityType::Tag => "tag",
            EntityType::Role => "role",
            EntityType::Privilege => "privilege",
            EntityType::Event => "event",
            EntityType::EventTime => "eventtime",
            EntityType::Occurrence => "occurrence",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }

    /// Shape returned for a record that is not cached yet, so UI code can
    /// read nested fields before the fetch lands.
    pub fn default_shape(self) -> Value {
        match self {
            EntityType::Medium => json!({ "song": { "artist": {} } }),
            EntityType::Event => json!({ "location": {} }),
            EntityType::Song => json!({ "artist": {} }),
            _ => json!({}),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EntityType {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| LibraryError::UnknownEntityType(s.to_string()))
    }
}

impl TryFrom<String> for EntityType {
    type Error = LibraryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityType> for String {
    fn from(entity_type: EntityType) -> Self {
        entity_type.key().to_string()
    }
}

/// Extract a record's id; numeric ids are stringified.
pub fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for entity_type in EntityType::ALL {
            assert_eq!(EntityType::from_key(entity_type.key()), Some(entity_type));
        }
        assert!("albums".parse::<EntityType>().is_err());
        assert_eq!(serde_json::to_string(&EntityType::Medium).unwrap(), "\"media\"");
    }

    #[test]
    fn test_record_id() {
        assert_eq!(record_id(&json!({"id": "abc"})).as_deref(), Some("abc"));
        assert_eq!(record_id(&json!({"id": 7})).as_deref(), Some("7"));
        assert_eq!(record_id(&json!({"id": ""})), None);
        assert_eq!(record_id(&json!({"name": "x"})), None);
    }
}
