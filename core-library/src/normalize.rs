//! Normalize nested server records into flat per-type records.

use serde_json::Value;

use crate::entity::{record_id, EntityType};
use crate::error::{LibraryError, Result};
use crate::schema::{Relation, Schema};

/// One flattened record.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    pub entity_type: EntityType,
    pub id: String,
    pub record: Value,
}

/// Flatten `record` of `entity_type`, appending it and every nested entity
/// to `out`. Nested records come before the record that contained them.
///
/// Returns the record's id.
pub fn normalize(
    schema: &Schema,
    entity_type: EntityType,
    mut record: Value,
    out: &mut Vec<FlatRecord>,
) -> Result<String> {
    if !record.is_object() {
        return Err(LibraryError::InvalidRecord {
            entity_type,
            reason: format!("expected an object, got {}", kind(&record)),
        });
    }
    let id = record_id(&record).ok_or(LibraryError::MissingId { entity_type })?;

    let mut unset = Vec::new();
    for (field, relation) in schema.relations(entity_type) {
        let Some(value) = record.get_mut(field) else {
            continue;
        };

        match relation {
            Relation::One(target) => {
                if value.is_object() {
                    if record_id(value).is_none() {
                        unset.push(field);
                        continue;
                    }
                    let nested = value.take();
                    *value = Value::String(normalize(schema, target, nested, out)?);
                }
            }
            Relation::Many(target) => {
                if let Value::Array(items) = value {
                    for item in items.iter_mut() {
                        if item.is_object() && record_id(item).is_some() {
                            let nested = item.take();
                            *item = Value::String(normalize(schema, target, nested, out)?);
                        }
                    }
                }
            }
        }
    }

    // An embedded object with no id (such as a default shape handed out by a
    // read) names no entity; it must not overwrite a stored reference.
    if let Value::Object(fields) = &mut record {
        for field in unset {
            fields.remove(field);
        }
    }

    out.push(FlatRecord {
        entity_type,
        id: id.clone(),
        record,
    });
    Ok(id)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reference held by a relation field, if it is a bare id.
pub fn reference_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
