//! The normalized entity graph: one table per type, records keyed by id.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::entity::EntityType;
use crate::merge::deep_merge;
use crate::normalize::{reference_id, FlatRecord};
use crate::schema::{Relation, Schema};

#[derive(Debug, Clone, Default)]
struct Table {
    records: HashMap<String, Value>,
    /// Ids in first-insertion order.
    order: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    tables: HashMap<EntityType, Table>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-merge one flat record into its table. Returns `true` when the id
    /// was new.
    pub fn merge(&mut self, flat: FlatRecord) -> bool {
        let table = self.tables.entry(flat.entity_type).or_default();
        match table.records.get_mut(&flat.id) {
            Some(existing) => {
                deep_merge(existing, flat.record);
                false
            }
            None => {
                table.order.push(flat.id.clone());
                table.records.insert(flat.id, flat.record);
                true
            }
        }
    }

    pub fn get(&self, entity_type: EntityType, id: &str) -> Option<&Value> {
        self.tables.get(&entity_type)?.records.get(id)
    }

    pub fn contains(&self, entity_type: EntityType, id: &str) -> bool {
        self.get(entity_type, id).is_some()
    }

    pub fn ids(&self, entity_type: EntityType) -> &[String] {
        self.tables
            .get(&entity_type)
            .map(|table| table.order.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self, entity_type: EntityType) -> usize {
        self.ids(entity_type).len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|table| table.order.is_empty())
    }

    /// The record with its relations replaced by the referenced records.
    pub fn denormalize(&self, schema: &Schema, entity_type: EntityType, id: &str) -> Option<Value> {
        let mut path = Vec::new();
        self.denormalize_on_path(schema, entity_type, id, &mut path)
    }

    /// Every record of `entity_type`, denormalized, in first-insertion order.
    pub fn denormalize_all(&self, schema: &Schema, entity_type: EntityType) -> Vec<Value> {
        self.ids(entity_type)
            .iter()
            .filter_map(|id| self.denormalize(schema, entity_type, id))
            .collect()
    }

    fn denormalize_on_path(
        &self,
        schema: &Schema,
        entity_type: EntityType,
        id: &str,
        path: &mut Vec<(EntityType, String)>,
    ) -> Option<Value> {
        let mut record = self.get(entity_type, id)?.clone();

        // A record already being expanded higher up keeps its references as
        // ids, which cuts cycles such as event -> times -> event.
        if path.iter().any(|(t, i)| *t == entity_type && i == id) {
            return Some(record);
        }

        path.push((entity_type, id.to_string()));
        for (field, relation) in schema.relations(entity_type) {
            let Some(value) = record.get_mut(field) else {
                continue;
            };
            match relation {
                Relation::One(target) => self.expand(schema, target, value, path),
                Relation::Many(target) => {
                    if let Value::Array(items) = value {
                        for item in items.iter_mut() {
                            self.expand(schema, target, item, path);
                        }
                    }
                }
            }
        }
        path.pop();

        Some(record)
    }

    /// Replace a bare id with its record. Unknown ids stay as they are.
    fn expand(
        &self,
        schema: &Schema,
        target: EntityType,
        value: &mut Value,
        path: &mut Vec<(EntityType, String)>,
    ) {
        if let Some(id) = reference_id(value) {
            if let Some(record) = self.denormalize_on_path(schema, target, &id, path) {
                *value = record;
            }
        }
    }

    /// The normalized tables as one JSON object, keyed by type then id.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for (entity_type, table) in &self.tables {
            let records: Map<String, Value> = table
                .order
                .iter()
                .filter_map(|id| Some((id.clone(), table.records.get(id)?.clone())))
                .collect();
            root.insert(entity_type.key().to_string(), Value::Object(records));
        }
        Value::Object(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    fn write(graph: &mut EntityGraph, schema: &Schema, entity_type: EntityType, record: Value) {
        let mut flat = Vec::new();
        normalize(schema, entity_type, record, &mut flat).unwrap();
        for record in flat {
            graph.merge(record);
        }
    }

    #[test]
    fn test_denormalize_restores_nesting() {
        let schema = Schema::site();
        let mut graph = EntityGraph::new();
        write(
            &mut graph,
            &schema,
            EntityType::Medium,
            json!({"id": "m", "song": {"id": "s", "name": "Tune", "artist": {"id": "a", "name": "Band"}}}),
        );

        let medium = graph.denormalize(&schema, EntityType::Medium, "m").unwrap();
        assert_eq!(medium["song"]["artist"]["name"], "Band");
        assert_eq!(graph.len(EntityType::Artist), 1);
    }

    #[test]
    fn test_missing_reference_stays_bare() {
        let schema = Schema::site();
        let mut graph = EntityGraph::new();
        write(&mut graph, &schema, EntityType::Song, json!({"id": "s", "artist": "ghost"}));

        let song = graph.denormalize(&schema, EntityType::Song, "s").unwrap();
        assert_eq!(song["artist"], "ghost");
    }

    #[test]
    fn test_cycles_are_cut() {
        let schema = Schema::site();
        let mut graph = EntityGraph::new();
        write(
            &mut graph,
            &schema,
            EntityType::Event,
            json!({"id": "e", "times": [{"id": "t", "event": "e"}]}),
        );

        let event = graph.denormalize(&schema, EntityType::Event, "e").unwrap();
        assert_eq!(event["times"][0]["id"], "t");
        assert_eq!(event["times"][0]["event"]["id"], "e");
        assert_eq!(event["times"][0]["event"]["times"], json!(["t"]));
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let schema = Schema::site();
        let mut graph = EntityGraph::new();
        for id in ["c", "a", "b", "a"] {
            write(&mut graph, &schema, EntityType::Tag, json!({"id": id}));
        }
        assert_eq!(graph.ids(EntityType::Tag), ["c", "a", "b"]);
        assert_eq!(graph.to_json()["tag"].as_object().unwrap().len(), 3);
    }
}
