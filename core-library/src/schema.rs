//! Relationship schema.
//!
//! Declares, per entity type, which fields hold nested entities. Normalizing
//! replaces those fields by ids and denormalizing puts the records back.

use std::collections::{BTreeMap, HashMap};

use crate::entity::EntityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    One(EntityType),
    Many(EntityType),
}

impl Relation {
    pub fn target(self) -> EntityType {
        match self {
            Relation::One(target) | Relation::Many(target) => target,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    relations: HashMap<EntityType, BTreeMap<String, Relation>>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Relations of the site API's entities.
    pub fn site() -> Self {
        use EntityType::*;

        Self::builder()
            .one(Event, "location", Location)
            .many(Event, "times", EventTime)
            .many(Event, "artists", Artist)
            .one(Medium, "song", Song)
            .one(Song, "artist", Artist)
            .one(Occurrence, "event", Event)
            .one(EventTime, "event", Event)
            .build()
    }

    pub fn relations(&self, entity_type: EntityType) -> impl Iterator<Item = (&str, Relation)> {
        self.relations
            .get(&entity_type)
            .into_iter()
            .flat_map(|fields| fields.iter().map(|(name, relation)| (name.as_str(), *relation)))
    }

    pub fn relation(&self, entity_type: EntityType, field: &str) -> Option<Relation> {
        self.relations.get(&entity_type)?.get(field).copied()
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    relations: HashMap<EntityType, BTreeMap<String, Relation>>,
}

impl SchemaBuilder {
    pub fn one(self, owner: EntityType, field: &str, target: EntityType) -> Self {
        self.relation(owner, field, Relation::One(target))
    }

    pub fn many(self, owner: EntityType, field: &str, target: EntityType) -> Self {
        self.relation(owner, field, Relation::Many(target))
    }

    pub fn relation(mut self, owner: EntityType, field: &str, relation: Relation) -> Self {
        self.relations
            .entry(owner)
            .or_default()
            .insert(field.to_string(), relation);
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            relations: self.relations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_schema() {
        let schema = Schema::site();
        assert_eq!(
            schema.relation(EntityType::Event, "times"),
            Some(Relation::Many(EntityType::EventTime))
        );
        assert_eq!(
            schema.relation(EntityType::Medium, "song"),
            Some(Relation::One(EntityType::Song))
        );
        assert_eq!(schema.relations(EntityType::Tag).count(), 0);
        assert_eq!(schema.relations(EntityType::Event).count(), 3);
    }
}
