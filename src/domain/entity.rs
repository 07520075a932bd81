//! Raw entity records as fetched from the source API

use super::errors::NormalizeError;
use super::result::Result;
use serde_json::{Map, Value};

/// An API-sourced record before normalization
///
/// Holds a stable integer identifier and the record's fields in source order.
/// The `id` field is kept in `fields` as well so the projected table keeps the
/// column where the source put it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    id: i64,
    fields: Map<String, Value>,
}

impl RawEntity {
    /// Builds a raw entity from a JSON record
    ///
    /// The record must be an object carrying an integer `id`. Integer strings are
    /// accepted because CSV snapshots store every cell as text.
    ///
    /// # Errors
    ///
    /// Returns `NormalizeError::MalformedRecord` if the value is not an object or
    /// has no integer `id`.
    pub fn from_value(entity_type: &str, value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(NormalizeError::MalformedRecord {
                entity: entity_type.to_string(),
                reason: format!("expected a JSON object, got {}", json_type(&value)),
            }
            .into());
        };

        let id = match fields.get("id") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| NormalizeError::MalformedRecord {
            entity: entity_type.to_string(),
            reason: "record has no integer 'id'".to_string(),
        })?;

        // Normalize the id cell so snapshots read back compare equal to fetched records
        fields.insert("id".to_string(), Value::from(id));

        Ok(Self { id, fields })
    }

    /// The entity's identifier
    pub fn id(&self) -> i64 {
        self.id
    }

    /// All fields in source order, including `id`
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Looks up one field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Raw collections for every entity type of one run, in configuration order
#[derive(Debug, Clone, Default)]
pub struct EntityCollections {
    collections: Vec<(String, Vec<RawEntity>)>,
}

impl EntityCollections {
    /// Creates an empty set of collections
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the collection for an entity type
    pub fn insert(&mut self, entity_type: impl Into<String>, entities: Vec<RawEntity>) {
        let entity_type = entity_type.into();
        if let Some(slot) = self
            .collections
            .iter_mut()
            .find(|(name, _)| *name == entity_type)
        {
            slot.1 = entities;
        } else {
            self.collections.push((entity_type, entities));
        }
    }

    /// Returns the collection for an entity type
    pub fn get(&self, entity_type: &str) -> Option<&[RawEntity]> {
        self.collections
            .iter()
            .find(|(name, _)| name == entity_type)
            .map(|(_, entities)| entities.as_slice())
    }

    /// Iterates collections in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RawEntity])> {
        self.collections
            .iter()
            .map(|(name, entities)| (name.as_str(), entities.as_slice()))
    }

    /// Number of entity types held
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Whether no collection was supplied
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_keeps_field_order() {
        let entity = RawEntity::from_value(
            "Character",
            json!({"id": 1, "name": "Rick Sanchez", "status": "Alive"}),
        )
        .unwrap();

        assert_eq!(entity.id(), 1);
        let keys: Vec<&str> = entity.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "name", "status"]);
    }

    #[test]
    fn test_from_value_accepts_string_id() {
        let entity = RawEntity::from_value("Episode", json!({"id": "28", "name": "Pilot"})).unwrap();
        assert_eq!(entity.id(), 28);
        assert_eq!(entity.get("id"), Some(&json!(28)));
    }

    #[test]
    fn test_from_value_rejects_missing_id() {
        let result = RawEntity::from_value("Episode", json!({"name": "Pilot"}));
        assert!(matches!(
            result,
            Err(crate::domain::StrataError::Normalize(
                NormalizeError::MalformedRecord { .. }
            ))
        ));
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(RawEntity::from_value("Episode", json!([1, 2])).is_err());
    }

    #[test]
    fn test_collections_insert_replaces() {
        let mut collections = EntityCollections::new();
        collections.insert("Character", vec![]);
        collections.insert(
            "Character",
            vec![RawEntity::from_value("Character", json!({"id": 1})).unwrap()],
        );

        assert_eq!(collections.len(), 1);
        assert_eq!(collections.get("Character").unwrap().len(), 1);
        assert!(collections.get("Location").is_none());
    }
}
