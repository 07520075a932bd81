//! Per-entity-type normalization schema
//!
//! The engine never guesses a field's shape from the data. Each entity type comes
//! with an [`EntitySchema`] that names its nested-object and reference-array
//! fields; every other field is a scalar.

use crate::config::EntityConfig;

/// Shape of a field, as declared by the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Kept as-is on the entity row
    Scalar,
    /// `{ name, url }` object, flattened to `<field>_name` plus a dimension table
    ObjectReference,
    /// List of URL references, exploded into a junction table
    ArrayReference,
}

/// A nested-object field and where its outputs go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedField {
    /// Field on the raw record
    pub field: String,
    /// Dimension table name
    pub table: String,
    /// Flattened column on the entity table, also the dimension's only column
    pub name_column: String,
}

/// A reference-array field and where its junction rows go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceField {
    /// Field on the raw record
    pub field: String,
    /// Junction table name
    pub table: String,
    /// Column holding the parent entity id
    pub parent_column: String,
    /// Column holding the referenced id
    pub child_column: String,
}

/// Normalization schema for one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    /// Entity type name, also the normalized table name
    pub entity: String,
    /// Nested-object fields in declaration order
    pub nested: Vec<NestedField>,
    /// Reference-array fields in declaration order
    pub references: Vec<ReferenceField>,
}

impl EntitySchema {
    /// Schema with no nested or reference fields
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            nested: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Declares a nested-object field with its dimension table
    pub fn with_nested(mut self, field: impl Into<String>, table: impl Into<String>) -> Self {
        let field = field.into();
        self.nested.push(NestedField {
            name_column: format!("{field}_name"),
            field,
            table: table.into(),
        });
        self
    }

    /// Declares a reference-array field with its junction table
    pub fn with_reference(
        mut self,
        field: impl Into<String>,
        table: impl Into<String>,
        parent_column: impl Into<String>,
        child_column: impl Into<String>,
    ) -> Self {
        self.references.push(ReferenceField {
            field: field.into(),
            table: table.into(),
            parent_column: parent_column.into(),
            child_column: child_column.into(),
        });
        self
    }

    /// Builds the schema from an `[[entities]]` configuration entry
    pub fn from_config(config: &EntityConfig) -> Self {
        let parent_column = config.parent_column();
        let schema = config
            .nested
            .iter()
            .fold(Self::new(&config.name), |schema, nested| {
                schema.with_nested(&nested.field, nested.table_name())
            });
        config.references.iter().fold(schema, |schema, reference| {
            schema.with_reference(
                &reference.field,
                reference.table_name(&config.name),
                &parent_column,
                reference.child_column_name(),
            )
        })
    }

    /// Declared kind of a field
    pub fn field_kind(&self, field: &str) -> FieldKind {
        if self.nested.iter().any(|n| n.field == field) {
            FieldKind::ObjectReference
        } else if self.references.iter().any(|r| r.field == field) {
            FieldKind::ArrayReference
        } else {
            FieldKind::Scalar
        }
    }

    /// Names of every table produced for this entity type, entity table first
    pub fn output_tables(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.entity.as_str())
            .chain(self.nested.iter().map(|n| n.table.as_str()))
            .chain(self.references.iter().map(|r| r.table.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NestedFieldConfig, ReferenceFieldConfig};

    #[test]
    fn test_from_config_applies_defaults() {
        let config = EntityConfig {
            name: "Location".to_string(),
            endpoint: "location".to_string(),
            nested: vec![],
            references: vec![ReferenceFieldConfig {
                field: "residents".to_string(),
                table: Some("LocationResident".to_string()),
                child_column: Some("resident_id".to_string()),
            }],
        };

        let schema = EntitySchema::from_config(&config);

        assert_eq!(schema.entity, "Location");
        assert_eq!(
            schema.references,
            vec![ReferenceField {
                field: "residents".to_string(),
                table: "LocationResident".to_string(),
                parent_column: "location_id".to_string(),
                child_column: "resident_id".to_string(),
            }]
        );
    }

    #[test]
    fn test_field_kind() {
        let config = EntityConfig {
            name: "Character".to_string(),
            endpoint: "character".to_string(),
            nested: vec![NestedFieldConfig {
                field: "origin".to_string(),
                table: None,
            }],
            references: vec![ReferenceFieldConfig {
                field: "episode".to_string(),
                table: None,
                child_column: None,
            }],
        };
        let schema = EntitySchema::from_config(&config);

        assert_eq!(schema.field_kind("origin"), FieldKind::ObjectReference);
        assert_eq!(schema.field_kind("episode"), FieldKind::ArrayReference);
        assert_eq!(schema.field_kind("status"), FieldKind::Scalar);
        assert_eq!(schema.nested[0].name_column, "origin_name");
        assert_eq!(
            schema.output_tables().collect::<Vec<_>>(),
            vec!["Character", "Origin", "CharacterEpisode"]
        );
    }
}
