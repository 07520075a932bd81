//! Normalization engine
//!
//! Converts denormalized API records into relational tables. For each entity type
//! the [`EntitySchema`] names two kinds of structured fields:
//!
//! - **Nested objects** (`{ name, url }`) are flattened into a `<field>_name`
//!   column on the entity table, and their distinct names form a dimension table
//! - **Reference arrays** (lists of `.../<type>/<id>` URLs) are exploded into a
//!   junction table of `(parent id, child id)` rows
//!
//! Every other field is projected onto the entity table unchanged.
//!
//! Normalization is all-or-nothing: junction rows of one type point at ids of
//! another, so a single malformed value fails the whole call and no table is
//! returned.
//!
//! # Example
//!
//! ```
//! use strata::core::normalize::{normalize, EntitySchema};
//! use strata::domain::{EntityCollections, RawEntity};
//! use serde_json::json;
//!
//! # fn example() -> strata::domain::Result<()> {
//! let mut collections = EntityCollections::new();
//! collections.insert(
//!     "Character",
//!     vec![RawEntity::from_value(
//!         "Character",
//!         json!({
//!             "id": 1,
//!             "name": "Rick Sanchez",
//!             "origin": {"name": "Earth (C-137)", "url": "https://x/api/location/1"},
//!             "episode": ["https://x/api/episode/1", "https://x/api/episode/2"]
//!         }),
//!     )?],
//! );
//!
//! let schema = EntitySchema::new("Character")
//!     .with_nested("origin", "Origin")
//!     .with_reference("episode", "CharacterEpisode", "character_id", "episode_id");
//!
//! let output = normalize(&collections, &[schema])?;
//! assert_eq!(output.get("CharacterEpisode").map(|t| t.len()), Some(2));
//! # Ok(())
//! # }
//! ```

pub mod dimension;
pub mod flatten;
pub mod junction;
pub mod reference;
pub mod schema;

pub use dimension::DimensionCollision;
pub use reference::UrlReference;
pub use schema::{EntitySchema, FieldKind, NestedField, ReferenceField};

use crate::domain::{
    EntityCollections, NormalizeError, RawEntity, Result, StrataError, Table, TableKind,
};
use dimension::DimensionBuilder;
use serde_json::Value;
use std::collections::HashSet;

/// Tables produced by one normalization run
#[derive(Debug, Clone, Default)]
pub struct NormalizedOutput {
    tables: Vec<Table>,
    collisions: Vec<DimensionCollision>,
}

impl NormalizedOutput {
    /// All tables: per entity type, the entity table, then its dimensions, then
    /// its junctions
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Looks up a table by name
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    /// Dimension names that were seen with more than one URL
    pub fn collisions(&self) -> &[DimensionCollision] {
        &self.collisions
    }

    /// Consumes the output, keeping only the tables
    pub fn into_tables(self) -> Vec<Table> {
        self.tables
    }
}

/// Normalizes every configured entity collection in one pass per collection
///
/// # Errors
///
/// - `NormalizeError::DuplicateTable` if two schemas produce the same table name
/// - `NormalizeError::MissingCollection` if a schema has no matching collection
/// - `NormalizeError::MalformedReference` for a nested or reference value that
///   cannot be decoded, including a URL whose last segment is not an integer
pub fn normalize(collections: &EntityCollections, schemas: &[EntitySchema]) -> Result<NormalizedOutput> {
    check_table_names(schemas)?;

    let mut output = NormalizedOutput::default();

    for schema in schemas {
        let entities = collections
            .get(&schema.entity)
            .ok_or_else(|| NormalizeError::MissingCollection(schema.entity.clone()))?;

        let (tables, collisions) = normalize_collection(schema, entities)?;

        tracing::debug!(
            entity = %schema.entity,
            rows = entities.len(),
            tables = tables.len(),
            "Normalized entity collection"
        );

        output.tables.extend(tables);
        output.collisions.extend(collisions);
    }

    for collision in &output.collisions {
        tracing::warn!(
            table = %collision.table,
            name = %collision.name,
            urls = ?collision.urls,
            "Dimension name refers to more than one entity"
        );
    }

    Ok(output)
}

fn check_table_names(schemas: &[EntitySchema]) -> Result<()> {
    let mut seen = HashSet::new();
    for name in schemas.iter().flat_map(EntitySchema::output_tables) {
        if !seen.insert(name) {
            return Err(NormalizeError::DuplicateTable(name.to_string()).into());
        }
    }
    Ok(())
}

fn normalize_collection(
    schema: &EntitySchema,
    entities: &[RawEntity],
) -> Result<(Vec<Table>, Vec<DimensionCollision>)> {
    let retained = retained_columns(schema, entities);

    let mut columns = retained.clone();
    columns.extend(schema.nested.iter().map(|n| n.name_column.clone()));
    let mut entity_table = Table::new(&schema.entity, TableKind::Entity, columns);

    let mut dimensions: Vec<DimensionBuilder> = schema
        .nested
        .iter()
        .map(|n| DimensionBuilder::new(&n.table, &n.name_column))
        .collect();
    let mut junctions: Vec<Table> = schema.references.iter().map(junction::junction_table).collect();

    for entity in entities {
        let mut row: Vec<Value> = retained
            .iter()
            .map(|c| entity.get(c).map_or(Value::Null, flatten::scalar_cell))
            .collect();

        for (nested, dimension) in schema.nested.iter().zip(dimensions.iter_mut()) {
            let value = required_field(schema, entity, &nested.field)?;
            let reference = flatten::decode_object_reference(value).map_err(|reason| {
                StrataError::malformed_reference(&schema.entity, &nested.field, entity.id(), reason)
            })?;
            row.push(Value::String(reference.name.clone()));
            dimension.observe(&reference);
        }

        for (field, table) in schema.references.iter().zip(junctions.iter_mut()) {
            let child_ids = reference_ids(schema, entity, field)?;
            junction::explode(table, entity.id(), &child_ids)?;
        }

        entity_table.push_row(row)?;
    }

    let collisions = dimensions.iter().flat_map(DimensionBuilder::collisions).collect();

    let mut tables = vec![entity_table];
    for dimension in dimensions {
        tables.push(dimension.build()?);
    }
    tables.extend(junctions);

    Ok((tables, collisions))
}

/// Union of raw keys in first-seen order, minus declared fields and the
/// flattened name columns
fn retained_columns(schema: &EntitySchema, entities: &[RawEntity]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for key in entities.iter().flat_map(|e| e.fields().keys()) {
        if schema.field_kind(key) != FieldKind::Scalar
            || schema.nested.iter().any(|n| &n.name_column == key)
        {
            continue;
        }
        if !columns.contains(key) {
            columns.push(key.clone());
        }
    }
    columns
}

fn required_field<'a>(schema: &EntitySchema, entity: &'a RawEntity, field: &str) -> Result<&'a Value> {
    match entity.get(field) {
        Some(Value::Null) | None => Err(StrataError::malformed_reference(
            &schema.entity,
            field,
            entity.id(),
            "field is missing or null",
        )),
        Some(value) => Ok(value),
    }
}

fn reference_ids(schema: &EntitySchema, entity: &RawEntity, field: &ReferenceField) -> Result<Vec<i64>> {
    let malformed =
        |reason: String| StrataError::malformed_reference(&schema.entity, &field.field, entity.id(), reason);

    let value = required_field(schema, entity, &field.field)?;
    let urls = flatten::decode_array_reference(value).map_err(malformed)?;

    urls.iter()
        .map(|url| UrlReference::parse(url).map(|r| r.id()).map_err(malformed))
        .collect()
}
