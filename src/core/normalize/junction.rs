//! Junction table explosion for reference-array fields

use super::schema::ReferenceField;
use crate::domain::{Result, Table, TableKind};
use serde_json::Value;

/// Starts an empty junction table for a reference field
pub fn junction_table(field: &ReferenceField) -> Table {
    Table::new(
        &field.table,
        TableKind::Junction,
        vec![field.parent_column.clone(), field.child_column.clone()],
    )
}

/// Appends one `(parent_id, child_id)` row per child id
///
/// Duplicate ids yield duplicate rows.
///
/// # Errors
///
/// Returns a validation error if `table` is not a two-column junction table.
pub fn explode(table: &mut Table, parent_id: i64, child_ids: &[i64]) -> Result<()> {
    for &child_id in child_ids {
        table.push_row(vec![Value::from(parent_id), Value::from(child_id)])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field() -> ReferenceField {
        ReferenceField {
            field: "episode".to_string(),
            table: "CharacterEpisode".to_string(),
            parent_column: "character_id".to_string(),
            child_column: "episode_id".to_string(),
        }
    }

    #[test]
    fn test_one_row_per_reference() {
        let mut table = junction_table(&field());
        explode(&mut table, 1, &[1, 2, 3]).unwrap();
        explode(&mut table, 2, &[]).unwrap();
        explode(&mut table, 3, &[5, 5]).unwrap();

        assert_eq!(table.kind(), TableKind::Junction);
        assert_eq!(table.columns(), &["character_id", "episode_id"]);
        assert_eq!(table.len(), 5);
        assert_eq!(table.rows()[3], vec![json!(3), json!(5)]);
        assert_eq!(table.rows()[4], vec![json!(3), json!(5)]);
    }

    #[test]
    fn test_explode_rejects_non_junction_table() {
        let mut table = Table::new("Origin", TableKind::Dimension, vec!["origin_name".to_string()]);
        assert!(explode(&mut table, 1, &[2]).is_err());
        assert!(table.is_empty());
    }
}
