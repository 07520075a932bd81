//! Integration tests for the normalization engine
//!
//! Covers the Rick and Morty shaped scenarios end to end through the public API,
//! including normalizing records read back from a CSV snapshot.

use serde_json::{json, Value};
use strata::adapters::store::{decode_table, encode_table};
use strata::core::normalize::{normalize, EntitySchema};
use strata::domain::{EntityCollections, NormalizeError, RawEntity, StrataError, Table, TableKind};

fn character_schema() -> EntitySchema {
    EntitySchema::new("Character")
        .with_nested("origin", "Origin")
        .with_reference("episode", "CharacterEpisode", "character_id", "episode_id")
}

fn characters(records: Vec<Value>) -> EntityCollections {
    let entities = records
        .into_iter()
        .map(|r| RawEntity::from_value("Character", r).unwrap())
        .collect();
    let mut collections = EntityCollections::new();
    collections.insert("Character", entities);
    collections
}

fn rick(id: i64, origin_url: &str, episodes: &[i64]) -> Value {
    let episode: Vec<String> = episodes
        .iter()
        .map(|e| format!("https://rickandmortyapi.com/api/episode/{e}"))
        .collect();
    json!({
        "id": id,
        "name": format!("Rick {id}"),
        "origin": {"name": "Earth", "url": origin_url},
        "episode": episode,
    })
}

fn rows(table: &Table) -> Vec<Vec<Value>> {
    table.rows().to_vec()
}

#[test]
fn test_scenario_a_single_character() {
    let collections = characters(vec![rick(1, "https://rickandmortyapi.com/api/location/20", &[1, 2])]);

    let output = normalize(&collections, &[character_schema()]).unwrap();

    let entity = output.get("Character").unwrap();
    assert_eq!(entity.kind(), TableKind::Entity);
    assert_eq!(entity.columns(), ["id", "name", "origin_name"]);
    assert_eq!(rows(entity), vec![vec![json!(1), json!("Rick 1"), json!("Earth")]]);

    let origin = output.get("Origin").unwrap();
    assert_eq!(origin.kind(), TableKind::Dimension);
    assert_eq!(origin.columns(), ["origin_name"]);
    assert_eq!(rows(origin), vec![vec![json!("Earth")]]);

    let junction = output.get("CharacterEpisode").unwrap();
    assert_eq!(junction.kind(), TableKind::Junction);
    assert_eq!(junction.columns(), ["character_id", "episode_id"]);
    assert_eq!(
        rows(junction),
        vec![vec![json!(1), json!(1)], vec![json!(1), json!(2)]]
    );

    assert!(output.collisions().is_empty());
}

#[test]
fn test_scenario_b_shared_name_collapses_and_is_reported() {
    let collections = characters(vec![
        rick(1, "https://rickandmortyapi.com/api/location/1", &[1]),
        rick(2, "https://rickandmortyapi.com/api/location/20", &[1]),
    ]);

    let output = normalize(&collections, &[character_schema()]).unwrap();

    let origin = output.get("Origin").unwrap();
    assert_eq!(rows(origin), vec![vec![json!("Earth")]]);

    let collisions = output.collisions();
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].table, "Origin");
    assert_eq!(collisions[0].name, "Earth");
    assert_eq!(collisions[0].urls.len(), 2);
}

#[test]
fn test_junction_completeness() {
    let collections = characters(vec![
        rick(1, "", &[1, 2, 3, 4]),
        rick(2, "", &[]),
        rick(3, "", &[7, 7]),
    ]);

    let output = normalize(&collections, &[character_schema()]).unwrap();
    let junction = output.get("CharacterEpisode").unwrap();

    let per_parent = |id: i64| {
        junction
            .rows()
            .iter()
            .filter(|row| row[0] == json!(id))
            .count()
    };
    assert_eq!(per_parent(1), 4);
    assert_eq!(per_parent(2), 0);
    // duplicates are kept
    assert_eq!(per_parent(3), 2);
    assert_eq!(junction.len(), 6);

    // the entity table keeps one row per input record
    assert_eq!(output.get("Character").unwrap().len(), 3);
}

#[test]
fn test_dimension_dedup_is_order_independent() {
    let records = vec![
        json!({"id": 1, "origin": {"name": "Earth (C-137)", "url": ""}, "episode": []}),
        json!({"id": 2, "origin": {"name": "unknown", "url": ""}, "episode": []}),
        json!({"id": 3, "origin": {"name": "Earth (C-137)", "url": ""}, "episode": []}),
        json!({"id": 4, "origin": {"name": "Abadango", "url": ""}, "episode": []}),
    ];
    let mut reversed = records.clone();
    reversed.reverse();

    let distinct = |records: Vec<Value>| {
        let output = normalize(&characters(records), &[character_schema()]).unwrap();
        let mut names: Vec<String> = output
            .get("Origin")
            .unwrap()
            .rows()
            .iter()
            .map(|row| row[0].as_str().unwrap().to_string())
            .collect();
        names.sort();
        names
    };

    let forward = distinct(records.clone());
    assert_eq!(forward, vec!["Abadango", "Earth (C-137)", "unknown"]);
    assert_eq!(forward, distinct(reversed));

    // normalizing a doubled collection yields the same distinct set
    let mut doubled = records.clone();
    doubled.extend(records.into_iter().map(|mut r| {
        let id = r["id"].as_i64().unwrap();
        r["id"] = json!(id + 100);
        r
    }));
    assert_eq!(forward, distinct(doubled));
}

#[test]
fn test_malformed_reference_names_the_record() {
    let collections = characters(vec![
        rick(1, "", &[1]),
        json!({
            "id": 2,
            "name": "Morty",
            "origin": {"name": "Earth", "url": ""},
            "episode": ["https://rickandmortyapi.com/api/episode/pilot"],
        }),
    ]);

    let err = normalize(&collections, &[character_schema()]).unwrap_err();
    match err {
        StrataError::Normalize(NormalizeError::MalformedReference { entity, field, id, .. }) => {
            assert_eq!(entity, "Character");
            assert_eq!(field, "episode");
            assert_eq!(id, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_normalizing_a_csv_snapshot_matches_the_fetched_batch() {
    let records = vec![
        json!({
            "id": 1,
            "name": "Rick Sanchez",
            "status": "Alive",
            "type": "",
            "origin": {"name": "Earth (C-137)", "url": "https://rickandmortyapi.com/api/location/1"},
            "episode": [
                "https://rickandmortyapi.com/api/episode/1",
                "https://rickandmortyapi.com/api/episode/2"
            ],
        }),
        json!({
            "id": 2,
            "name": "Morty, \"the\" Smith",
            "status": "Alive",
            "type": "",
            "origin": {"name": "unknown", "url": ""},
            "episode": ["https://rickandmortyapi.com/api/episode/1"],
        }),
    ];
    let fetched = characters(records);
    let schemas = [character_schema()];

    let raw = Table::from_entities("Character", fetched.get("Character").unwrap());
    let bytes = encode_table(&raw).unwrap();
    let reread = decode_table("Character", TableKind::Raw, &bytes).unwrap();

    let mut from_snapshot = EntityCollections::new();
    from_snapshot.insert("Character", reread.to_entities().unwrap());

    let expected: Vec<Table> = normalize(&fetched, &schemas)
        .unwrap()
        .tables()
        .iter()
        .map(blank_cells_as_null)
        .collect();
    let actual = normalize(&from_snapshot, &schemas).unwrap();
    assert_eq!(expected, actual.tables());

    let character = &actual.tables()[0];
    let type_index = character.column_index("type").unwrap();
    assert!(character.rows().iter().all(|row| row[type_index].is_null()));
}

/// Empty strings do not survive a CSV snapshot; they read back as null
fn blank_cells_as_null(table: &Table) -> Table {
    let mut mapped = Table::new(table.name(), table.kind(), table.columns().to_vec());
    for row in table.rows() {
        let row = row
            .iter()
            .map(|cell| match cell {
                Value::String(s) if s.is_empty() => Value::Null,
                other => other.clone(),
            })
            .collect();
        mapped.push_row(row).unwrap();
    }
    mapped
}
