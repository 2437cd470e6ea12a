use heapdb_types::DataType;

use super::*;

fn users_schema() -> TableSchema {
    TableSchema::with_primary_key(
        "users",
        vec![
            ColumnSchema::new("id", DataType::Integer),
            ColumnSchema::new("name", DataType::Varchar { max_length: 16 }),
        ],
        "id",
    )
}

#[test]
fn test_add_and_lookup_table() {
    let mut catalog = Catalog::new();
    let id = catalog.add_table(users_schema()).unwrap();

    assert_eq!(catalog.table_id("users").unwrap(), id);
    assert_eq!(catalog.table_name(id).unwrap(), "users");
    assert_eq!(catalog.primary_key(id).unwrap(), Some("id"));
    assert_eq!(catalog.schema(id).unwrap().row_width(), 4 + 20);
}

#[test]
fn test_unknown_table() {
    let catalog = Catalog::new();
    assert_eq!(catalog.schema(TableId(9)).unwrap_err(), CatalogError::TableNotFound(TableId(9)));
    assert_eq!(
        catalog.table_id("missing").unwrap_err(),
        CatalogError::TableNameNotFound("missing".to_string())
    );
}

#[test]
fn test_readding_table_replaces_schema_and_keeps_id() {
    let mut catalog = Catalog::new();
    let first = catalog.add_table(users_schema()).unwrap();
    let replacement = TableSchema::new("users", vec![ColumnSchema::new("id", DataType::Integer)]);
    let second = catalog.add_table(replacement).unwrap();

    assert_eq!(first, second);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.schema(first).unwrap().column_count(), 1);
}

#[test]
fn test_table_ids_are_ascending() {
    let mut catalog = Catalog::new();
    catalog.load_schema_str("c (x int)\na (x int)\nb (x int)").unwrap();

    let ids = catalog.table_ids();
    assert_eq!(ids, vec![TableId(0), TableId(1), TableId(2)]);
    assert_eq!(catalog.table_name(ids[0]).unwrap(), "c");
}

#[test]
fn test_duplicate_column_rejected() {
    let mut catalog = Catalog::new();
    let schema = TableSchema::new(
        "dup",
        vec![ColumnSchema::new("x", DataType::Integer), ColumnSchema::new("x", DataType::Integer)],
    );
    assert!(matches!(catalog.add_table(schema), Err(CatalogError::DuplicateColumn { .. })));
    assert!(catalog.is_empty());
}

#[test]
fn test_clear() {
    let mut catalog = Catalog::new();
    let id = catalog.add_table(users_schema()).unwrap();
    catalog.clear();
    assert!(!catalog.contains(id));
    assert!(catalog.table_ids().is_empty());
}
