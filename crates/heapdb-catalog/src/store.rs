//! Table catalog: id, name and schema of every known table.

use std::{collections::BTreeMap, collections::HashMap, fmt, sync::Arc};

use crate::{errors::CatalogError, schema_file::parse_schema_file, TableSchema};

/// Identifier the catalog assigns to a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct TableEntry {
    schema: Arc<TableSchema>,
}

/// Database catalog - maps table ids to table schemas.
///
/// Tables are kept ordered by id so that every iteration over the catalog
/// visits them in the same order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: BTreeMap<TableId, TableEntry>,
    names: HashMap<String, TableId>,
    next_id: u32,
}

impl Catalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, returning its id.
    ///
    /// A table added under a name that already exists replaces the previous
    /// definition and keeps its id.
    pub fn add_table(&mut self, schema: TableSchema) -> Result<TableId, CatalogError> {
        schema.validate()?;
        let id = match self.names.get(&schema.name) {
            Some(id) => *id,
            None => {
                let id = TableId(self.next_id);
                self.next_id += 1;
                self.names.insert(schema.name.clone(), id);
                id
            }
        };
        self.tables.insert(id, TableEntry { schema: Arc::new(schema) });
        Ok(id)
    }

    /// Parse a schema file and add every table it declares.
    pub fn load_schema_str(&mut self, contents: &str) -> Result<Vec<TableId>, CatalogError> {
        parse_schema_file(contents)?.into_iter().map(|schema| self.add_table(schema)).collect()
    }

    /// Look up a table id by name.
    pub fn table_id(&self, name: &str) -> Result<TableId, CatalogError> {
        self.names.get(name).copied().ok_or_else(|| CatalogError::TableNameNotFound(name.to_string()))
    }

    pub fn schema(&self, id: TableId) -> Result<Arc<TableSchema>, CatalogError> {
        self.entry(id).map(|entry| Arc::clone(&entry.schema))
    }

    pub fn table_name(&self, id: TableId) -> Result<&str, CatalogError> {
        self.entry(id).map(|entry| entry.schema.name.as_str())
    }

    pub fn primary_key(&self, id: TableId) -> Result<Option<&str>, CatalogError> {
        self.entry(id).map(|entry| entry.schema.primary_key.as_deref())
    }

    /// All table ids, ascending.
    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.keys().copied().collect()
    }

    pub fn contains(&self, id: TableId) -> bool {
        self.tables.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Remove every table. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.tables.clear();
        self.names.clear();
    }

    fn entry(&self, id: TableId) -> Result<&TableEntry, CatalogError> {
        self.tables.get(&id).ok_or(CatalogError::TableNotFound(id))
    }
}
