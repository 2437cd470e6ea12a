use crate::{errors::CatalogError, ColumnSchema};

/// Table schema definition: an ordered list of typed columns.
///
/// The row width derived from the columns is what a heap page uses as its
/// slot size, so a schema must not change once rows have been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
    pub primary_key: Option<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        TableSchema { name: name.into(), columns, primary_key: None }
    }

    /// Create a table schema with a primary key column.
    pub fn with_primary_key(
        name: impl Into<String>,
        columns: Vec<ColumnSchema>,
        primary_key: impl Into<String>,
    ) -> Self {
        TableSchema { name: name.into(), columns, primary_key: Some(primary_key.into()) }
    }

    /// Reject schemas that name the same column twice.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(CatalogError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Get a column by index
    pub fn column(&self, index: usize) -> Option<&ColumnSchema> {
        self.columns.get(index)
    }

    /// Get the position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Serialized width of one row, in bytes.
    pub fn row_width(&self) -> usize {
        self.columns.iter().map(|c| c.data_type.byte_width()).sum()
    }
}
