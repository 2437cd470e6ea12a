use crate::TableId;

/// Errors returned by catalog operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Table with id {0} not found")]
    TableNotFound(TableId),

    #[error("Table '{0}' not found")]
    TableNameNotFound(String),

    #[error("Column '{column}' appears more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Invalid catalog entry on line {line}: {reason}")]
    InvalidSchemaLine { line: usize, reason: String },
}
