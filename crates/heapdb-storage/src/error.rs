// ============================================================================
// Errors
// ============================================================================

use heapdb_catalog::{CatalogError, TableId};

use crate::identity::{PageId, RecordId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("Malformed page {page_id}: {reason}")]
    MalformedPage { page_id: PageId, reason: String },

    #[error("Invalid page size: expected {expected}, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("Unknown table id {0}")]
    UnknownTable(TableId),

    #[error("Column index {index} out of range for a table with {column_count} columns")]
    InvalidColumn { index: usize, column_count: usize },

    #[error("Type mismatch in column {column}: expected {expected}, got {actual}")]
    TypeMismatch { column: usize, expected: String, actual: String },

    #[error("Tuple has {actual} values but the schema has {expected} columns")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Slot {slot} out of range for a page with {slot_count} slots")]
    SlotOutOfRange { slot: usize, slot_count: usize },

    #[error("Slot {slot} of page {page_id} is empty")]
    SlotEmpty { page_id: PageId, slot: usize },

    #[error("Page {0} has no free slots")]
    PageFull(PageId),

    #[error("Record {record_id} is not stored on page {page_id}")]
    RecordNotOnPage { record_id: RecordId, page_id: PageId },

    #[error("Page {page_number} does not exist in a file of {page_count} pages")]
    InvalidPageNumber { page_number: u32, page_count: usize },

    #[error("Scan has no more tuples")]
    ScanExhausted,

    #[error("Scan has been closed")]
    ScanClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}
