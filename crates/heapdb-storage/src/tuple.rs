use heapdb_types::SqlValue;

use crate::{identity::RecordId, StorageError};

/// A single row of data, plus where it is stored once it has been placed on
/// a page.
#[derive(Debug, Clone)]
pub struct Tuple {
    pub values: Vec<SqlValue>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Create a new tuple from values
    pub fn new(values: Vec<SqlValue>) -> Self {
        Tuple { values, record_id: None }
    }

    /// Get value at column index
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Get number of columns in this tuple
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Integer value at column `index`.
    pub fn int_field(&self, index: usize) -> Result<i32, StorageError> {
        match self.field(index)? {
            SqlValue::Integer(v) => Ok(*v),
            other => Err(StorageError::TypeMismatch {
                column: index,
                expected: "INTEGER".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// String value at column `index`.
    pub fn string_field(&self, index: usize) -> Result<&str, StorageError> {
        match self.field(index)? {
            SqlValue::Varchar(s) => Ok(s),
            other => Err(StorageError::TypeMismatch {
                column: index,
                expected: "VARCHAR".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    fn field(&self, index: usize) -> Result<&SqlValue, StorageError> {
        self.values
            .get(index)
            .ok_or(StorageError::InvalidColumn { index, column_count: self.values.len() })
    }
}

// Two tuples are equal when their values are; where they live does not matter.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl From<Vec<SqlValue>> for Tuple {
    fn from(values: Vec<SqlValue>) -> Self {
        Tuple::new(values)
    }
}
