//! Column data types and their on-disk widths

use std::fmt;

/// Width in bytes of a serialized INTEGER field.
pub const INTEGER_WIDTH: usize = 4;

/// Width in bytes of the length prefix written before every string payload.
pub const STRING_LENGTH_PREFIX: usize = 4;

/// Maximum payload length of a `string` column declared without an explicit length.
pub const DEFAULT_STRING_LENGTH: usize = 128;

/// Type of a column.
///
/// Every type has a fixed serialized width so that a row of any schema
/// occupies exactly the same number of bytes in every slot of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Signed 32-bit integer
    Integer,
    /// UTF-8 string of at most `max_length` bytes
    Varchar { max_length: usize },
}

impl DataType {
    /// A string type with the default maximum length.
    pub fn string() -> Self {
        DataType::Varchar { max_length: DEFAULT_STRING_LENGTH }
    }

    /// Number of bytes a value of this type occupies inside a slot.
    ///
    /// Strings always reserve their declared maximum, plus the length prefix.
    pub fn byte_width(&self) -> usize {
        match self {
            DataType::Integer => INTEGER_WIDTH,
            DataType::Varchar { max_length } => STRING_LENGTH_PREFIX + max_length,
        }
    }

    /// Whether min/max bounds can be tracked for this type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "INTEGER"),
            DataType::Varchar { max_length } => write!(f, "VARCHAR({})", max_length),
        }
    }
}
