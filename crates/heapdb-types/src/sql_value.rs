//! Values stored in tuple fields

use std::fmt;

use crate::DataType;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SqlValue {
    Integer(i32),
    Varchar(String),
}

impl SqlValue {
    /// Name of the value's type, used in type mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Integer(_) => "INTEGER",
            SqlValue::Varchar(_) => "VARCHAR",
        }
    }

    /// Whether this value can be stored in a column of `data_type`.
    ///
    /// Strings must also fit inside the declared maximum length.
    pub fn fits(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (SqlValue::Integer(_), DataType::Integer) => true,
            (SqlValue::Varchar(s), DataType::Varchar { max_length }) => s.len() <= *max_length,
            _ => false,
        }
    }

    /// Parse a textual literal as a value of `data_type`.
    pub fn parse_as(text: &str, data_type: &DataType) -> Option<SqlValue> {
        match data_type {
            DataType::Integer => text.trim().parse().ok().map(SqlValue::Integer),
            DataType::Varchar { max_length } => {
                let value = text.trim();
                (value.len() <= *max_length).then(|| SqlValue::Varchar(value.to_string()))
            }
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Varchar(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Varchar(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Varchar(value)
    }
}
