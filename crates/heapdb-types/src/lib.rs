//! Types - column types and values
//!
//! The primitive domains a heap page can store, and the comparison
//! operators the statistics layer estimates selectivity for.

mod data_type;
mod operator;
mod sql_value;

pub use data_type::{DataType, DEFAULT_STRING_LENGTH, INTEGER_WIDTH, STRING_LENGTH_PREFIX};
pub use operator::{ComparisonOp, ParseOperatorError};
pub use sql_value::SqlValue;
