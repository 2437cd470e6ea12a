//! Catalog - Schema Metadata Storage
//!
//! Provides metadata structures for tables and columns along with the catalog
//! registry that maps table ids to names and schemas.

mod column;
pub mod errors;
mod schema_file;
mod store;
mod table;

pub use column::ColumnSchema;
pub use errors::CatalogError;
pub use schema_file::parse_schema_file;
pub use store::{Catalog, TableId};
pub use table::TableSchema;

#[cfg(test)]
mod tests;
