//! heapdb - heap-page storage and selectivity statistics
//!
//! This is the root crate that re-exports all components.

pub use heapdb_catalog as catalog;
pub use heapdb_storage as storage;
pub use heapdb_types as types;
