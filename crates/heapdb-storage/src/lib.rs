//! Storage - Heap Pages, Scans and Table Statistics
//!
//! This crate stores tables as files of fixed-size heap pages, scans them
//! through an LRU buffer pool, and builds the per-table statistics a cost
//! based planner reads.

pub mod buffer;
pub mod config;
pub mod database;
pub mod error;
pub mod heap_file;
pub mod identity;
pub mod page;
pub mod scan;
pub mod statistics;
pub mod tuple;

pub use buffer::{BufferPool, BufferPoolStats};
pub use config::{Config, LoggingConfig, RecomputePolicy, StatisticsConfig, StorageConfig};
pub use database::Database;
pub use error::StorageError;
pub use heap_file::HeapFile;
pub use identity::{PageId, RecordId, TransactionId};
pub use page::{empty_page_bytes, HeapPage, PageLayout, PAGE_SIZE};
pub use scan::{HeapScan, ScanProvider, SchemaProvider, SequentialScan};
pub use statistics::{
    ColumnHistogram, IntHistogram, RecomputeReport, StatisticsRegistry, StringHistogram,
    TableStatistics, DEFAULT_HISTOGRAM_BUCKETS,
};
pub use tuple::Tuple;
