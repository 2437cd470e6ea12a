//! Table statistics for cost-based planning
//!
//! - [`histogram`]: bounded per-column histograms answering selectivity questions
//! - [`table`]: per-table scan cost, cardinality and selectivity estimates
//! - [`registry`]: the shared name to statistics map planners read from

pub mod histogram;
pub mod registry;
pub mod table;

pub use histogram::{ColumnHistogram, IntHistogram, StringHistogram};
pub use registry::{RecomputeReport, StatisticsRegistry};
pub use table::{TableStatistics, DEFAULT_HISTOGRAM_BUCKETS};
