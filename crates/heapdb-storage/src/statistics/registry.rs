use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

use parking_lot::RwLock;
use tracing::{info, warn};

use super::table::TableStatistics;
use crate::{
    config::{RecomputePolicy, StatisticsConfig},
    scan::{ScanProvider, SchemaProvider},
    StorageError,
};

/// Table statistics by table name, shared between planners.
///
/// Entries are swapped as whole `Arc`s under a write lock, so a reader holds
/// either the old statistics or the new ones and never a mix.
#[derive(Debug, Default)]
pub struct StatisticsRegistry {
    tables: RwLock<HashMap<String, Arc<TableStatistics>>>,
}

/// Outcome of [`StatisticsRegistry::recompute_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecomputeReport {
    /// Tables whose statistics were rebuilt and published.
    pub rebuilt: Vec<String>,
    /// Tables that failed to build; their previous statistics were kept.
    pub failed: Vec<(String, StorageError)>,
}

impl RecomputeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

static GLOBAL: OnceLock<StatisticsRegistry> = OnceLock::new();

impl StatisticsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static StatisticsRegistry {
        GLOBAL.get_or_init(StatisticsRegistry::new)
    }

    /// Publish `stats` under `table_name`, replacing any previous entry.
    pub fn register(&self, table_name: impl Into<String>, stats: TableStatistics) -> Arc<TableStatistics> {
        let stats = Arc::new(stats);
        self.register_arc(table_name, Arc::clone(&stats));
        stats
    }

    pub fn register_arc(&self, table_name: impl Into<String>, stats: Arc<TableStatistics>) {
        self.tables.write().insert(table_name.into(), stats);
    }

    pub fn lookup(&self, table_name: &str) -> Option<Arc<TableStatistics>> {
        self.tables.read().get(table_name).cloned()
    }

    /// Swap in a complete new set of entries.
    pub fn replace_all(&self, tables: HashMap<String, TableStatistics>) {
        let tables = tables.into_iter().map(|(name, stats)| (name, Arc::new(stats))).collect();
        *self.tables.write() = tables;
    }

    pub fn remove(&self, table_name: &str) -> Option<Arc<TableStatistics>> {
        self.tables.write().remove(table_name)
    }

    /// Registered table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    pub fn clear(&self) {
        self.tables.write().clear();
    }

    /// Rebuild the statistics of every table `source` knows about.
    ///
    /// Statistics are built without holding the lock. Under
    /// [`RecomputePolicy::ContinueOnError`] each table is published as soon as
    /// it is built and failures are collected in the report. Under
    /// [`RecomputePolicy::AbortOnError`] the first failure is returned and
    /// nothing is published.
    pub fn recompute_all<S>(
        &self,
        source: &S,
        config: &StatisticsConfig,
    ) -> Result<RecomputeReport, StorageError>
    where
        S: SchemaProvider + ScanProvider + ?Sized,
    {
        config.validate()?;
        let table_ids = source.table_ids();
        info!(tables = table_ids.len(), policy = ?config.recompute_policy, "computing table statistics");

        let mut report = RecomputeReport::default();
        let mut staged = Vec::new();
        for table_id in table_ids {
            let built = source.table_name(table_id).and_then(|name| {
                TableStatistics::build_with_buckets(
                    source,
                    table_id,
                    config.io_cost_per_page,
                    config.histogram_buckets,
                )
                .map(|stats| (name, stats))
            });

            match (built, config.recompute_policy) {
                (Ok((name, stats)), RecomputePolicy::ContinueOnError) => {
                    self.register(name.clone(), stats);
                    report.rebuilt.push(name);
                }
                (Ok(staged_entry), RecomputePolicy::AbortOnError) => staged.push(staged_entry),
                (Err(err), RecomputePolicy::ContinueOnError) => {
                    let name = source.table_name(table_id).unwrap_or_else(|_| table_id.to_string());
                    warn!(table = %name, error = %err, "failed to compute table statistics");
                    report.failed.push((name, err));
                }
                (Err(err), RecomputePolicy::AbortOnError) => {
                    warn!(table_id = %table_id, error = %err, "aborting statistics recompute");
                    return Err(err);
                }
            }
        }

        if !staged.is_empty() {
            let mut tables = self.tables.write();
            for (name, stats) in staged {
                report.rebuilt.push(name.clone());
                tables.insert(name, Arc::new(stats));
            }
        }

        info!(rebuilt = report.rebuilt.len(), failed = report.failed.len(), "done computing table statistics");
        Ok(report)
    }
}
