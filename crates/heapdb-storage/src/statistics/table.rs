use std::sync::Arc;

use heapdb_catalog::{TableId, TableSchema};
use heapdb_types::{ComparisonOp, DataType, SqlValue};
use tracing::debug;

use super::histogram::{ColumnHistogram, IntHistogram, StringHistogram};
use crate::{
    scan::{ScanProvider, SchemaProvider},
    StorageError, Tuple,
};

/// Buckets per column histogram. Fewer buckets than this are not supported.
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 100;

/// Cost and selectivity statistics for one table.
///
/// Built by two sequential scans and read-only afterwards, so any number of
/// planners can query one instance concurrently.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStatistics {
    table_id: TableId,
    table_name: String,
    schema: Arc<TableSchema>,
    page_count: usize,
    tuple_count: u64,
    io_cost_per_page: f64,
    histograms: Vec<ColumnHistogram>,
}

impl TableStatistics {
    pub fn build<S>(source: &S, table_id: TableId, io_cost_per_page: f64) -> Result<Self, StorageError>
    where
        S: SchemaProvider + ScanProvider + ?Sized,
    {
        Self::build_with_buckets(source, table_id, io_cost_per_page, DEFAULT_HISTOGRAM_BUCKETS)
    }

    /// Scan `table_id` twice: once for integer column bounds and the tuple
    /// count, once to fill the histograms.
    pub fn build_with_buckets<S>(
        source: &S,
        table_id: TableId,
        io_cost_per_page: f64,
        buckets: usize,
    ) -> Result<Self, StorageError>
    where
        S: SchemaProvider + ScanProvider + ?Sized,
    {
        if buckets < DEFAULT_HISTOGRAM_BUCKETS {
            return Err(StorageError::InvalidConfig(format!(
                "histograms need at least {} buckets, got {}",
                DEFAULT_HISTOGRAM_BUCKETS, buckets
            )));
        }

        let schema = source.schema_of(table_id)?;
        let table_name = source.table_name(table_id)?;
        let page_count = source.page_count(table_id)?;
        let mut scan = source.open_scan(table_id)?;

        let mut bounds: Vec<Option<(i32, i32)>> = vec![None; schema.column_count()];
        let mut tuple_count = 0u64;
        while scan.has_next()? {
            let tuple = scan.next()?;
            tuple_count += 1;
            for (index, column) in schema.columns.iter().enumerate() {
                if column.data_type.is_numeric() {
                    let v = tuple.int_field(index)?;
                    bounds[index] = Some(match bounds[index] {
                        Some((lo, hi)) => (lo.min(v), hi.max(v)),
                        None => (v, v),
                    });
                }
            }
        }

        scan.rewind()?;

        let mut histograms: Vec<ColumnHistogram> = schema
            .columns
            .iter()
            .zip(&bounds)
            .map(|(column, bounds)| match column.data_type {
                DataType::Integer => {
                    let (lo, hi) = bounds.unwrap_or((0, 0));
                    ColumnHistogram::Integer(IntHistogram::new(buckets, lo as i64, hi as i64))
                }
                DataType::Varchar { .. } => ColumnHistogram::Varchar(StringHistogram::new(buckets)),
            })
            .collect();

        while scan.has_next()? {
            observe_tuple(&mut histograms, &scan.next()?)?;
        }
        scan.close();

        debug!(table = %table_name, pages = page_count, tuples = tuple_count, "built table statistics");
        Ok(TableStatistics {
            table_id,
            table_name,
            schema,
            page_count,
            tuple_count,
            io_cost_per_page,
            histograms,
        })
    }

    /// Cost of reading the whole table sequentially.
    pub fn estimate_scan_cost(&self) -> f64 {
        self.page_count as f64 * self.io_cost_per_page
    }

    /// Tuples expected to pass a predicate of the given selectivity.
    pub fn estimate_cardinality(&self, selectivity: f64) -> u64 {
        (self.tuple_count as f64 * selectivity).floor() as u64
    }

    /// Selectivity of `column op literal`.
    pub fn estimate_selectivity(
        &self,
        column: usize,
        op: ComparisonOp,
        literal: &SqlValue,
    ) -> Result<f64, StorageError> {
        let histogram = self.histogram(column)?;
        histogram.estimate_selectivity(op, literal).ok_or_else(|| StorageError::TypeMismatch {
            column,
            expected: histogram.type_name().to_string(),
            actual: literal.type_name().to_string(),
        })
    }

    /// Selectivity of `column op ?` when the literal is not known yet.
    pub fn average_selectivity(&self, column: usize, _op: ComparisonOp) -> Result<f64, StorageError> {
        Ok(self.histogram(column)?.average_selectivity())
    }

    pub fn histogram(&self, column: usize) -> Result<&ColumnHistogram, StorageError> {
        self.histograms
            .get(column)
            .ok_or(StorageError::InvalidColumn { index: column, column_count: self.histograms.len() })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn tuple_count(&self) -> u64 {
        self.tuple_count
    }

    pub fn io_cost_per_page(&self) -> f64 {
        self.io_cost_per_page
    }
}

/// Add each field of `tuple` to the histogram of its column.
fn observe_tuple(histograms: &mut [ColumnHistogram], tuple: &Tuple) -> Result<(), StorageError> {
    for (index, histogram) in histograms.iter_mut().enumerate() {
        let value = tuple
            .get(index)
            .ok_or(StorageError::InvalidColumn { index, column_count: tuple.len() })?;
        if !histogram.observe(value) {
            return Err(StorageError::TypeMismatch {
                column: index,
                expected: histogram.type_name().to_string(),
                actual: value.type_name().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use heapdb_catalog::ColumnSchema;
    use tempfile::TempDir;

    use super::*;
    use crate::{config::StorageConfig, Database, Tuple};

    fn people(rows: i32) -> (TempDir, Database, TableId) {
        let temp_dir = TempDir::new().unwrap();
        let mut db = Database::new(&StorageConfig::default());
        let schema = TableSchema::new(
            "people",
            vec![
                ColumnSchema::new("id", DataType::Integer),
                ColumnSchema::new("name", DataType::string()),
            ],
        );
        let id = db.create_table(temp_dir.path(), schema).unwrap();
        let tuples = (0..rows).map(|i| {
            Tuple::new(vec![SqlValue::Integer(i * 2), SqlValue::from(format!("person{}", i % 7))])
        });
        db.database_file_of(id).unwrap().append_tuples(id, &db.schema_of(id).unwrap(), tuples).unwrap();
        (temp_dir, db, id)
    }

    #[test]
    fn test_build_counts_tuples_and_pages() {
        let (_dir, db, id) = people(50);
        let stats = TableStatistics::build(&db, id, 1000.0).unwrap();
        assert_eq!(stats.table_name(), "people");
        assert_eq!(stats.tuple_count(), 50);
        // 136 byte rows fit 30 to a page
        assert_eq!(stats.page_count(), 2);
        assert_eq!(stats.estimate_scan_cost(), 2000.0);
        assert_eq!(stats.estimate_cardinality(0.5), 25);
        assert_eq!(stats.estimate_cardinality(0.03), 1);

        match stats.histogram(0).unwrap() {
            ColumnHistogram::Integer(h) => {
                assert_eq!(h.min(), 0);
                assert_eq!(h.max(), 98);
                assert_eq!(h.total_count(), 50);
            }
            other => panic!("expected an integer histogram, got {:?}", other),
        }
        assert_eq!(stats.histogram(1).unwrap().total_count(), 50);
    }

    #[test]
    fn test_estimates_follow_the_data() {
        let (_dir, db, id) = people(100);
        let stats = TableStatistics::build(&db, id, 1000.0).unwrap();
        let above_half =
            stats.estimate_selectivity(0, ComparisonOp::Greater, &SqlValue::Integer(100)).unwrap();
        assert!(above_half > 0.4 && above_half < 0.6, "got {}", above_half);
        assert_eq!(
            stats.estimate_selectivity(0, ComparisonOp::Greater, &SqlValue::Integer(198)).unwrap(),
            0.0
        );
        assert_eq!(
            stats.estimate_selectivity(0, ComparisonOp::Equal, &SqlValue::Integer(-1)).unwrap(),
            0.0
        );
        assert!(stats.average_selectivity(1, ComparisonOp::Equal).unwrap() > 0.0);
    }

    #[test]
    fn test_invalid_column_and_type_mismatch() {
        let (_dir, db, id) = people(5);
        let stats = TableStatistics::build(&db, id, 1000.0).unwrap();
        assert_eq!(
            stats.estimate_selectivity(2, ComparisonOp::Equal, &SqlValue::Integer(1)).unwrap_err(),
            StorageError::InvalidColumn { index: 2, column_count: 2 }
        );
        assert!(matches!(
            stats.average_selectivity(9, ComparisonOp::Less),
            Err(StorageError::InvalidColumn { index: 9, .. })
        ));
        assert_eq!(
            stats.estimate_selectivity(0, ComparisonOp::Equal, &SqlValue::from("x")).unwrap_err(),
            StorageError::TypeMismatch {
                column: 0,
                expected: "INTEGER".to_string(),
                actual: "VARCHAR".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_table() {
        let (_dir, db, id) = people(0);
        let stats = TableStatistics::build(&db, id, 1000.0).unwrap();
        assert_eq!(stats.tuple_count(), 0);
        assert_eq!(stats.page_count(), 0);
        assert_eq!(stats.estimate_scan_cost(), 0.0);
        assert_eq!(
            stats.estimate_selectivity(0, ComparisonOp::Equal, &SqlValue::Integer(0)).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_too_few_buckets() {
        let (_dir, db, id) = people(5);
        assert!(matches!(
            TableStatistics::build_with_buckets(&db, id, 1000.0, 99),
            Err(StorageError::InvalidConfig(_))
        ));
        let stats = TableStatistics::build_with_buckets(&db, id, 1000.0, 400).unwrap();
        assert_eq!(stats.histogram(1).unwrap().total_count(), 5);
    }

    #[test]
    fn test_unknown_table() {
        let db = Database::new(&StorageConfig::default());
        assert_eq!(
            TableStatistics::build(&db, TableId(4), 1000.0).unwrap_err(),
            StorageError::UnknownTable(TableId(4))
        );
    }

    #[test]
    fn test_observe_tuple_rejects_mismatched_fields() {
        let mut histograms = vec![
            ColumnHistogram::Integer(IntHistogram::new(4, 0, 10)),
            ColumnHistogram::Varchar(StringHistogram::new(4)),
        ];

        let wrong_type = Tuple::new(vec![SqlValue::from("x"), SqlValue::from("y")]);
        assert_eq!(
            observe_tuple(&mut histograms, &wrong_type).unwrap_err(),
            StorageError::TypeMismatch {
                column: 0,
                expected: "INTEGER".to_string(),
                actual: "VARCHAR".to_string(),
            }
        );

        let short = Tuple::new(vec![SqlValue::Integer(3)]);
        assert_eq!(
            observe_tuple(&mut histograms, &short).unwrap_err(),
            StorageError::InvalidColumn { index: 1, column_count: 1 }
        );

        let fine = Tuple::new(vec![SqlValue::Integer(3), SqlValue::from("y")]);
        observe_tuple(&mut histograms, &fine).unwrap();
        assert_eq!(histograms[1].total_count(), 1);
    }
}
