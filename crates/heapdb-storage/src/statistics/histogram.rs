//! Fixed-size equal-width histograms used for selectivity estimation.
//!
//! A histogram never stores the observed values, only one counter per bucket,
//! so memory is bounded by the bucket count no matter how large the table is.

use heapdb_types::{ComparisonOp, SqlValue};

/// Equal-width histogram over the inclusive integer domain `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntHistogram {
    min: i64,
    max: i64,
    bucket_width: f64,
    buckets: Vec<u64>,
    total: u64,
}

impl IntHistogram {
    /// Create a histogram with `buckets` buckets over `[min, max]`.
    ///
    /// When the domain has no more distinct values than requested buckets,
    /// every value gets a bucket of its own. A `max` below `min` is raised
    /// to `min`.
    pub fn new(buckets: usize, min: i64, max: i64) -> Self {
        let max = max.max(min);
        let width = (max as i128 - min as i128 + 1) as u128;
        let requested = buckets.max(1);

        let (bucket_count, bucket_width) = if requested as u128 >= width {
            (width as usize, 1.0)
        } else {
            (requested, width as f64 / requested as f64)
        };

        IntHistogram { min, max, bucket_width, buckets: vec![0; bucket_count], total: 0 }
    }

    /// Record one value. Values outside the domain are ignored.
    pub fn observe(&mut self, value: i64) {
        if let Some(bucket) = self.bucket_of(value) {
            self.buckets[bucket] += 1;
            self.total += 1;
        }
    }

    /// Estimated fraction of observed values satisfying `value op v`.
    pub fn estimate_selectivity(&self, op: ComparisonOp, value: i64) -> f64 {
        let estimate = match op {
            ComparisonOp::Equal => self.equal(value),
            ComparisonOp::NotEqual => 1.0 - self.equal(value),
            ComparisonOp::Greater => self.greater(value),
            ComparisonOp::GreaterOrEqual => self.greater(value) + self.equal(value),
            ComparisonOp::Less => 1.0 - self.greater(value) - self.equal(value),
            ComparisonOp::LessOrEqual => 1.0 - self.greater(value),
        };
        estimate.clamp(0.0, 1.0)
    }

    /// `Σ count² / total²`, a density estimate for predicates without a literal.
    pub fn average_selectivity(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        let sum_of_squares: f64 = self.buckets.iter().map(|&c| (c as f64) * (c as f64)).sum();
        sum_of_squares / (total * total)
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_width(&self) -> f64 {
        self.bucket_width
    }

    pub fn bucket_counts(&self) -> &[u64] {
        &self.buckets
    }

    pub fn total_count(&self) -> u64 {
        self.total
    }

    fn bucket_of(&self, value: i64) -> Option<usize> {
        if value < self.min || value > self.max {
            return None;
        }
        let offset = (value as i128 - self.min as i128) as f64;
        let bucket = (offset / self.bucket_width).floor() as usize;
        Some(bucket.min(self.buckets.len() - 1))
    }

    fn equal(&self, value: i64) -> f64 {
        match self.bucket_of(value) {
            Some(bucket) if self.total > 0 => {
                self.buckets[bucket] as f64 / self.bucket_width / self.total as f64
            }
            _ => 0.0,
        }
    }

    // Whole buckets above the one holding `value`; its own bucket contributes nothing.
    fn greater(&self, value: i64) -> f64 {
        if value >= self.max {
            return 0.0;
        }
        if value < self.min {
            return 1.0;
        }
        if self.total == 0 {
            return 0.0;
        }
        let Some(bucket) = self.bucket_of(value) else {
            return 0.0;
        };
        let above: u64 = self.buckets[bucket + 1..].iter().sum();
        above as f64 / self.total as f64
    }
}

/// Histogram over strings, keyed by their first four bytes.
///
/// The key preserves byte order, so range estimates stay monotonic; strings
/// sharing a four byte prefix land in the same place.
#[derive(Debug, Clone, PartialEq)]
pub struct StringHistogram {
    inner: IntHistogram,
}

impl StringHistogram {
    const KEY_MAX: i64 = u32::MAX as i64;

    pub fn new(buckets: usize) -> Self {
        StringHistogram { inner: IntHistogram::new(buckets, 0, Self::KEY_MAX) }
    }

    pub fn observe(&mut self, value: &str) {
        self.inner.observe(Self::key(value));
    }

    pub fn estimate_selectivity(&self, op: ComparisonOp, value: &str) -> f64 {
        self.inner.estimate_selectivity(op, Self::key(value))
    }

    pub fn average_selectivity(&self) -> f64 {
        self.inner.average_selectivity()
    }

    pub fn total_count(&self) -> u64 {
        self.inner.total_count()
    }

    pub fn bucket_count(&self) -> usize {
        self.inner.bucket_count()
    }

    fn key(value: &str) -> i64 {
        let mut prefix = [0u8; 4];
        for (dst, src) in prefix.iter_mut().zip(value.as_bytes()) {
            *dst = *src;
        }
        u32::from_be_bytes(prefix) as i64
    }
}

/// Per-column histogram, chosen by the column's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnHistogram {
    Integer(IntHistogram),
    Varchar(StringHistogram),
}

impl ColumnHistogram {
    /// Record `value`. Returns false, recording nothing, when its type does
    /// not match the histogram.
    pub fn observe(&mut self, value: &SqlValue) -> bool {
        match (self, value) {
            (ColumnHistogram::Integer(h), SqlValue::Integer(v)) => h.observe(*v as i64),
            (ColumnHistogram::Varchar(h), SqlValue::Varchar(s)) => h.observe(s),
            _ => return false,
        }
        true
    }

    /// Selectivity of `column op value`, or `None` if `value` has the wrong type.
    pub fn estimate_selectivity(&self, op: ComparisonOp, value: &SqlValue) -> Option<f64> {
        match (self, value) {
            (ColumnHistogram::Integer(h), SqlValue::Integer(v)) => {
                Some(h.estimate_selectivity(op, *v as i64))
            }
            (ColumnHistogram::Varchar(h), SqlValue::Varchar(s)) => Some(h.estimate_selectivity(op, s)),
            _ => None,
        }
    }

    pub fn average_selectivity(&self) -> f64 {
        match self {
            ColumnHistogram::Integer(h) => h.average_selectivity(),
            ColumnHistogram::Varchar(h) => h.average_selectivity(),
        }
    }

    pub fn total_count(&self) -> u64 {
        match self {
            ColumnHistogram::Integer(h) => h.total_count(),
            ColumnHistogram::Varchar(h) => h.total_count(),
        }
    }

    /// Name of the value type this histogram accepts.
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnHistogram::Integer(_) => "INTEGER",
            ColumnHistogram::Varchar(_) => "VARCHAR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn uniform_1_to_100() -> IntHistogram {
        let mut h = IntHistogram::new(10, 1, 100);
        for v in 1..=100 {
            h.observe(v);
        }
        h
    }

    #[test]
    fn test_uniform_estimates() {
        let h = uniform_1_to_100();
        assert!((h.estimate_selectivity(ComparisonOp::Equal, 50) - 0.01).abs() < EPSILON);
        assert!((h.estimate_selectivity(ComparisonOp::Greater, 90) - 0.10).abs() < EPSILON);
    }

    #[test]
    fn test_equal_greater_less_sum_to_one() {
        let mut h = IntHistogram::new(100, -50, 1_000);
        for v in (-50..1_000).step_by(7) {
            h.observe(v);
            h.observe(v / 3);
        }
        for v in -50..=1_000 {
            let less = h.estimate_selectivity(ComparisonOp::Less, v);
            let equal = h.estimate_selectivity(ComparisonOp::Equal, v);
            let greater = h.estimate_selectivity(ComparisonOp::Greater, v);
            assert!((less + equal + greater - 1.0).abs() < EPSILON, "v = {}", v);
            assert_eq!(h.estimate_selectivity(ComparisonOp::NotEqual, v), 1.0 - equal);
            for op in ComparisonOp::ALL {
                let s = h.estimate_selectivity(op, v);
                assert!((0.0..=1.0).contains(&s), "{} {} gave {}", op, v, s);
            }
        }
    }

    #[test]
    fn test_domain_boundaries() {
        let h = uniform_1_to_100();
        assert_eq!(h.estimate_selectivity(ComparisonOp::Greater, 100), 0.0);
        assert_eq!(h.estimate_selectivity(ComparisonOp::Greater, 500), 0.0);
        assert_eq!(h.estimate_selectivity(ComparisonOp::Greater, 0), 1.0);
        assert_eq!(h.estimate_selectivity(ComparisonOp::Equal, 0), 0.0);
        assert_eq!(h.estimate_selectivity(ComparisonOp::Equal, 101), 0.0);
        assert_eq!(h.estimate_selectivity(ComparisonOp::LessOrEqual, 100), 1.0);
        assert_eq!(h.estimate_selectivity(ComparisonOp::Less, 0), 0.0);
    }

    #[test]
    fn test_buckets_collapse_to_single_values() {
        let h = IntHistogram::new(100, 10, 19);
        assert_eq!(h.bucket_count(), 10);
        assert_eq!(h.bucket_width(), 1.0);

        let exact = IntHistogram::new(10, 1, 10);
        assert_eq!(exact.bucket_count(), 10);
        assert_eq!(exact.bucket_width(), 1.0);
    }

    #[test]
    fn test_max_value_lands_in_last_bucket() {
        let mut h = IntHistogram::new(3, 0, 9);
        h.observe(9);
        h.observe(0);
        assert_eq!(h.bucket_counts(), &[1, 0, 1]);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut h = IntHistogram::new(10, 1, 100);
        h.observe(0);
        h.observe(101);
        assert_eq!(h.total_count(), 0);
        h.observe(1);
        assert_eq!(h.total_count(), 1);
    }

    #[test]
    fn test_empty_histogram() {
        let h = IntHistogram::new(100, 0, 0);
        assert_eq!(h.bucket_count(), 1);
        assert_eq!(h.estimate_selectivity(ComparisonOp::Equal, 0), 0.0);
        assert_eq!(h.estimate_selectivity(ComparisonOp::Less, 0), 1.0);
        assert_eq!(h.average_selectivity(), 0.0);
    }

    #[test]
    fn test_average_selectivity() {
        let mut h = IntHistogram::new(2, 0, 1);
        h.observe(0);
        h.observe(0);
        h.observe(1);
        h.observe(1);
        assert!((h.average_selectivity() - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_string_histogram_orders_by_prefix() {
        let mut h = StringHistogram::new(100);
        for name in ["alice", "bob", "carol", "dave", "erin", "mallory", "trent", "zed"] {
            h.observe(name);
        }
        assert_eq!(h.total_count(), 8);
        let below_m = h.estimate_selectivity(ComparisonOp::Less, "m");
        let below_z = h.estimate_selectivity(ComparisonOp::Less, "z");
        assert!(below_m <= below_z);
        assert!(h.estimate_selectivity(ComparisonOp::Equal, "bob") > 0.0);

        for literal in ["", "a", "bob", "mmmm", "zzzzzz"] {
            let less = h.estimate_selectivity(ComparisonOp::Less, literal);
            let equal = h.estimate_selectivity(ComparisonOp::Equal, literal);
            let greater = h.estimate_selectivity(ComparisonOp::Greater, literal);
            assert!((less + equal + greater - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_column_histogram_rejects_wrong_type() {
        let mut h = ColumnHistogram::Integer(IntHistogram::new(100, 0, 10));
        assert!(!h.observe(&SqlValue::from("x")));
        assert!(h.observe(&SqlValue::Integer(3)));
        assert_eq!(h.total_count(), 1);
        assert_eq!(h.estimate_selectivity(ComparisonOp::Equal, &SqlValue::from("x")), None);
        assert!(h.estimate_selectivity(ComparisonOp::Equal, &SqlValue::Integer(3)).is_some());
    }
}
