/// Number of histogram buckets; the last one also counts every larger delta.
pub const HISTOGRAM_BUCKETS: usize = 500;

/// Inter-packet delay histogram with one bucket per millisecond.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaHistogram {
    buckets: Box<[u64; HISTOGRAM_BUCKETS]>,
}

impl Default for DeltaHistogram {
    fn default() -> Self {
        Self {
            buckets: Box::new([0; HISTOGRAM_BUCKETS]),
        }
    }
}

impl DeltaHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket a delta falls in. Negative deltas land in bucket 0.
    pub fn bucket_for(delta_ms: i64) -> usize {
        delta_ms.clamp(0, HISTOGRAM_BUCKETS as i64 - 1) as usize
    }

    /// Count one delta and return its bucket.
    pub fn record(&mut self, delta_ms: i64) -> usize {
        let bucket = Self::bucket_for(delta_ms);
        self.buckets[bucket] += 1;
        bucket
    }

    pub fn count(&self, bucket: usize) -> u64 {
        self.buckets.get(bucket).copied().unwrap_or(0)
    }

    /// Total of all buckets.
    pub fn total(&self) -> u64 {
        self.buckets.iter().sum()
    }

    /// Non-empty buckets in ascending order, as `(milliseconds, packets)`.
    pub fn rows(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count != 0)
            .map(|(ms, &count)| (ms, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_into_range() {
        let mut histogram = DeltaHistogram::new();
        assert_eq!(histogram.record(10_000), 499);
        assert_eq!(histogram.record(499), 499);
        assert_eq!(histogram.record(-5), 0);
        assert_eq!(histogram.record(20), 20);

        assert_eq!(histogram.count(499), 2);
        assert_eq!(histogram.count(0), 1);
        assert_eq!(histogram.count(HISTOGRAM_BUCKETS), 0);
        assert_eq!(histogram.total(), 4);
    }

    #[test]
    fn test_rows_skip_empty_buckets() {
        let mut histogram = DeltaHistogram::new();
        for delta in [20, 20, 19, 40] {
            histogram.record(delta);
        }
        let rows: Vec<_> = histogram.rows().collect();
        assert_eq!(rows, vec![(19, 1), (20, 2), (40, 1)]);
    }
}
