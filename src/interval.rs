//! Core interval types for genomic region representation.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

/// A genomic interval with chromosome, start, and end positions.
/// Uses 0-based, half-open coordinates (BED format). Coordinates are signed;
/// a negative start is kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
}

impl Interval {
    /// Create a new interval.
    #[inline]
    pub fn new(chrom: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Returns the length of the interval.
    #[inline]
    pub fn len(&self) -> u64 {
        if self.end > self.start {
            self.end.abs_diff(self.start)
        } else {
            0
        }
    }

    /// Returns true if the interval has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Compute the overlap length with another interval on the same chromosome.
    #[inline]
    pub fn overlap_length(&self, other: &Interval) -> u64 {
        if self.chrom != other.chrom {
            return 0;
        }
        let overlap_start = self.start.max(other.start);
        let overlap_end = self.end.min(other.end);
        if overlap_start < overlap_end {
            overlap_end.abs_diff(overlap_start)
        } else {
            0
        }
    }

    /// Sort key used for normalization: chromosome, then start.
    ///
    /// The end coordinate is not part of the key; under a stable sort,
    /// intervals with equal `(chrom, start)` keep their input order.
    #[inline]
    pub fn cmp_chrom_start(&self, other: &Interval) -> Ordering {
        self.chrom
            .cmp(&other.chrom)
            .then(self.start.cmp(&other.start))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)
    }
}

/// A normalized interval collection.
///
/// Intervals are sorted by `(chrom, start)` with a stable sort. Overlapping
/// intervals are kept as separate entries and each one contributes to
/// `total_length`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
    total_length: u64,
}

impl IntervalSet {
    /// Build a normalized set from intervals in any order.
    ///
    /// Intervals with `end < start` must already have been rejected by the caller.
    pub fn from_unsorted(mut intervals: Vec<Interval>) -> Self {
        intervals.sort_by(Interval::cmp_chrom_start);
        let total_length = intervals
            .iter()
            .fold(0u64, |acc, iv| acc.saturating_add(iv.len()));
        Self {
            intervals,
            total_length,
        }
    }

    /// An empty set with zero total length.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sum of `end - start` over every interval, overlaps counted twice.
    /// Saturates at `u64::MAX`.
    #[inline]
    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    #[inline]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Number of distinct chromosome labels in the set.
    pub fn chromosome_count(&self) -> usize {
        let mut count = 0;
        let mut last: Option<&str> = None;
        for iv in &self.intervals {
            if last != Some(iv.chrom.as_str()) {
                count += 1;
                last = Some(iv.chrom.as_str());
            }
        }
        count
    }
}

impl Deref for IntervalSet {
    type Target = [Interval];

    fn deref(&self) -> &[Interval] {
        &self.intervals
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_len() {
        assert_eq!(Interval::new("chr1", 100, 200).len(), 100);
        assert_eq!(Interval::new("chr1", 100, 100).len(), 0);
        assert!(Interval::new("chr1", 100, 100).is_empty());
    }

    #[test]
    fn test_interval_overlap_length() {
        let a = Interval::new("chr1", 100, 200);
        let b = Interval::new("chr1", 150, 250);
        let c = Interval::new("chr1", 200, 300);
        let d = Interval::new("chr2", 100, 200);

        assert_eq!(a.overlap_length(&b), 50);
        assert_eq!(a.overlap_length(&c), 0); // Adjacent, not overlapping
        assert_eq!(a.overlap_length(&d), 0); // Different chromosome
    }

    #[test]
    fn test_set_ordering() {
        let set = IntervalSet::from_unsorted(vec![
            Interval::new("chr2", 100, 200),
            Interval::new("chr1", 200, 300),
            Interval::new("chr1", 100, 200),
        ]);

        assert_eq!(set[0].chrom, "chr1");
        assert_eq!(set[0].start, 100);
        assert_eq!(set[1].start, 200);
        assert_eq!(set[2].chrom, "chr2");
        assert_eq!(set.chromosome_count(), 2);
    }

    #[test]
    fn test_set_sort_is_stable_on_equal_start() {
        let set = IntervalSet::from_unsorted(vec![
            Interval::new("chr1", 100, 500),
            Interval::new("chr1", 100, 150),
            Interval::new("chr1", 100, 300),
        ]);

        let ends: Vec<i64> = set.iter().map(|iv| iv.end).collect();
        assert_eq!(ends, vec![500, 150, 300]);
    }

    #[test]
    fn test_total_length_double_counts_overlaps() {
        let set = IntervalSet::from_unsorted(vec![
            Interval::new("chr1", 100, 200),
            Interval::new("chr1", 150, 250),
        ]);

        assert_eq!(set.total_length(), 200);
    }

    #[test]
    fn test_negative_start() {
        let iv = Interval::new("chr1", -5, 10);
        assert_eq!(iv.len(), 15);
        assert_eq!(iv.overlap_length(&Interval::new("chr1", -20, 0)), 5);
    }

    #[test]
    fn test_total_length_saturates() {
        let set = IntervalSet::from_unsorted(vec![
            Interval::new("chr1", i64::MIN, i64::MAX),
            Interval::new("chr2", i64::MIN, i64::MAX),
        ]);

        assert_eq!(set.total_length(), u64::MAX);
    }

    #[test]
    fn test_lexicographic_chrom_order() {
        let set: IntervalSet = vec![
            Interval::new("chr2", 0, 10),
            Interval::new("chr10", 0, 10),
            Interval::new("chr1", 0, 10),
        ]
        .into_iter()
        .collect();

        let chroms: Vec<&str> = set.iter().map(|iv| iv.chrom.as_str()).collect();
        assert_eq!(chroms, vec!["chr1", "chr10", "chr2"]);
    }
}
