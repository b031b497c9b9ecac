//! Jaccard command implementation.
//!
//! Computes the Jaccard index between two normalized interval sets with a
//! single two-pointer merge sweep. Overlaps are summed pairwise as the
//! cursors advance; intervals inside one set are never merged first, so a
//! set with internally overlapping intervals can report more overlap than the
//! geometric intersection of the covered bases.

use crate::bed::{parse_source, BedError};
use crate::interval::Interval;
use std::cmp::Ordering;
use std::io::Write;
use std::path::Path;

/// Sum of pairwise overlap met by the merge sweep.
///
/// Both inputs must be sorted by `(chrom, start)`; they are not checked.
pub fn overlap_length(a: &[Interval], b: &[Interval]) -> u64 {
    let mut overlap: u64 = 0;
    let mut i = 0;
    let mut j = 0;

    while i < a.len() && j < b.len() {
        let ia = &a[i];
        let ib = &b[j];

        match ia.chrom.cmp(&ib.chrom) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let start = ia.start.max(ib.start);
                let end = ia.end.min(ib.end);
                if start < end {
                    overlap = overlap.saturating_add(end.abs_diff(start));
                }

                // On equal ends only B advances.
                if ia.end < ib.end {
                    i += 1;
                } else {
                    j += 1;
                }
            }
        }
    }

    overlap
}

/// Jaccard index of two sorted sets given their total lengths.
///
/// `union = len_a + len_b - overlap`; a non-positive union yields `0.0`.
pub fn jaccard(a: &[Interval], len_a: u64, b: &[Interval], len_b: u64) -> f64 {
    JaccardStats::compute(a, len_a, b, len_b).jaccard
}

/// Intermediate values of one comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JaccardStats {
    pub intersection: u64,
    /// May be negative when the supplied lengths disagree with the intervals.
    pub union: i128,
    pub jaccard: f64,
}

impl JaccardStats {
    pub fn compute(a: &[Interval], len_a: u64, b: &[Interval], len_b: u64) -> Self {
        let intersection = overlap_length(a, b);
        let union = len_a as i128 + len_b as i128 - intersection as i128;
        let jaccard = if union > 0 {
            intersection as f64 / union as f64
        } else {
            0.0
        };

        Self {
            intersection,
            union,
            jaccard,
        }
    }
}

/// Jaccard command configuration.
#[derive(Debug, Clone, Default)]
pub struct JaccardCommand;

impl JaccardCommand {
    pub fn new() -> Self {
        Self
    }

    /// Parse both sources and compare them.
    pub fn compare<P: AsRef<Path>>(&self, input_a: P, input_b: P) -> Result<JaccardStats, BedError> {
        let a = parse_source(input_a)?;
        let b = parse_source(input_b)?;
        Ok(JaccardStats::compute(&a, a.total_length(), &b, b.total_length()))
    }

    /// Run jaccard analysis between two files and write a one-row report.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        input_a: P,
        input_b: P,
        output: &mut W,
    ) -> Result<(), BedError> {
        let stats = self.compare(input_a, input_b)?;
        let mut ryu_buf = ryu::Buffer::new();

        writeln!(output, "intersection\tunion\tjaccard")?;
        writeln!(
            output,
            "{}\t{}\t{}",
            stats.intersection,
            stats.union,
            ryu_buf.format(crate::config::round_score(
                stats.jaccard,
                crate::config::DEFAULT_PRECISION
            ))
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bed::parse_intervals;
    use crate::interval::IntervalSet;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::io::Write as IoWrite;
    use tempfile::NamedTempFile;

    fn set(content: &str) -> IntervalSet {
        parse_intervals(content)
    }

    fn score(a: &IntervalSet, b: &IntervalSet) -> f64 {
        jaccard(a, a.total_length(), b, b.total_length())
    }

    fn create_temp_bed(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    /// Random set whose intervals never overlap each other.
    fn random_set(rng: &mut SmallRng) -> IntervalSet {
        let mut intervals = Vec::new();
        for chrom in ["chr1", "chr2", "chrX"] {
            let mut pos = 0i64;
            for _ in 0..rng.gen_range(0..15) {
                let start = pos + rng.gen_range(0..50i64);
                let end = start + rng.gen_range(1..200i64);
                intervals.push(Interval::new(chrom, start, end));
                pos = end;
            }
        }
        IntervalSet::from_unsorted(intervals)
    }

    #[test]
    fn test_partial_overlap() {
        let a = set("chr1\t10\t20\n");
        let b = set("chr1\t15\t25\n");

        let stats = JaccardStats::compute(&a, 10, &b, 10);
        assert_eq!(stats.intersection, 5);
        assert_eq!(stats.union, 15);
        assert_eq!(crate::config::round_score(stats.jaccard, 4), 0.3333);
    }

    #[test]
    fn test_self_comparison() {
        let a = set("chr1\t100\t200\nchr1\t300\t400\nchr2\t5\t50\n");
        assert_eq!(score(&a, &a), 1.0);
    }

    #[test]
    fn test_disjoint_chromosomes() {
        let a = set("chr1\t100\t200\n");
        let b = set("chr2\t100\t200\n");

        assert_eq!(overlap_length(&a, &b), 0);
        assert_eq!(score(&a, &b), 0.0);
    }

    #[test]
    fn test_both_empty() {
        let a = IntervalSet::empty();
        let b = IntervalSet::empty();

        let value = score(&a, &b);
        assert_eq!(value, 0.0);
        assert!(!value.is_nan());
    }

    #[test]
    fn test_one_empty() {
        let a = set("chr1\t100\t200\n");
        let b = IntervalSet::empty();
        assert_eq!(score(&a, &b), 0.0);
    }

    #[test]
    fn test_back_to_back() {
        // Half-open: [100,200) and [200,300) share no base.
        let a = set("chr1\t100\t200\n");
        let b = set("chr1\t200\t300\n");
        assert_eq!(overlap_length(&a, &b), 0);
    }

    #[test]
    fn test_nested_intervals() {
        let a = set("chr1\t100\t400\n");
        let b = set("chr1\t150\t250\n");

        let stats = JaccardStats::compute(&a, 300, &b, 100);
        assert_eq!(stats.intersection, 100);
        assert_eq!(stats.union, 300);
    }

    #[test]
    fn test_equal_end_advances_b_only() {
        // A=[0,10),[5,20)  B=[0,10),[8,12)
        // Sweep: (A0,B0) ends tie -> j=1; (A0,B1) ov 2, A0.end<B1.end -> i=1;
        // (A1,B1) ov 4. Total 10 + 2 + 4 = 16.
        let a = set("chr1\t0\t10\nchr1\t5\t20\n");
        let b = set("chr1\t0\t10\nchr1\t8\t12\n");
        assert_eq!(overlap_length(&a, &b), 16);
        // Swapping sides changes which cursor moves on the tie.
        assert_eq!(overlap_length(&b, &a), 19);
    }

    #[test]
    fn test_internal_overlaps_are_not_merged() {
        // A holds two copies of the same interval; the sweep meets B once per copy
        // until B is exhausted.
        let a = set("chr1\t0\t10\nchr1\t0\t10\n");
        let b = set("chr1\t0\t20\n");
        assert_eq!(overlap_length(&a, &b), 20);
        assert_eq!(score(&a, &b), 1.0);
    }

    #[test]
    fn test_inconsistent_lengths_do_not_underflow() {
        let a = set("chr1\t0\t100\n");
        let b = set("chr1\t0\t100\n");
        let stats = JaccardStats::compute(&a, 10, &b, 10);
        assert_eq!(stats.union, -80);
        assert_eq!(stats.jaccard, 0.0);
    }

    #[test]
    fn test_random_sets_are_bounded_and_symmetric() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let a = random_set(&mut rng);
            let b = random_set(&mut rng);

            let ab = score(&a, &b);
            let ba = score(&b, &a);
            assert!((0.0..=1.0).contains(&ab), "out of range: {}", ab);
            assert_eq!(ab, ba);
            if !a.is_empty() {
                assert_eq!(score(&a, &a), 1.0);
            }
        }
    }

    #[test]
    fn test_run_report() {
        let a_file = create_temp_bed("chr1\t10\t20\n");
        let b_file = create_temp_bed("chr1\t15\t25\n");

        let cmd = JaccardCommand::new();
        let mut output = Vec::new();
        cmd.run(a_file.path(), b_file.path(), &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output_str.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "intersection\tunion\tjaccard");
        assert_eq!(lines[1], "5\t15\t0.3333");
    }

    #[test]
    fn test_run_missing_file() {
        let a_file = create_temp_bed("chr1\t10\t20\n");
        let cmd = JaccardCommand::new();
        let mut output = Vec::new();
        let result = cmd.run(
            a_file.path(),
            std::path::Path::new("/nonexistent/b.bed"),
            &mut output,
        );
        assert!(result.is_err());
    }
}
