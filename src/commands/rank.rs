//! Ranking of batch results.
//!
//! Exact matches (a rounded score of exactly 1.0) are reported apart from the
//! rest, which are ordered by descending score and truncated. Scores above 1.0
//! can only come from sets with internally overlapping intervals; they belong
//! to neither group and are dropped.

use crate::commands::score::ComparisonResult;

/// Number of non-identical results shown when the caller asks for none in particular.
pub const DEFAULT_TOP_N: usize = 3;

/// Ranked view of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedOutput {
    /// Results scoring exactly 1.0, in input order.
    pub identical: Vec<ComparisonResult>,
    /// Results scoring below 1.0, best first.
    pub others: Vec<ComparisonResult>,
}

/// Split results into exact matches and the top `n` of those below 1.0.
///
/// Ties keep their input order. An `n` larger than the number of
/// non-identical results is clamped.
pub fn select(results: Vec<ComparisonResult>, n: usize) -> RankedOutput {
    let mut identical = Vec::new();
    let mut others = Vec::new();
    for result in results {
        if result.jaccard == 1.0 {
            identical.push(result);
        } else if result.jaccard < 1.0 {
            others.push(result);
        } else {
            log::debug!(
                "dropping {} from ranking: score {} is above 1.0",
                result.identifier,
                result.jaccard
            );
        }
    }

    // Stable sort, descending.
    others.sort_by(|a, b| b.jaccard.total_cmp(&a.jaccard));
    others.truncate(n.min(others.len()));

    RankedOutput { identical, others }
}

/// Result count used by the ranking front end.
///
/// Caps the requested count (default [`DEFAULT_TOP_N`]) at the number of
/// candidates, excluding the query itself when it is a registered dataset.
pub fn default_top_n(requested: Option<usize>, available: usize, query_is_registered: bool) -> usize {
    let candidates = if query_is_registered {
        available.saturating_sub(1)
    } else {
        available
    };
    requested.unwrap_or(DEFAULT_TOP_N).min(candidates)
}

#[derive(Debug, Clone)]
pub struct RankCommand {
    pub top_n: usize,
}

impl Default for RankCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl RankCommand {
    pub fn new() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn rank(&self, results: Vec<ComparisonResult>) -> RankedOutput {
        select(results, self.top_n)
    }
}
