//! Command implementations for bedsim.

pub mod jaccard;
pub mod rank;
pub mod score;

pub use jaccard::{jaccard, overlap_length, JaccardCommand, JaccardStats};
pub use rank::{default_top_n, select, RankCommand, RankedOutput, DEFAULT_TOP_N};
pub use score::{BatchOutcome, BatchScorer, CandidateFailure, ComparisonResult};
