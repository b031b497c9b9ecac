//! Runtime configuration for batch scoring.
//!
//! Configuration is passed explicitly into [`crate::commands::score::BatchScorer`];
//! nothing here is process-global.

use std::time::Duration;

/// Number of decimal places scores are rounded to.
pub const DEFAULT_PRECISION: u32 = 4;

/// Settings for a [`crate::commands::score::BatchScorer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreConfig {
    /// Worker threads for the scoring pool (default: number of CPUs).
    pub threads: Option<usize>,
    /// Batch deadline. A batch still running past it is abandoned as a whole.
    pub timeout: Option<Duration>,
    /// Decimal places kept in each reported Jaccard index.
    pub precision: u32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreConfig {
    pub fn new() -> Self {
        Self {
            threads: None,
            timeout: None,
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }
}

/// Round a score to `precision` decimal places.
///
/// Rounds the exact binary value, with halfway cases going to the even
/// digit, so `1/32` becomes `0.0312`.
pub fn round_score(value: f64, precision: u32) -> f64 {
    format!("{:.*}", precision as usize, value)
        .parse()
        .unwrap_or(value)
}
