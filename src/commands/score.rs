//! Batch scoring of one query against many registered datasets.
//!
//! Each candidate is re-read from its source, compared against the query with
//! the merge sweep, and rounded. Candidates that cannot be read are reported
//! as [`CandidateFailure`]s and left out of the results; they never abort
//! the batch.

use crate::bed::BedError;
use crate::commands::jaccard::jaccard;
use crate::config::{round_score, ScoreConfig};
use crate::interval::Interval;
use crate::parallel::{CancellationToken, Interrupt, ScoreError, TaskPool};
use crate::registry::{Dataset, DatasetRegistry, FsSourceProvider, SourceProvider};
use std::time::Instant;

/// Score of one candidate against the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub identifier: String,
    /// Jaccard index, rounded.
    pub jaccard: f64,
}

impl ComparisonResult {
    pub fn new(identifier: impl Into<String>, jaccard: f64) -> Self {
        Self {
            identifier: identifier.into(),
            jaccard,
        }
    }
}

/// Diagnostic for a candidate excluded from the results.
#[derive(Debug)]
pub struct CandidateFailure {
    pub identifier: String,
    pub error: BedError,
}

/// Results and diagnostics of a completed batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Order is unspecified; rank before presenting.
    pub results: Vec<ComparisonResult>,
    pub failures: Vec<CandidateFailure>,
}

/// Scores a query against many datasets on a dedicated worker pool.
pub struct BatchScorer<P: SourceProvider = FsSourceProvider> {
    provider: P,
    config: ScoreConfig,
    pool: TaskPool,
    token: Option<CancellationToken>,
}

impl BatchScorer<FsSourceProvider> {
    /// Scorer reading sources from the local filesystem.
    pub fn new(config: ScoreConfig) -> Result<Self, ScoreError> {
        Self::with_provider(FsSourceProvider, config)
    }
}

impl<P: SourceProvider> BatchScorer<P> {
    pub fn with_provider(provider: P, config: ScoreConfig) -> Result<Self, ScoreError> {
        let pool = TaskPool::new(config.threads)?;
        Ok(Self {
            provider,
            config,
            pool,
            token: None,
        })
    }

    /// Attach a token that can cancel any batch run by this scorer.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Score a single candidate, re-reading its source.
    pub fn score_one(
        &self,
        query: &[Interval],
        query_len: u64,
        candidate: &Dataset,
    ) -> Result<ComparisonResult, BedError> {
        let set = self.provider.parse(&candidate.source)?;
        let value = jaccard(query, query_len, &set, candidate.total_length);
        Ok(ComparisonResult::new(
            candidate.identifier.clone(),
            round_score(value, self.config.precision),
        ))
    }

    /// Score every candidate in parallel and wait for all of them.
    ///
    /// `query` must be sorted by `(chrom, start)`. Fails only if the batch is
    /// cancelled or times out, in which case nothing is returned.
    pub fn score_all(
        &self,
        query: &[Interval],
        query_len: u64,
        candidates: &[Dataset],
    ) -> Result<BatchOutcome, ScoreError> {
        let started = Instant::now();
        log::info!(
            "scoring {} candidate(s) on {} thread(s)",
            candidates.len(),
            self.pool.num_threads()
        );

        let interrupt = Interrupt::new(self.token.as_ref(), self.config.timeout);
        let outcomes = self.pool.fork_join(candidates, interrupt, |candidate, interrupt| {
            let scored = self.score_one(query, query_len, candidate);
            interrupt.check()?;
            Ok(scored.map_err(|error| CandidateFailure {
                identifier: candidate.identifier.clone(),
                error,
            }))
        })?;

        let mut outcome = BatchOutcome::default();
        for scored in outcomes {
            match scored {
                Ok(result) => outcome.results.push(result),
                Err(failure) => {
                    log::warn!(
                        "skipping candidate {}: {}",
                        failure.identifier,
                        failure.error
                    );
                    outcome.failures.push(failure);
                }
            }
        }

        log::info!(
            "scored {} candidate(s), {} failed, in {:.2?}",
            outcome.results.len(),
            outcome.failures.len(),
            started.elapsed()
        );
        Ok(outcome)
    }

    /// Score the query against every dataset a registry lists.
    pub fn score_registry<R: DatasetRegistry + ?Sized>(
        &self,
        query: &[Interval],
        query_len: u64,
        registry: &R,
    ) -> Result<BatchOutcome, ScoreError> {
        let candidates = registry.datasets()?;
        self.score_all(query, query_len, &candidates)
    }
}
