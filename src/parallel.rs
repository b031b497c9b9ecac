//! Parallel processing utilities using Rayon.
//!
//! [`TaskPool`] runs one independent task per item and joins them all before
//! returning. Tasks share nothing but a read-only [`Interrupt`], so a batch
//! can be cancelled or timed out as a whole.

use crate::bed::BedError;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Batch-level failures. Per-item failures are reported by the tasks themselves.
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("batch cancelled")]
    Cancelled,

    #[error("batch exceeded its {0:?} time limit")]
    TimedOut(Duration),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Bed(#[from] BedError),
}

/// Shared flag used to cancel an in-flight batch from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Read-only view of a batch's cancellation state, handed to every task.
#[derive(Debug, Clone, Copy)]
pub struct Interrupt<'a> {
    token: Option<&'a CancellationToken>,
    deadline: Option<(Instant, Duration)>,
}

impl<'a> Interrupt<'a> {
    pub fn new(token: Option<&'a CancellationToken>, timeout: Option<Duration>) -> Self {
        Self {
            token,
            deadline: timeout.map(|t| (Instant::now() + t, t)),
        }
    }

    /// An interrupt that never fires.
    pub fn none() -> Self {
        Self::new(None, None)
    }

    /// Returns an error once the batch has been cancelled or its deadline passed.
    #[inline]
    pub fn check(&self) -> Result<(), ScoreError> {
        if self.token.is_some_and(CancellationToken::is_cancelled) {
            return Err(ScoreError::Cancelled);
        }
        if let Some((deadline, limit)) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ScoreError::TimedOut(limit));
            }
        }
        Ok(())
    }
}

/// A dedicated worker pool with fork-join semantics.
pub struct TaskPool {
    pool: rayon::ThreadPool,
}

impl TaskPool {
    /// Build a pool with `threads` workers (default: number of CPUs).
    pub fn new(threads: Option<usize>) -> Result<Self, ScoreError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|i| format!("bedsim-worker-{}", i))
            .build()
            .map_err(|e| ScoreError::ThreadPool(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `task` once per item and wait for every task to finish.
    ///
    /// If the interrupt fires at any point the whole call fails and no
    /// results are returned.
    pub fn fork_join<T, R, F>(
        &self,
        items: &[T],
        interrupt: Interrupt<'_>,
        task: F,
    ) -> Result<Vec<R>, ScoreError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T, &Interrupt<'_>) -> Result<R, ScoreError> + Sync + Send,
    {
        let results = self.pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    interrupt.check()?;
                    task(item, &interrupt)
                })
                .collect::<Result<Vec<R>, ScoreError>>()
        })?;

        interrupt.check()?;
        Ok(results)
    }
}
