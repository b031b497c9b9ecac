//! bedsim: Jaccard similarity ranking for genomic interval datasets
//!
//! This library compares BED interval sets and ranks stored datasets by how
//! closely they match a query.
//!
//! # Features
//!
//! - **Permissive parsing**: malformed BED lines are skipped, `.gz` sources are read transparently
//! - **Linear merge sweep**: one pass over two sorted sets per comparison
//! - **Parallel batches**: Rayon fork-join over all candidates, with cancellation and timeouts
//!
//! # Example
//!
//! ```rust,no_run
//! use bedsim::{bed, commands::{select, BatchScorer}, config::ScoreConfig, registry::Manifest};
//!
//! let query = bed::parse_source("query.bed").unwrap();
//! let scorer = BatchScorer::new(ScoreConfig::default()).unwrap();
//! let outcome = scorer
//!     .score_registry(&query, query.total_length(), &Manifest::new("registry.tsv"))
//!     .unwrap();
//! let ranked = select(outcome.results, 3);
//! ```

pub mod bed;
pub mod commands;
pub mod config;
pub mod interval;
pub mod output;
pub mod parallel;
pub mod registry;

// Re-export commonly used types
pub use bed::{parse_reader, parse_source, BedError, BedReader};
pub use interval::{Interval, IntervalSet};
pub use parallel::{CancellationToken, ScoreError};
pub use registry::{Dataset, DatasetRegistry, FsSourceProvider, Manifest, SourceProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bed::{parse_reader, parse_source, BedError, BedReader};
    pub use crate::commands::{
        jaccard, select, BatchOutcome, BatchScorer, ComparisonResult, JaccardCommand, RankedOutput,
    };
    pub use crate::config::ScoreConfig;
    pub use crate::interval::{Interval, IntervalSet};
    pub use crate::parallel::{CancellationToken, ScoreError};
    pub use crate::registry::{Dataset, DatasetRegistry, Manifest, SourceProvider};
}
