//! Dataset registry and source access.
//!
//! The scorer never reaches for a database or the filesystem on its own.
//! Candidates come from a [`DatasetRegistry`] and their bytes from a
//! [`SourceProvider`], both supplied by the caller.

use crate::bed::{self, is_supported_source, BedError, Result};
use crate::interval::IntervalSet;
use rustc_hash::FxHashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// A registered interval source.
///
/// `total_length` is taken on trust from registration time and is not
/// recomputed when the source is scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub identifier: String,
    pub source: PathBuf,
    pub total_length: u64,
}

impl Dataset {
    pub fn new(identifier: impl Into<String>, source: impl Into<PathBuf>, total_length: u64) -> Self {
        Self {
            identifier: identifier.into(),
            source: source.into(),
            total_length,
        }
    }

    /// Parse a source once and record its total length.
    pub fn register(identifier: impl Into<String>, source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        if !is_supported_source(&source) {
            return Err(BedError::InvalidFormat(format!(
                "only .bed and .gz files are supported: {}",
                source.display()
            )));
        }
        let set = bed::parse_source(&source)?;
        Ok(Self::new(identifier, source, set.total_length()))
    }
}

/// Resolves a source handle to readable bytes.
pub trait SourceProvider: Sync {
    fn open(&self, handle: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// Parse the source behind a handle into a normalized set.
    fn parse(&self, handle: &Path) -> Result<IntervalSet> {
        bed::parse_reader(self.open(handle)?)
    }
}

/// Plain filesystem access with `.gz` suffix detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceProvider;

impl SourceProvider for FsSourceProvider {
    fn open(&self, handle: &Path) -> io::Result<Box<dyn Read + Send>> {
        bed::open_source(handle)
    }
}

/// A source of candidate datasets.
pub trait DatasetRegistry {
    fn datasets(&self) -> Result<Vec<Dataset>>;

    /// Look up one dataset by identifier.
    fn find(&self, identifier: &str) -> Result<Option<Dataset>> {
        Ok(self
            .datasets()?
            .into_iter()
            .find(|d| d.identifier == identifier))
    }
}

impl DatasetRegistry for Vec<Dataset> {
    fn datasets(&self) -> Result<Vec<Dataset>> {
        Ok(self.clone())
    }
}

/// A tab-separated registry file: `identifier\tpath\ttotal_length`.
///
/// Relative paths resolve against the manifest's directory. Blank lines and
/// `#` comments are ignored.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Register a source and append it to the manifest.
    ///
    /// Fails if the identifier is already present.
    pub fn append(&self, identifier: &str, source: &Path) -> Result<Dataset> {
        if identifier.contains('\t') || identifier.contains('\n') {
            return Err(BedError::InvalidFormat(format!(
                "identifier may not contain tabs or newlines: {:?}",
                identifier
            )));
        }
        if self.path.exists() && self.find(identifier)?.is_some() {
            return Err(BedError::InvalidFormat(format!(
                "dataset already exists: {}",
                identifier
            )));
        }

        let dataset = Dataset::register(identifier, std::path::absolute(source)?)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            file,
            "{}\t{}\t{}",
            dataset.identifier,
            dataset.source.display(),
            dataset.total_length
        )?;

        log::info!(
            "registered {} ({} bp) in {}",
            dataset.identifier,
            dataset.total_length,
            self.path.display()
        );
        Ok(dataset)
    }

    /// All datasets except the one with `identifier`.
    pub fn without(&self, identifier: &str) -> Result<Vec<Dataset>> {
        Ok(self
            .datasets()?
            .into_iter()
            .filter(|d| d.identifier != identifier)
            .collect())
    }

    fn parse_line(&self, line_number: usize, line: &str) -> Result<Dataset> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(BedError::Parse {
                line: line_number,
                message: format!("Expected 3 manifest fields, got {}", fields.len()),
            });
        }

        let total_length = fields[2].trim().parse().map_err(|_| BedError::Parse {
            line: line_number,
            message: format!("Invalid total length: '{}'", fields[2]),
        })?;

        let source = Path::new(fields[1]);
        let source = if source.is_relative() {
            self.base_dir().join(source)
        } else {
            source.to_path_buf()
        };

        Ok(Dataset::new(fields[0], source, total_length))
    }
}

impl DatasetRegistry for Manifest {
    fn datasets(&self) -> Result<Vec<Dataset>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut seen = FxHashSet::default();
        let mut datasets = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim_end();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let dataset = self.parse_line(idx + 1, trimmed)?;
            if !seen.insert(dataset.identifier.clone()) {
                return Err(BedError::Parse {
                    line: idx + 1,
                    message: format!("Duplicate identifier: '{}'", dataset.identifier),
                });
            }
            datasets.push(dataset);
        }

        Ok(datasets)
    }
}
