//! bedsim: rank BED datasets by Jaccard similarity
//!
//! Usage: bedsim <COMMAND> [OPTIONS]

use clap::{ArgAction, Parser, Subcommand};
use std::ffi::OsStr;
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use bedsim::bed::{self, BedError};
use bedsim::commands::{default_top_n, BatchScorer, JaccardCommand, RankCommand};
use bedsim::config::ScoreConfig;
use bedsim::output::{write_failures, RankWriter};
use bedsim::parallel::ScoreError;
use bedsim::registry::{DatasetRegistry, Manifest};

#[derive(Parser)]
#[command(name = "bedsim")]
#[command(version)]
#[command(about = "bedsim: rank BED datasets by Jaccard similarity to a query", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a BED file and report its interval count and total length
    Parse {
        /// Input BED or BED.GZ file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Calculate Jaccard similarity between two BED files
    Jaccard {
        /// Input BED file A
        #[arg(short = 'a', long)]
        file_a: PathBuf,

        /// Input BED file B
        #[arg(short = 'b', long)]
        file_b: PathBuf,
    },

    /// Register a BED file in a dataset manifest
    Register {
        /// Manifest file (identifier, path, total length per line)
        #[arg(short, long)]
        manifest: PathBuf,

        /// BED or BED.GZ file to register
        #[arg(short, long)]
        input: PathBuf,

        /// Identifier to register under (default: file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Rank registered datasets by similarity to a query
    Rank {
        /// Manifest file listing candidate datasets
        #[arg(short, long)]
        manifest: PathBuf,

        /// Query BED or BED.GZ file
        #[arg(short, long, conflicts_with = "existing", required_unless_present = "existing")]
        query: Option<PathBuf>,

        /// Use a registered dataset as the query (excluded from candidates)
        #[arg(long)]
        existing: Option<String>,

        /// Number of non-identical results to report
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Register the query file in the manifest after ranking
        #[arg(long, requires = "query")]
        save: bool,

        /// Abandon the batch after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Parse { input } => run_parse(input).map_err(ScoreError::from),
        Commands::Jaccard { file_a, file_b } => run_jaccard(file_a, file_b).map_err(ScoreError::from),
        Commands::Register {
            manifest,
            input,
            name,
        } => run_register(manifest, input, name).map_err(ScoreError::from),
        Commands::Rank {
            manifest,
            query,
            existing,
            top,
            save,
            timeout,
        } => run_rank(manifest, query, existing, top, save, timeout, cli.threads),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_parse(input: PathBuf) -> Result<(), BedError> {
    let (set, stats) = if input.as_os_str() == OsStr::new("-") {
        bed::parse_reader_with_stats(io::stdin().lock())?
    } else {
        bed::parse_reader_with_stats(bed::open_source(&input)?)?
    };
    log::info!(
        "{} line(s): {} record(s), {} header(s), {} malformed",
        stats.lines,
        stats.records,
        stats.headers,
        stats.malformed
    );

    let stdout = io::stdout();
    let mut writer = RankWriter::new(stdout.lock());
    writer.write_parse_summary(set.len(), set.total_length())?;
    writer.flush()
}

fn run_jaccard(file_a: PathBuf, file_b: PathBuf) -> Result<(), BedError> {
    let cmd = JaccardCommand::new();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    cmd.run(file_a, file_b, &mut handle)
}

fn run_register(manifest: PathBuf, input: PathBuf, name: Option<String>) -> Result<(), BedError> {
    let identifier = match name {
        Some(name) => name,
        None => input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| BedError::InvalidFormat(format!("no file name in {}", input.display())))?,
    };

    let dataset = Manifest::new(manifest).append(&identifier, &input)?;
    println!("{}\t{}", dataset.identifier, dataset.total_length);
    Ok(())
}

fn run_rank(
    manifest: PathBuf,
    query: Option<PathBuf>,
    existing: Option<String>,
    top: Option<usize>,
    save: bool,
    timeout: Option<u64>,
    threads: Option<usize>,
) -> Result<(), ScoreError> {
    let manifest = Manifest::new(manifest);
    let registered = manifest.datasets()?;
    let available = registered.len();

    let (query_set, candidates) = match (&query, &existing) {
        (_, Some(id)) => {
            let entry = registered
                .iter()
                .find(|d| &d.identifier == id)
                .ok_or_else(|| BedError::InvalidFormat(format!("unknown dataset: {}", id)))?;
            let set = bed::parse_source(&entry.source)?;
            (set, manifest.without(id)?)
        }
        (Some(path), None) => (bed::parse_source(path)?, registered),
        (None, None) => {
            return Err(BedError::InvalidFormat("no query given".to_string()).into());
        }
    };

    let n = default_top_n(top, available, existing.is_some());

    let mut config = ScoreConfig::new();
    if let Some(t) = threads {
        config = config.with_threads(t);
    }
    if let Some(secs) = timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let scorer = BatchScorer::new(config)?;
    let outcome = scorer.score_all(&query_set, query_set.total_length(), &candidates)?;
    write_failures(&mut io::stderr().lock(), &outcome.failures)?;

    let ranked = RankCommand::new().with_top_n(n).rank(outcome.results);
    let stdout = io::stdout();
    let mut writer = RankWriter::new(stdout.lock());
    writer.write_ranked(&ranked)?;
    writer.flush()?;

    if save {
        if let Some(path) = query {
            let identifier = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if manifest.find(&identifier)?.is_none() {
                manifest.append(&identifier, &path)?;
            }
        }
    }

    Ok(())
}
