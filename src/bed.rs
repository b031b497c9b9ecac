//! Permissive BED reader producing normalized interval sets.
//!
//! Every line is classified as a header, an accepted record, or a malformed
//! record. Malformed records are skipped without raising an error; only a
//! failure to open or read the source itself is reported.

use crate::interval::{Interval, IntervalSet};
use flate2::read::MultiGzDecoder;
use memchr::memchr;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading interval sources and manifests.
#[derive(Error, Debug)]
pub enum BedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid BED format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, BedError>;

/// Why a line was not accepted as an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    TooFewFields,
    InvalidStart,
    InvalidEnd,
    Inverted,
}

/// Outcome of parsing a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank line, comment, `track` or `browser` header.
    Header,
    Record(Interval),
    Malformed(Malformed),
}

/// Line counters collected while parsing a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub headers: usize,
    pub records: usize,
    pub malformed: usize,
}

impl ParseStats {
    fn record(&mut self, outcome: &LineOutcome) {
        self.lines += 1;
        match outcome {
            LineOutcome::Header => self.headers += 1,
            LineOutcome::Record(_) => self.records += 1,
            LineOutcome::Malformed(_) => self.malformed += 1,
        }
    }
}

/// Returns true if the handle names a gzip-compressed source.
///
/// Detection is by file suffix only; content is never sniffed.
#[inline]
pub fn is_gzipped(path: &Path) -> bool {
    path.extension() == Some(OsStr::new("gz"))
}

/// Returns true if the file name carries one of the accepted suffixes.
pub fn is_supported_source(path: &Path) -> bool {
    let name = match path.file_name().and_then(OsStr::to_str) {
        Some(name) => name,
        None => return false,
    };
    name.ends_with(".bed") || name.ends_with(".gz")
}

/// Open a source for reading, decompressing `.gz` files transparently.
pub fn open_source(path: &Path) -> io::Result<Box<dyn Read + Send>> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(MultiGzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Classify one raw line (without its trailing newline).
pub fn parse_line(raw: &str) -> LineOutcome {
    if raw.starts_with('#')
        || raw.starts_with("track")
        || raw.starts_with("browser")
        || raw.trim().is_empty()
    {
        return LineOutcome::Header;
    }

    let line = raw.trim().as_bytes();

    let tab1 = match memchr(b'\t', line) {
        Some(pos) => pos,
        None => return LineOutcome::Malformed(Malformed::TooFewFields),
    };
    let rest1 = &line[tab1 + 1..];
    let tab2 = match memchr(b'\t', rest1) {
        Some(pos) => pos,
        None => return LineOutcome::Malformed(Malformed::TooFewFields),
    };
    let rest2 = &rest1[tab2 + 1..];
    let end_len = memchr(b'\t', rest2).unwrap_or(rest2.len());

    let start = match parse_coordinate(&rest1[..tab2]) {
        Some(v) => v,
        None => return LineOutcome::Malformed(Malformed::InvalidStart),
    };
    let end = match parse_coordinate(&rest2[..end_len]) {
        Some(v) => v,
        None => return LineOutcome::Malformed(Malformed::InvalidEnd),
    };

    if end < start {
        return LineOutcome::Malformed(Malformed::Inverted);
    }

    // Slicing on tab bytes keeps UTF-8 boundaries intact.
    let chrom = String::from_utf8_lossy(&line[..tab1]).into_owned();
    LineOutcome::Record(Interval::new(chrom, start, end))
}

#[inline]
fn parse_coordinate(field: &[u8]) -> Option<i64> {
    std::str::from_utf8(field).ok()?.trim().parse().ok()
}

/// A streaming reader over BED line outcomes.
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: Vec<u8>,
}

impl BedReader<Box<dyn Read + Send>> {
    /// Open a BED or BED.GZ file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(open_source(path.as_ref())?))
    }
}

impl<R: Read> BedReader<R> {
    /// Create a new BED reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read and classify the next line. Returns `Ok(None)` at end of input.
    pub fn next_outcome(&mut self) -> Result<Option<LineOutcome>> {
        self.buffer.clear();
        let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        // Undecodable bytes are dropped rather than rejected.
        let text: String = self.buffer.utf8_chunks().map(|c| c.valid()).collect();
        let line = text.strip_suffix('\n').unwrap_or(&text);
        Ok(Some(parse_line(line)))
    }

    /// Get an iterator over accepted intervals, skipping headers and malformed lines.
    pub fn intervals(self) -> BedIntervalIter<R> {
        BedIntervalIter { reader: self }
    }
}

/// Iterator over accepted intervals.
pub struct BedIntervalIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> Iterator for BedIntervalIter<R> {
    type Item = Result<Interval>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.next_outcome() {
                Ok(Some(LineOutcome::Record(iv))) => return Some(Ok(iv)),
                Ok(Some(_)) => continue,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Parse any reader into a normalized set, also returning line counters.
pub fn parse_reader_with_stats<R: Read>(reader: R) -> Result<(IntervalSet, ParseStats)> {
    let mut reader = BedReader::new(reader);
    let mut stats = ParseStats::default();
    let mut intervals = Vec::new();

    while let Some(outcome) = reader.next_outcome()? {
        stats.record(&outcome);
        if let LineOutcome::Record(iv) = outcome {
            intervals.push(iv);
        }
    }

    if stats.malformed > 0 {
        log::debug!(
            "skipped {} malformed line(s) out of {}",
            stats.malformed,
            stats.lines
        );
    }

    Ok((IntervalSet::from_unsorted(intervals), stats))
}

/// Parse any reader into a normalized set.
pub fn parse_reader<R: Read>(reader: R) -> Result<IntervalSet> {
    parse_reader_with_stats(reader).map(|(set, _)| set)
}

/// Parse a BED or BED.GZ file into a normalized set.
///
/// Fails only if the file cannot be opened or read.
pub fn parse_source<P: AsRef<Path>>(path: P) -> Result<IntervalSet> {
    let path = path.as_ref();
    let set = parse_reader(open_source(path)?)?;
    log::debug!(
        "parsed {}: {} intervals on {} chromosome(s), total length {}",
        path.display(),
        set.len(),
        set.chromosome_count(),
        set.total_length()
    );
    Ok(set)
}

/// Parse intervals from a string (useful for testing).
pub fn parse_intervals(content: &str) -> IntervalSet {
    // Reading from an in-memory slice cannot fail.
    parse_reader(content.as_bytes()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_parse_bed3() {
        let set = parse_intervals("chr1\t100\t200\nchr1\t300\t400\n");

        assert_eq!(set.len(), 2);
        assert_eq!(set[0].chrom, "chr1");
        assert_eq!(set[0].start, 100);
        assert_eq!(set[0].end, 200);
        assert_eq!(set.total_length(), 200);
    }

    #[test]
    fn test_reader_iterates_accepted_records() {
        let mut file = Builder::new().suffix(".bed").tempfile().unwrap();
        file.write_all(b"track x\nchr1\t5\t9\nchr1\tx\t9\nchr2\t1\t2\n")
            .unwrap();
        file.flush().unwrap();

        let reader = BedReader::from_path(file.path()).unwrap();
        let intervals: Vec<Interval> = reader.intervals().collect::<Result<_>>().unwrap();

        assert_eq!(
            intervals,
            vec![Interval::new("chr1", 5, 9), Interval::new("chr2", 1, 2)]
        );
    }

    #[test]
    fn test_reader_counts_lines() {
        let mut reader = BedReader::new("#a\nchr1\t1\t2\n".as_bytes());
        while reader.next_outcome().unwrap().is_some() {}
        assert_eq!(reader.line_number(), 2);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let set = parse_intervals("chr1\t100\t200\tgene1\t500\t+\n");

        assert_eq!(set.len(), 1);
        assert_eq!(set[0], Interval::new("chr1", 100, 200));
    }

    #[test]
    fn test_skip_comments_and_headers() {
        let content = "# comment\ntrack name=test\nbrowser position chr1:1-1000\n\n   \nchr1\t100\t200\n";
        let (set, stats) = parse_reader_with_stats(content.as_bytes()).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(stats.headers, 5);
        assert_eq!(stats.records, 1);
        assert_eq!(stats.malformed, 0);
    }

    #[test]
    fn test_malformed_lines_are_skipped_not_fatal() {
        let content = "chr1\t100\n\
                       chr1\tabc\t200\n\
                       chr1\t100\txyz\n\
                       chr1\t300\t200\n\
                       chr1\t10\t20\n";
        let (set, stats) = parse_reader_with_stats(content.as_bytes()).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set[0], Interval::new("chr1", 10, 20));
        assert_eq!(stats.malformed, 4);
    }

    #[test]
    fn test_negative_start_is_kept() {
        let set = parse_intervals("chr1\t-5\t10\n");
        assert_eq!(set.len(), 1);
        assert_eq!(set[0], Interval::new("chr1", -5, 10));
        assert_eq!(set.total_length(), 15);

        assert_eq!(
            parse_line("chr1\t-5\t-10"),
            LineOutcome::Malformed(Malformed::Inverted)
        );
    }

    #[test]
    fn test_line_outcomes() {
        assert_eq!(parse_line("#x"), LineOutcome::Header);
        assert_eq!(
            parse_line("chr1\t1"),
            LineOutcome::Malformed(Malformed::TooFewFields)
        );
        assert_eq!(
            parse_line("chr1\t1.5\t3"),
            LineOutcome::Malformed(Malformed::InvalidStart)
        );
        assert_eq!(
            parse_line("chr1\t1\tx"),
            LineOutcome::Malformed(Malformed::InvalidEnd)
        );
        // Trailing whitespace is trimmed before splitting.
        assert_eq!(
            parse_line("chr1\t1\t"),
            LineOutcome::Malformed(Malformed::TooFewFields)
        );
        assert_eq!(
            parse_line("chr1\t9\t3"),
            LineOutcome::Malformed(Malformed::Inverted)
        );
        assert_eq!(
            parse_line("chr1\t5\t5"),
            LineOutcome::Record(Interval::new("chr1", 5, 5))
        );
    }

    #[test]
    fn test_crlf_and_padded_fields() {
        let set = parse_intervals("chr1\t 10 \t20\r\nchr2\t+30\t40\r\n");

        assert_eq!(set.len(), 2);
        assert_eq!(set[0], Interval::new("chr1", 10, 20));
        assert_eq!(set[1], Interval::new("chr2", 30, 40));
    }

    #[test]
    fn test_invalid_utf8_bytes_dropped() {
        let content = b"chr\xff1\t10\t20\n";
        let set = parse_reader(&content[..]).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set[0].chrom, "chr1");
    }

    #[test]
    fn test_empty_source() {
        let set = parse_intervals("");
        assert!(set.is_empty());
        assert_eq!(set.total_length(), 0);
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let result = parse_source("/nonexistent/definitely/missing.bed");
        assert!(matches!(result, Err(BedError::Io(_))));
    }

    #[test]
    fn test_gzip_source_matches_plain() {
        let content = "chr2\t5\t9\nchr1\t100\t200\n#c\nchr1\t50\t60\n";

        let mut plain = Builder::new().suffix(".bed").tempfile().unwrap();
        plain.write_all(content.as_bytes()).unwrap();
        plain.flush().unwrap();

        let mut gz = Builder::new().suffix(".bed.gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        gz.write_all(&encoder.finish().unwrap()).unwrap();
        gz.flush().unwrap();

        let a = parse_source(plain.path()).unwrap();
        let b = parse_source(gz.path()).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.total_length(), 4 + 100 + 10);
        assert_eq!(a[0], Interval::new("chr1", 50, 60));
    }

    #[test]
    fn test_supported_suffixes() {
        assert!(is_supported_source(Path::new("a/peaks.bed")));
        assert!(is_supported_source(Path::new("peaks.bed.gz")));
        assert!(is_supported_source(Path::new("peaks.gz")));
        assert!(!is_supported_source(Path::new("peaks.txt")));
        assert!(!is_supported_source(Path::new("peaks.bed.bak")));
    }
}
