//! Tab-separated report formatting.
//!
//! Uses itoa for integer formatting and ryu for float formatting.

use crate::bed::BedError;
use crate::commands::rank::RankedOutput;
use crate::commands::score::{CandidateFailure, ComparisonResult};
use std::io::{BufWriter, Write};

/// Buffered writer for ranking and parse reports.
pub struct RankWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> RankWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            writer: BufWriter::new(output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    fn write_result(&mut self, status: &[u8], result: &ComparisonResult) -> Result<(), BedError> {
        self.writer.write_all(status)?;
        self.writer.write_all(b"\t")?;
        self.writer.write_all(result.identifier.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.ryu_buf.format(result.jaccard).as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write `status\tidentifier\tjaccard` rows, identical matches first.
    pub fn write_ranked(&mut self, ranked: &RankedOutput) -> Result<(), BedError> {
        self.writer.write_all(b"status\tidentifier\tjaccard\n")?;
        for result in &ranked.identical {
            self.write_result(b"identical", result)?;
        }
        for result in &ranked.others {
            self.write_result(b"other", result)?;
        }
        Ok(())
    }

    /// Write a two-column summary of a parsed source.
    pub fn write_parse_summary(&mut self, intervals: usize, total_length: u64) -> Result<(), BedError> {
        self.writer.write_all(b"intervals\ttotal_length\n")?;
        self.writer
            .write_all(self.itoa_buf.format(intervals).as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(total_length).as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), BedError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Write one diagnostic line per excluded candidate.
pub fn write_failures<W: Write>(out: &mut W, failures: &[CandidateFailure]) -> Result<(), BedError> {
    for failure in failures {
        writeln!(out, "warning: skipped {}: {}", failure.identifier, failure.error)?;
    }
    Ok(())
}
