//! Output sink for matches: one CSV record per match.
//!
//! Record fields: URL, threat type, platform type, threat-entry type.

mod csv;

pub use csv::write_record;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::lookup::ThreatMatch;

/// Buffered CSV writer for matches. Single writer; used after all lookups joined.
pub struct MatchWriter<W: Write> {
    inner: BufWriter<W>,
    records: usize,
}

impl<W: Write> MatchWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
            records: 0,
        }
    }

    pub fn write_match(&mut self, m: &ThreatMatch) -> io::Result<()> {
        write_record(&mut self.inner, &m.record())?;
        self.records += 1;
        Ok(())
    }

    /// Writes `matches` in order; stops at the first error.
    pub fn write_matches(&mut self, matches: &[ThreatMatch]) -> io::Result<()> {
        for m in matches {
            self.write_match(m)?;
        }
        Ok(())
    }

    /// Records written so far (possibly still buffered).
    pub fn records(&self) -> usize {
        self.records
    }

    /// Flushes buffered records and returns the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|e| e.into_error())
    }
}

impl MatchWriter<File> {
    /// Creates (truncating) the output file. Call before dispatch so a bad path fails early.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create output file {}", path.display()))?;
        Ok(Self::new(file))
    }

    /// Flushes and syncs the file. Returns the number of records written.
    pub fn finish(self) -> Result<usize> {
        let records = self.records;
        let file = self.into_inner().context("flush output")?;
        file.sync_all().context("sync output")?;
        Ok(records)
    }
}
