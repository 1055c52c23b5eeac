//! Groups validated entries into bounded lookup batches.
//!
//! Batches keep input order; no reordering or deduplication happens here.

use crate::config::ConfigError;
use crate::url_model::ThreatEntry;

/// An ordered group of at most `batch_size` entries, sent in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position of this batch in dispatch order (0-based).
    pub index: usize,
    pub entries: Vec<ThreatEntry>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Input line range covered by this batch (inclusive), for logging.
    pub fn line_range(&self) -> (usize, usize) {
        let first = self.entries.first().map(|e| e.line_no).unwrap_or(0);
        let last = self.entries.last().map(|e| e.line_no).unwrap_or(0);
        (first, last)
    }
}

/// Splits `entries` into batches of `batch_size`; the last one may be shorter.
///
/// Zero entries produce zero batches.
pub fn into_batches(entries: Vec<ThreatEntry>, batch_size: usize) -> Result<Vec<Batch>, ConfigError> {
    if batch_size == 0 {
        return Err(ConfigError::ZeroBatchSize);
    }

    let mut out = Vec::with_capacity(entries.len().div_ceil(batch_size));
    let mut current = Vec::with_capacity(batch_size.min(entries.len()));
    for entry in entries {
        current.push(entry);
        if current.len() == batch_size {
            let full = std::mem::take(&mut current);
            out.push(Batch {
                index: out.len(),
                entries: full,
            });
        }
    }
    if !current.is_empty() {
        out.push(Batch {
            index: out.len(),
            entries: current,
        });
    }
    Ok(out)
}
