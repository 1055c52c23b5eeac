//! URL validation for lookup input.
//!
//! Each input line becomes either a [`ThreatEntry`] (safe to submit) or an
//! [`InvalidLine`] that is reported but never sent to the API.

mod canonical;

pub use canonical::canonicalize;

/// Why a line could not be turned into a lookup entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("empty line")]
    Empty,
    #[error("unparseable URL: {0}")]
    Parse(String),
    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

/// One validated URL queued for lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatEntry {
    /// 1-based input line number.
    pub line_no: usize,
    /// The input line, trimmed and without tab/CR/LF. This is what gets submitted.
    pub raw: String,
    /// Canonical form of `raw`.
    pub canonical: String,
}

impl ThreatEntry {
    /// Validates one input line.
    pub fn parse(line_no: usize, line: &str) -> Result<Self, UrlError> {
        let canonical = canonicalize(line)?;
        Ok(Self {
            line_no,
            raw: canonical::clean(line),
            canonical,
        })
    }
}

/// An input line rejected by validation, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    pub line_no: usize,
    pub raw: String,
    pub reason: UrlError,
}

/// Splits input lines into valid entries (in input order) and rejected lines.
pub fn validate_lines<I, S>(lines: I) -> (Vec<ThreatEntry>, Vec<InvalidLine>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for (i, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        let line_no = i + 1;
        match ThreatEntry::parse(line_no, line) {
            Ok(entry) => valid.push(entry),
            Err(reason) => {
                tracing::warn!(line = line_no, input = %line, "skipping invalid URL: {}", reason);
                invalid.push(InvalidLine {
                    line_no,
                    raw: line.to_string(),
                    reason,
                });
            }
        }
    }
    (valid, invalid)
}
