//! Input source: one URL per line from a file or stdin.

use anyhow::{Context, Result};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

/// Sentinel meaning "read from standard input".
pub const STDIN_SENTINEL: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    pub fn parse(s: &str) -> Self {
        if s == STDIN_SENTINEL {
            InputSource::Stdin
        } else {
            InputSource::File(PathBuf::from(s))
        }
    }

    /// Reads every line. Failing to open or read the source is fatal to the run.
    pub fn read_lines(&self) -> Result<Vec<String>> {
        let lines = match self {
            InputSource::Stdin => read_lines_from(io::stdin().lock()).context("read stdin")?,
            InputSource::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open input {}", path.display()))?;
                read_lines_from(BufReader::new(file))
                    .with_context(|| format!("read input {}", path.display()))?
            }
        };
        tracing::info!(lines = lines.len(), "finished reading input from {}", self);
        Ok(lines)
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Stdin => write!(f, "stdin"),
            InputSource::File(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Splits on `\n` (dropping a trailing `\r`); invalid UTF-8 is decoded lossily.
pub fn read_lines_from<R: BufRead>(mut reader: R) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        lines.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(lines)
}
