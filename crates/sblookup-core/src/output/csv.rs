//! Minimal CSV record encoding (comma-delimited, `\n`-terminated).

use std::io::{self, Write};

/// Whether a field must be quoted: it contains a delimiter, quote or line
/// break, or starts with whitespace that a reader would otherwise trim.
fn needs_quotes(field: &str) -> bool {
    if field.is_empty() {
        return false;
    }
    if field.starts_with(' ') || field.starts_with('\t') {
        return true;
    }
    field.contains([',', '"', '\r', '\n'])
}

/// Writes one record followed by `\n`.
pub fn write_record<W: Write>(w: &mut W, fields: &[&str]) -> io::Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        if needs_quotes(field) {
            w.write_all(b"\"")?;
            w.write_all(field.replace('"', "\"\"").as_bytes())?;
            w.write_all(b"\"")?;
        } else {
            w.write_all(field.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}
