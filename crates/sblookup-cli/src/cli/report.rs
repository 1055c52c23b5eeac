//! Verdict lines and run summary for stdout.

use sblookup_core::pipeline::{RunReport, Verdict};
use std::io::{self, Write};

/// One verdict line per submitted URL (one per match for unsafe URLs), then a
/// one-line summary.
pub(super) fn print_verdicts<W: Write>(out: &mut W, report: &RunReport) -> io::Result<()> {
    for (submitted, verdict) in report.verdicts() {
        match verdict {
            Verdict::Safe => writeln!(out, "Safe URL: {}", submitted.url)?,
            Verdict::Unsafe(found) => {
                for m in found {
                    writeln!(
                        out,
                        "Unsafe URL: {} [{}/{}/{}]",
                        submitted.url, m.threat_type, m.platform_type, m.threat_entry_type
                    )?;
                }
            }
            Verdict::Unknown => writeln!(out, "Unknown URL: {} (lookup failed)", submitted.url)?,
        }
    }
    writeln!(
        out,
        "{} URL(s) checked in {} batch(es): {} unsafe match(es), {} invalid line(s), {} failed batch(es)",
        report.submitted,
        report.batches,
        report.aggregate.matches().len(),
        report.invalid.len(),
        report.aggregate.batches_failed()
    )?;
    out.flush()
}
