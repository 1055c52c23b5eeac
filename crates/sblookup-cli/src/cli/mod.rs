//! CLI for sblookup.

mod report;

use anyhow::{Context, Result};
use clap::Parser;
use sblookup_core::aggregate::StatusFlags;
use sblookup_core::config::{self, LookupConfig, RetryConfig};
use sblookup_core::input::InputSource;
use sblookup_core::lookup::{CurlLookupClient, ThreatMatch};
use sblookup_core::output::MatchWriter;
use sblookup_core::pipeline::{run_pipeline, PipelineOptions};
use std::path::PathBuf;
use std::sync::Arc;

/// Checks URLs against the Safe Browsing threatMatches API.
///
/// Reads one URL per line, writes one CSV record per match to the output
/// file, and exits with a bitmask: 1 = unsafe URL found, 2 = a lookup failed,
/// 4 = invalid input line, 8 = output could not be written.
#[derive(Debug, Parser)]
#[command(name = "sblookup")]
#[command(about = "Look up URLs with the Safe Browsing API", long_about = None)]
pub struct Cli {
    /// Safe Browsing API server address (overrides config).
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Output file for Safe Browsing results.
    #[arg(long, default_value = "sbresults.txt", value_name = "PATH")]
    pub output: PathBuf,

    /// Input file of URLs to check; "-" reads stdin.
    #[arg(long, default_value = "-", value_name = "PATH")]
    pub input: String,

    /// API key (overrides config).
    #[arg(long, value_name = "KEY")]
    pub apikey: Option<String>,

    /// Maximum URLs per lookup request.
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Maximum lookup requests in flight.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Retry a failed batch up to N more times (default: no retry).
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Config file to use instead of ~/.config/sblookup/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log to ~/.local/state/sblookup/sblookup.log instead of stderr.
    #[arg(long)]
    pub log_file: bool,

    /// Do not print verdicts to stdout.
    #[arg(long, short)]
    pub quiet: bool,
}

impl Cli {
    /// One full run. Errors returned here are fatal; everything else is
    /// reported through the returned status.
    pub async fn run(&self) -> Result<StatusFlags> {
        let cfg = self.effective_config()?;
        tracing::debug!(
            server = %cfg.server_url,
            batch_size = cfg.batch_size,
            workers = cfg.max_concurrent_lookups,
            timeout_secs = cfg.request_timeout_secs,
            "loaded config"
        );

        let lookup = Arc::new(CurlLookupClient::from_config(&cfg)?);
        let writer = MatchWriter::create(&self.output)?;
        let lines = InputSource::parse(&self.input).read_lines()?;

        let mut report = run_pipeline(lines, lookup, &PipelineOptions::from_config(&cfg))
            .await
            .context("invalid lookup settings")?;

        match write_output(writer, report.aggregate.matches()) {
            Ok(n) => tracing::info!("{} result(s) written to {}", n, self.output.display()),
            Err(err) => {
                tracing::error!("writing {}: {:#}", self.output.display(), err);
                report.aggregate.mark_output_failed();
            }
        }

        if !self.quiet {
            let stdout = std::io::stdout();
            if let Err(err) = report::print_verdicts(&mut stdout.lock(), &report) {
                tracing::warn!("could not print verdicts: {}", err);
            }
        }

        Ok(report.status())
    }

    /// Config file (explicit path or default location) with flag overrides applied.
    fn effective_config(&self) -> Result<LookupConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        self.apply_overrides(&mut cfg);
        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }

    fn apply_overrides(&self, cfg: &mut LookupConfig) {
        if let Some(server) = &self.server {
            cfg.server_url = server.clone();
        }
        if let Some(key) = &self.apikey {
            cfg.api_key = Some(key.clone());
        }
        if let Some(n) = self.batch_size {
            cfg.batch_size = n;
        }
        if let Some(n) = self.workers {
            cfg.max_concurrent_lookups = n;
        }
        if let Some(secs) = self.timeout {
            cfg.request_timeout_secs = secs;
        }
        if let Some(n) = self.retries {
            let base = cfg.retry.clone().unwrap_or_default();
            cfg.retry = Some(RetryConfig {
                max_attempts: n.saturating_add(1),
                ..base
            });
        }
    }
}

/// Writes all matches and flushes the file. Returns the record count.
fn write_output(mut writer: MatchWriter<std::fs::File>, matches: &[ThreatMatch]) -> Result<usize> {
    writer.write_matches(matches).context("csv write")?;
    writer.finish()
}

#[cfg(test)]
mod tests;
