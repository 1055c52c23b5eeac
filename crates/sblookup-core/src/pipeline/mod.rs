//! Lookup pipeline for one run.
//!
//! input lines → validation → batching → concurrent lookups → aggregation.
//! Writing the aggregate out is left to the caller (see [`crate::output`]).

mod dispatch;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::aggregate::{AggregateResult, Aggregator, StatusFlags};
use crate::batcher::into_batches;
use crate::config::{ConfigError, LookupConfig, DEFAULT_BATCH_SIZE};
use crate::lookup::{ThreatLookup, ThreatMatch};
use crate::retry::RetryPolicy;
use crate::url_model::{validate_lines, InvalidLine};

/// Knobs for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Maximum URLs per lookup request.
    pub batch_size: usize,
    /// Maximum lookups in flight.
    pub max_concurrent_lookups: usize,
    /// Deadline for each lookup attempt.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent_lookups: 4,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::no_retry(),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(cfg: &LookupConfig) -> Self {
        Self {
            batch_size: cfg.batch_size,
            max_concurrent_lookups: cfg.max_concurrent_lookups,
            request_timeout: cfg.request_timeout(),
            retry: cfg.retry_policy(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.max_concurrent_lookups == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// A URL that was sent to the lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedUrl {
    pub line_no: usize,
    pub url: String,
    /// Index of the batch it went out in.
    pub batch: usize,
}

/// Per-URL outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<'a> {
    Safe,
    /// Every match the service returned for this URL.
    Unsafe(Vec<&'a ThreatMatch>),
    /// Its batch failed, so nothing is known about it.
    Unknown,
}

/// Everything a run produced, before output.
#[derive(Debug)]
pub struct RunReport {
    pub aggregate: AggregateResult,
    /// Lines rejected by validation, in input order.
    pub invalid: Vec<InvalidLine>,
    /// URLs sent to the lookup service, in input order.
    pub urls: Vec<SubmittedUrl>,
    /// Number of URLs sent to the lookup service.
    pub submitted: usize,
    /// Number of batches dispatched.
    pub batches: usize,
}

impl RunReport {
    pub fn status(&self) -> StatusFlags {
        self.aggregate.status()
    }

    /// One verdict per submitted URL, in input order.
    pub fn verdicts(&self) -> Vec<(&SubmittedUrl, Verdict<'_>)> {
        let mut by_url: HashMap<&str, Vec<&ThreatMatch>> = HashMap::new();
        for m in self.aggregate.matches() {
            by_url.entry(m.url()).or_default().push(m);
        }
        self.urls
            .iter()
            .map(|u| {
                let verdict = if self.aggregate.batch_failed(u.batch) {
                    Verdict::Unknown
                } else {
                    match by_url.get(u.url.as_str()) {
                        Some(found) => Verdict::Unsafe(found.clone()),
                        None => Verdict::Safe,
                    }
                };
                (u, verdict)
            })
            .collect()
    }
}

/// Runs validation, batching, dispatch and aggregation over `lines`.
///
/// Only invalid options stop the run; per-line and per-batch failures are
/// recorded in the report's status instead.
pub async fn run_pipeline<L, I, S>(
    lines: I,
    lookup: Arc<L>,
    opts: &PipelineOptions,
) -> Result<RunReport, ConfigError>
where
    L: ThreatLookup + 'static,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    opts.validate()?;

    let (entries, invalid) = validate_lines(lines);
    let submitted = entries.len();
    let batches = into_batches(entries, opts.batch_size)?;
    let batch_count = batches.len();
    let urls: Vec<SubmittedUrl> = batches
        .iter()
        .flat_map(|b| {
            b.entries.iter().map(move |e| SubmittedUrl {
                line_no: e.line_no,
                url: e.raw.clone(),
                batch: b.index,
            })
        })
        .collect();
    tracing::info!(
        valid = submitted,
        invalid = invalid.len(),
        batches = batch_count,
        "input validated"
    );

    let aggregator = Aggregator::spawn(batch_count, opts.max_concurrent_lookups);
    dispatch::dispatch(batches, lookup, opts, aggregator.sender()).await;
    let mut aggregate = aggregator.finish().await;

    if !invalid.is_empty() {
        aggregate.mark_invalid_input();
    }

    Ok(RunReport {
        aggregate,
        invalid,
        urls,
        submitted,
        batches: batch_count,
    })
}
