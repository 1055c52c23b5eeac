//! Aggregation of per-batch lookup results.
//!
//! A single task owns the aggregate; lookup tasks post one [`BatchOutcome`]
//! each into a bounded channel. Matches are kept per batch and concatenated
//! in batch order at the end, so the result does not depend on completion order.

mod status;

pub use status::StatusFlags;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lookup::{LookupError, LookupResponse, ThreatMatch};

/// Result of one dispatched batch, posted exactly once by its lookup task.
#[derive(Debug)]
pub struct BatchOutcome {
    pub index: usize,
    /// Number of URLs submitted in the batch.
    pub urls: usize,
    pub result: Result<LookupResponse, LookupError>,
}

/// All matches of a run plus its status flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    matches: Vec<ThreatMatch>,
    status: StatusFlags,
    batches_succeeded: usize,
    failed_batches: BTreeSet<usize>,
}

impl AggregateResult {
    /// Matches in batch order; within a batch, in response order.
    pub fn matches(&self) -> &[ThreatMatch] {
        &self.matches
    }

    pub fn status(&self) -> StatusFlags {
        self.status
    }

    pub fn batches_succeeded(&self) -> usize {
        self.batches_succeeded
    }

    pub fn batches_failed(&self) -> usize {
        self.failed_batches.len()
    }

    /// True when batch `index` failed or never reported.
    pub fn batch_failed(&self, index: usize) -> bool {
        self.failed_batches.contains(&index)
    }

    pub fn mark_invalid_input(&mut self) {
        self.status.mark_invalid_input();
    }

    pub fn mark_output_failed(&mut self) {
        self.status.mark_output_failed();
    }
}

/// Incremental aggregate state. Owned by one writer at a time.
#[derive(Debug)]
pub struct Accumulator {
    expected: usize,
    per_batch: BTreeMap<usize, Vec<ThreatMatch>>,
    reported: HashSet<usize>,
    status: StatusFlags,
    succeeded: usize,
    failed: BTreeSet<usize>,
}

impl Accumulator {
    /// `expected` is the number of batches dispatched (indices `0..expected`).
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            per_batch: BTreeMap::new(),
            reported: HashSet::with_capacity(expected),
            status: StatusFlags::default(),
            succeeded: 0,
            failed: BTreeSet::new(),
        }
    }

    /// Records one batch outcome. Returns false (and changes nothing) for a
    /// repeated or unknown batch index.
    pub fn record(&mut self, outcome: BatchOutcome) -> bool {
        let index = outcome.index;
        if index >= self.expected {
            tracing::warn!(batch = index, "ignoring outcome for unknown batch");
            return false;
        }
        if !self.reported.insert(index) {
            tracing::warn!(batch = index, "ignoring duplicate outcome");
            return false;
        }

        match outcome.result {
            Ok(resp) => {
                self.succeeded += 1;
                tracing::info!(
                    batch = index,
                    urls = outcome.urls,
                    matches = resp.matches.len(),
                    "response received"
                );
                if !resp.matches.is_empty() {
                    self.status.mark_unsafe_found();
                    self.per_batch.insert(index, resp.matches);
                }
            }
            Err(e) => {
                self.failed.insert(index);
                self.status.mark_lookup_failed();
                tracing::error!(batch = index, urls = outcome.urls, "lookup failed: {}", e);
            }
        }
        true
    }

    /// Number of batches recorded so far.
    pub fn reported(&self) -> usize {
        self.reported.len()
    }

    /// Closes the aggregate. Batches that never reported count as failed.
    pub fn finish(mut self) -> AggregateResult {
        let missing = self.expected - self.reported.len();
        if missing > 0 {
            tracing::error!(missing, "batches ended without reporting a result");
            let reported = &self.reported;
            self.failed
                .extend((0..self.expected).filter(|i| !reported.contains(i)));
            self.status.mark_lookup_failed();
        }

        AggregateResult {
            matches: self.per_batch.into_values().flatten().collect(),
            status: self.status,
            batches_succeeded: self.succeeded,
            failed_batches: self.failed,
        }
    }
}

/// Handle to the aggregation task.
pub struct Aggregator {
    tx: mpsc::Sender<BatchOutcome>,
    handle: JoinHandle<AggregateResult>,
    expected: usize,
}

impl Aggregator {
    /// Starts the aggregation task for `expected` batches.
    pub fn spawn(expected: usize, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<BatchOutcome>(capacity.max(1));
        let handle = tokio::spawn(async move {
            let mut acc = Accumulator::new(expected);
            while let Some(outcome) = rx.recv().await {
                acc.record(outcome);
            }
            acc.finish()
        });
        Self {
            tx,
            handle,
            expected,
        }
    }

    /// Sender for lookup tasks; each task posts exactly one outcome.
    pub fn sender(&self) -> mpsc::Sender<BatchOutcome> {
        self.tx.clone()
    }

    /// Waits until every sender is dropped and returns the final aggregate.
    pub async fn finish(self) -> AggregateResult {
        drop(self.tx);
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("aggregation task join: {}", e);
                let mut status = StatusFlags::default();
                status.mark_lookup_failed();
                AggregateResult {
                    matches: Vec::new(),
                    status,
                    batches_succeeded: 0,
                    failed_batches: (0..self.expected).collect(),
                }
            }
        }
    }
}
