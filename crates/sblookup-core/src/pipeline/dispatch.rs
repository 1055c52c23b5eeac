//! Bounded concurrent dispatch of batches to the lookup service.
//!
//! Keeps up to `max_concurrent_lookups` lookups running; when one finishes,
//! the next batch (in formation order) is started until none remain.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::PipelineOptions;
use crate::aggregate::BatchOutcome;
use crate::batcher::Batch;
use crate::lookup::{LookupError, LookupResponse, ThreatLookup};
use crate::retry::{run_with_retry, RetryPolicy};

pub(super) async fn dispatch<L>(
    batches: Vec<Batch>,
    lookup: Arc<L>,
    opts: &PipelineOptions,
    outcomes: mpsc::Sender<BatchOutcome>,
) where
    L: ThreatLookup + 'static,
{
    let max_in_flight = opts.max_concurrent_lookups.max(1);
    let mut pending = batches.into_iter();
    let mut join_set = tokio::task::JoinSet::new();

    loop {
        while join_set.len() < max_in_flight {
            let Some(batch) = pending.next() else {
                break;
            };
            let (first, last) = batch.line_range();
            tracing::info!(
                batch = batch.index,
                urls = batch.len(),
                "sending lookup request for lines {} to {}",
                first,
                last
            );

            let lookup = Arc::clone(&lookup);
            let tx = outcomes.clone();
            let retry = opts.retry;
            let timeout = opts.request_timeout;
            join_set.spawn(async move {
                let result = lookup_batch(lookup.as_ref(), &batch, &retry, timeout).await;
                let outcome = BatchOutcome {
                    index: batch.index,
                    urls: batch.len(),
                    result,
                };
                if tx.send(outcome).await.is_err() {
                    tracing::error!(batch = batch.index, "aggregator closed before outcome was recorded");
                }
            });
        }

        if join_set.is_empty() {
            break;
        }

        if let Some(Err(e)) = join_set.join_next().await {
            // The aggregator counts the batch as failed when it never reports.
            tracing::error!("lookup task join: {}", e);
        }
    }
}

/// One batch: every attempt bounded by `timeout`, retried per `retry`.
async fn lookup_batch<L>(
    lookup: &L,
    batch: &Batch,
    retry: &RetryPolicy,
    timeout: Duration,
) -> Result<LookupResponse, LookupError>
where
    L: ThreatLookup + ?Sized,
{
    run_with_retry(retry, |attempt| async move {
        if attempt > 1 {
            tracing::debug!(batch = batch.index, attempt, "retrying lookup");
        }
        match tokio::time::timeout(timeout, lookup.find_matches(batch)).await {
            Ok(res) => res,
            Err(_) => Err(LookupError::Timeout(timeout)),
        }
    })
    .await
}
