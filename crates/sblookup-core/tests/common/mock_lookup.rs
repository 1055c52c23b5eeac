//! In-process `ThreatLookup` with scripted latency and failures.

use async_trait::async_trait;
use sblookup_core::batcher::Batch;
use sblookup_core::lookup::{LookupError, LookupResponse, ThreatLookup, ThreatMatch, WireEntry};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type LatencyFn = Box<dyn Fn(usize) -> Duration + Send + Sync>;

pub struct MockLookup {
    unsafe_urls: HashSet<String>,
    failing: HashSet<usize>,
    hanging: HashSet<usize>,
    /// Batch index -> number of leading attempts that fail with HTTP 503.
    flaky: Mutex<HashMap<usize, u32>>,
    latency: LatencyFn,
    calls: AtomicUsize,
    urls_seen: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Decrements the in-flight counter even when the lookup future is dropped by a timeout.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockLookup {
    /// Flags every submitted URL contained in `unsafe_urls`.
    pub fn new<I, S>(unsafe_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unsafe_urls: unsafe_urls.into_iter().map(Into::into).collect(),
            failing: HashSet::new(),
            hanging: HashSet::new(),
            flaky: Mutex::new(HashMap::new()),
            latency: Box::new(|_| Duration::ZERO),
            calls: AtomicUsize::new(0),
            urls_seen: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Batch `index` fails with a connection error.
    pub fn failing(mut self, index: usize) -> Self {
        self.failing.insert(index);
        self
    }

    /// Batch `index` never answers.
    pub fn hanging(mut self, index: usize) -> Self {
        self.hanging.insert(index);
        self
    }

    /// Batch `index` fails its first `attempts` attempts with HTTP 503.
    pub fn flaky(self, index: usize, attempts: u32) -> Self {
        self.flaky.lock().unwrap().insert(index, attempts);
        self
    }

    pub fn latency<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) -> Duration + Send + Sync + 'static,
    {
        self.latency = Box::new(f);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls_seen(&self) -> usize {
        self.urls_seen.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

pub fn malware(url: &str) -> ThreatMatch {
    ThreatMatch {
        threat_type: "MALWARE".to_string(),
        platform_type: "ANY_PLATFORM".to_string(),
        threat_entry_type: "URL".to_string(),
        threat: WireEntry {
            url: url.to_string(),
        },
        cache_duration: Some("300s".to_string()),
    }
}

#[async_trait]
impl ThreatLookup for MockLookup {
    async fn find_matches(&self, batch: &Batch) -> Result<LookupResponse, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls_seen.fetch_add(batch.len(), Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if self.hanging.contains(&batch.index) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        tokio::time::sleep((self.latency)(batch.index)).await;

        if self.failing.contains(&batch.index) {
            // CURLE_COULDNT_CONNECT
            return Err(LookupError::Transport(curl::Error::new(7)));
        }
        {
            let mut flaky = self.flaky.lock().unwrap();
            if let Some(left) = flaky.get_mut(&batch.index) {
                if *left > 0 {
                    *left -= 1;
                    return Err(LookupError::Http(503));
                }
            }
        }

        Ok(LookupResponse {
            matches: batch
                .entries
                .iter()
                .filter(|e| self.unsafe_urls.contains(&e.raw))
                .map(|e| malware(&e.raw))
                .collect(),
        })
    }
}
