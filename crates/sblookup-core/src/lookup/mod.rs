//! Threat lookups for one batch at a time.
//!
//! [`ThreatLookup`] is the seam between the pipeline and the network;
//! [`CurlLookupClient`] is the production implementation.

mod curl_client;
mod error;
mod wire;

pub use curl_client::{threat_matches_endpoint, CurlLookupClient, THREAT_MATCHES_PATH};
pub use error::LookupError;
pub use wire::{
    ClientInfo, LookupRequest, LookupResponse, ThreatInfo, ThreatMatch, WireEntry,
    PLATFORM_TYPE_UNSPECIFIED, THREAT_ENTRY_TYPE_UNSPECIFIED, THREAT_TYPE_UNSPECIFIED,
};

use async_trait::async_trait;

use crate::batcher::Batch;

/// Sends one batch to a threat-matching service.
///
/// Implementations issue a single request per call and do not retry;
/// retries and deadlines are applied by the pipeline.
#[async_trait]
pub trait ThreatLookup: Send + Sync {
    async fn find_matches(&self, batch: &Batch) -> Result<LookupResponse, LookupError>;
}
