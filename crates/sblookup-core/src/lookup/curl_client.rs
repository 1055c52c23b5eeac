//! threatMatches:find over libcurl.
//!
//! Each lookup is one blocking POST run on the tokio blocking pool.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use super::error::LookupError;
use super::wire::{ClientInfo, LookupRequest, LookupResponse};
use super::ThreatLookup;
use crate::batcher::Batch;
use crate::config::LookupConfig;

/// Fixed API path; any path on the configured server URL is replaced.
pub const THREAT_MATCHES_PATH: &str = "/v4/threatMatches:find";

/// Longest response body prefix written to the debug log.
const BODY_LOG_LIMIT: usize = 512;

/// Builds `{server}/v4/threatMatches:find[?key=...]`.
pub fn threat_matches_endpoint(server_url: &str, api_key: Option<&str>) -> Result<Url, LookupError> {
    let bad = |reason: String| LookupError::Endpoint {
        url: server_url.to_string(),
        reason,
    };
    let mut url = Url::parse(server_url.trim()).map_err(|e| bad(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(bad(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(bad("missing host".to_string()));
    }
    url.set_path(THREAT_MATCHES_PATH);
    url.set_query(None);
    url.set_fragment(None);
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        url.query_pairs_mut().append_pair("key", key);
    }
    Ok(url)
}

/// Production lookup client.
#[derive(Debug, Clone)]
pub struct CurlLookupClient {
    endpoint: Url,
    client: ClientInfo,
    connect_timeout: Duration,
    timeout: Duration,
}

impl CurlLookupClient {
    pub fn new(
        server_url: &str,
        api_key: Option<&str>,
        client: ClientInfo,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        Ok(Self {
            endpoint: threat_matches_endpoint(server_url, api_key)?,
            client,
            connect_timeout,
            timeout,
        })
    }

    pub fn from_config(cfg: &LookupConfig) -> Result<Self, LookupError> {
        Self::new(
            &cfg.server_url,
            cfg.api_key.as_deref(),
            ClientInfo {
                client_id: cfg.client_id.clone(),
                client_version: cfg.client_version.clone(),
            },
            cfg.connect_timeout(),
            cfg.request_timeout(),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ThreatLookup for CurlLookupClient {
    async fn find_matches(&self, batch: &Batch) -> Result<LookupResponse, LookupError> {
        let request = LookupRequest::for_batch(&self.client, batch);
        let body = serde_json::to_vec(&request).map_err(LookupError::Encode)?;

        let endpoint = self.endpoint.to_string();
        let (connect_timeout, timeout) = (self.connect_timeout, self.timeout);
        let (code, response) = tokio::task::spawn_blocking(move || {
            post_json(&endpoint, &body, connect_timeout, timeout)
        })
        .await
        .map_err(|e| LookupError::Task(e.to_string()))??;

        tracing::debug!(
            batch = batch.index,
            status = code,
            "response body: {}",
            body_preview(&response)
        );

        if !(200..300).contains(&code) {
            return Err(LookupError::Http(code));
        }
        decode_response(&response)
    }
}

/// Parses a 2xx response body.
pub(crate) fn decode_response(body: &[u8]) -> Result<LookupResponse, LookupError> {
    serde_json::from_slice(body).map_err(LookupError::Decode)
}

/// Performs one POST and returns (status code, body).
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
fn post_json(
    endpoint: &str,
    body: &[u8],
    connect_timeout: Duration,
    timeout: Duration,
) -> Result<(u32, Vec<u8>), curl::Error> {
    let mut response = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(endpoint)?;
    easy.post(true)?;
    easy.post_fields_copy(body)?;
    easy.connect_timeout(connect_timeout)?;
    easy.timeout(timeout)?;

    let mut list = curl::easy::List::new();
    list.append("Content-Type: application/json")?;
    // Large bodies would otherwise wait on 100-continue.
    list.append("Expect:")?;
    easy.http_headers(list)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            response.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    Ok((code, response))
}

fn body_preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= BODY_LOG_LIMIT {
        return text.into_owned();
    }
    let mut cut = BODY_LOG_LIMIT;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... ({} bytes)", &text[..cut], body.len())
}
