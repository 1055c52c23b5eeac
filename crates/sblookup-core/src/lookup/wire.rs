//! JSON documents exchanged with the threatMatches:find endpoint.

use serde::{Deserialize, Serialize};

use crate::batcher::Batch;

/// Wildcard used for every classification filter.
pub const THREAT_TYPE_UNSPECIFIED: &str = "THREAT_TYPE_UNSPECIFIED";
pub const PLATFORM_TYPE_UNSPECIFIED: &str = "PLATFORM_TYPE_UNSPECIFIED";
pub const THREAT_ENTRY_TYPE_UNSPECIFIED: &str = "THREAT_ENTRY_TYPE_UNSPECIFIED";

/// Client identity sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_id: String,
    pub client_version: String,
}

/// `{"url": ...}` as used in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEntry {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatInfo {
    pub threat_types: Vec<String>,
    pub platform_types: Vec<String>,
    pub threat_entry_types: Vec<String>,
    pub threat_entries: Vec<WireEntry>,
}

/// Request body for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    pub client: ClientInfo,
    pub threat_info: ThreatInfo,
}

impl LookupRequest {
    /// Wraps `batch` with the client identity and wildcard filters.
    pub fn for_batch(client: &ClientInfo, batch: &Batch) -> Self {
        Self {
            client: client.clone(),
            threat_info: ThreatInfo {
                threat_types: vec![THREAT_TYPE_UNSPECIFIED.to_string()],
                platform_types: vec![PLATFORM_TYPE_UNSPECIFIED.to_string()],
                threat_entry_types: vec![THREAT_ENTRY_TYPE_UNSPECIFIED.to_string()],
                threat_entries: batch
                    .entries
                    .iter()
                    .map(|e| WireEntry { url: e.raw.clone() })
                    .collect(),
            },
        }
    }

    /// URLs carried by this request, in order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.threat_info.threat_entries.iter().map(|e| e.url.as_str())
    }
}

/// One URL matched against one threat list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatch {
    #[serde(default)]
    pub threat_type: String,
    #[serde(default)]
    pub platform_type: String,
    #[serde(default)]
    pub threat_entry_type: String,
    pub threat: WireEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_duration: Option<String>,
}

impl ThreatMatch {
    pub fn url(&self) -> &str {
        &self.threat.url
    }

    /// Output record: URL, threat type, platform type, threat-entry type.
    pub fn record(&self) -> [&str; 4] {
        [
            self.threat.url.as_str(),
            self.threat_type.as_str(),
            self.platform_type.as_str(),
            self.threat_entry_type.as_str(),
        ]
    }
}

/// Response body; the server omits `matches` when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub matches: Vec<ThreatMatch>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batcher::into_batches;
    use crate::url_model::ThreatEntry;

    fn client() -> ClientInfo {
        ClientInfo {
            client_id: "NSRG".to_string(),
            client_version: "1.0".to_string(),
        }
    }

    #[test]
    fn request_json_shape() {
        let entries = vec![
            ThreatEntry::parse(1, " https://good.example ").unwrap(),
            ThreatEntry::parse(2, "http://bad.example").unwrap(),
        ];
        let batch = into_batches(entries, 10).unwrap().remove(0);
        let req = LookupRequest::for_batch(&client(), &batch);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["client"]["clientId"], "NSRG");
        assert_eq!(v["client"]["clientVersion"], "1.0");
        assert_eq!(v["threatInfo"]["threatTypes"][0], THREAT_TYPE_UNSPECIFIED);
        assert_eq!(v["threatInfo"]["platformTypes"][0], PLATFORM_TYPE_UNSPECIFIED);
        assert_eq!(
            v["threatInfo"]["threatEntryTypes"][0],
            THREAT_ENTRY_TYPE_UNSPECIFIED
        );
        assert_eq!(v["threatInfo"]["threatEntries"][0]["url"], "https://good.example");
        assert_eq!(v["threatInfo"]["threatEntries"][1]["url"], "http://bad.example");
        assert_eq!(
            req.urls().collect::<Vec<_>>(),
            vec!["https://good.example", "http://bad.example"]
        );
    }

    #[test]
    fn response_with_matches() {
        let body = r#"{
            "matches": [{
                "threatType": "MALWARE",
                "platformType": "ANY_PLATFORM",
                "threat": {"url": "http://bad.example"},
                "cacheDuration": "300s",
                "threatEntryType": "URL"
            }]
        }"#;
        let resp: LookupResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.matches.len(), 1);
        let m = &resp.matches[0];
        assert_eq!(m.url(), "http://bad.example");
        assert_eq!(m.cache_duration.as_deref(), Some("300s"));
        assert_eq!(
            m.record(),
            ["http://bad.example", "MALWARE", "ANY_PLATFORM", "URL"]
        );
    }

    #[test]
    fn empty_object_means_no_matches() {
        let resp: LookupResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.matches.is_empty());
    }

    #[test]
    fn match_without_threat_is_malformed() {
        let body = r#"{"matches": [{"threatType": "MALWARE"}]}"#;
        assert!(serde_json::from_str::<LookupResponse>(body).is_err());
    }
}
