// HTTP client for the OpenSearch Dashboards internal search endpoint

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use logsift_core::{RawLog, SearchSource};

use crate::query;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("search API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode search response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid time range literal: {0}")]
    InvalidTimeRange(String),

    #[error("all {0} search windows failed")]
    AllWindowsFailed(usize),
}

/// Client for the Dashboards proxy search endpoint. One instance is shared
/// across all window requests; the per-request timeout is baked into the
/// underlying reqwest client.
pub struct SearchClient {
    http: reqwest::Client,
    url: String,
    username: String,
    password: String,
}

impl SearchClient {
    const SEARCH_PATH: &'static str = "/internal/search/opensearch-with-long-numerals";

    pub fn new(
        url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Run one search against one index and decode the hits.
    pub async fn search(
        &self,
        index: &str,
        body: serde_json::Value,
    ) -> Result<Vec<RawLog>, FetchError> {
        let envelope = query::request_envelope(index, body);

        let response = self
            .http
            .post(format!("{}{}", self.url, Self::SEARCH_PATH))
            .basic_auth(&self.username, Some(&self.password))
            .header("Content-Type", "application/json")
            .header("osd-xsrf", "osd-fetch")
            .header("osd-version", "3.0.0")
            .json(&envelope)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api { status, body });
        }

        let text = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&text)?;
        Ok(parsed.into_raw_logs(index))
    }

    /// Cheap connectivity probe, used to fail fast before the windowed
    /// fetch fans out.
    pub async fn ping(&self) -> Result<(), FetchError> {
        let response = self
            .http
            .get(format!(
                "{}/api/saved_objects/_find?type=index-pattern",
                self.url
            ))
            .basic_auth(&self.username, Some(&self.password))
            .header("osd-xsrf", "true")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api { status, body });
        }

        Ok(())
    }
}

// RESPONSE ENVELOPE //

// the proxy endpoint nests the usual search response under "rawResponse"
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "rawResponse", default)]
    raw_response: RawResponse,
}

#[derive(Debug, Default, Deserialize)]
struct RawResponse {
    #[serde(default)]
    hits: HitsEnvelope,
}

#[derive(Debug, Default, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_index", default)]
    index: String,

    #[serde(rename = "_id", default)]
    id: String,

    #[serde(rename = "_source", default)]
    source: SearchSource,
}

impl SearchResponse {
    fn into_raw_logs(self, queried_index: &str) -> Vec<RawLog> {
        self.raw_response
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let index = if hit.index.is_empty() {
                    queried_index.to_string()
                } else {
                    hit.index
                };
                RawLog {
                    index,
                    id: hit.id,
                    timestamp: hit.source.timestamp,
                    source: hit.source,
                }
            })
            .collect()
    }
}
