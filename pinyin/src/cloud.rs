//! Remote phrase service.
//!
//! Asks a user-deployed prediction server for whole-phrase suggestions and
//! feeds them to the engine as smart phrases. Disabled by default; the engine
//! works the same without it.
//!
//! Uses the `reqwest` blocking client, so no async runtime is needed. Each
//! request is bounded by a timeout and any failure yields no suggestions.

use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use webime_core::{Error, PhraseReranker, Result, TrieIndex};

/// How the segment is sent to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMethod {
    /// POST with JSON body `{"query": "<segment>"}`.
    #[default]
    Post,
    /// GET with `?query=<segment>` appended to the endpoint.
    Get,
}

/// A remote suggestion with confidence score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteCandidate {
    /// The candidate text (Chinese characters)
    pub text: String,
    /// Confidence score, 0.0 to 1.0
    #[serde(default)]
    pub confidence: f32,
}

pub struct RemotePhraseService {
    endpoint: String,
    method: RequestMethod,
    enabled: bool,
    timeout_ms: u64,
    max_results: usize,
    client: OnceCell<reqwest::blocking::Client>,
}

impl RemotePhraseService {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: RequestMethod::default(),
            enabled: false,
            timeout_ms: 500,
            max_results: 5,
            client: OnceCell::new(),
        }
    }

    pub fn with_method(mut self, method: RequestMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self.client = OnceCell::new();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// URL used for a GET request.
    pub fn get_url(&self, segment: &str) -> String {
        let sep = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}query={}", self.endpoint, sep, urlencoding::encode(segment))
    }

    /// Blocking query. Returns an empty list when disabled, on empty input,
    /// and on any network or decoding failure.
    pub fn query(&self, segment: &str) -> Vec<RemoteCandidate> {
        if !self.enabled || segment.is_empty() {
            return Vec::new();
        }
        match self.query_blocking(segment) {
            Ok(mut candidates) => {
                candidates.truncate(self.max_results);
                debug!(segment, results = candidates.len(), "remote phrase query");
                candidates
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "remote phrase query failed");
                Vec::new()
            }
        }
    }

    fn client(&self) -> Result<&reqwest::blocking::Client> {
        self.client.get_or_try_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(Duration::from_millis(self.timeout_ms))
                .build()
                .map_err(backend_error)
        })
    }

    fn query_blocking(&self, segment: &str) -> Result<Vec<RemoteCandidate>> {
        let client = self.client()?;
        let request = match self.method {
            RequestMethod::Post => client
                .post(&self.endpoint)
                .json(&serde_json::json!({ "query": segment })),
            RequestMethod::Get => client.get(self.get_url(segment)),
        };
        let response = request
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(backend_error)?;
        let body = response.text().map_err(backend_error)?;
        parse_response(&body)
    }
}

fn backend_error(e: reqwest::Error) -> Error {
    Error::Backend(e.to_string())
}

/// Decode `[{"text": "你好", "confidence": 0.95}, ...]`, best first. Empty
/// texts are dropped; equal confidences keep server order.
pub fn parse_response(body: &str) -> Result<Vec<RemoteCandidate>> {
    let mut candidates: Vec<RemoteCandidate> =
        serde_json::from_str(body).map_err(|e| Error::Backend(format!("bad response: {}", e)))?;
    candidates.retain(|c| !c.text.trim().is_empty());
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    Ok(candidates)
}

impl PhraseReranker for RemotePhraseService {
    fn suggest(&self, segment: &str, _index: &TrieIndex) -> Vec<String> {
        self.query(segment).into_iter().map(|c| c.text).collect()
    }
}
