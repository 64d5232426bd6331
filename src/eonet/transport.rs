// src/eonet/transport.rs
//! Request construction, the network seam, and envelope decoding.
//!
//! `Transport` is the only part that touches the network; everything else here is pure
//! so it can be exercised without a server. Failures always propagate to the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::EonetConfig;
use crate::error::EonetError;

/// Query parameters; values must have a string form (string, number, bool).
pub type Query = BTreeMap<String, QueryValue>;
pub type QueryValue = Value;

/// Selects which envelope key holds the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Categories,
    Events,
}

impl ContentKind {
    pub fn key(self) -> &'static str {
        match self {
            ContentKind::Categories => "categories",
            ContentKind::Events => "events",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A decoded response body: the content stored under the kind's key.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub kind: ContentKind,
    pub content: T,
}

impl<T: DeserializeOwned> Envelope<T> {
    pub fn decode(body: &str, kind: ContentKind) -> Result<Self, EonetError> {
        let mut root: serde_json::Map<String, Value> = serde_json::from_str(body)
            .map_err(|e| EonetError::Decode(format!("{kind} envelope: {e}")))?;
        let raw = root
            .remove(kind.key())
            .ok_or_else(|| EonetError::Decode(format!("missing `{kind}` in envelope")))?;
        let content = serde_json::from_value(raw)
            .map_err(|e| EonetError::Decode(format!("{kind} content: {e}")))?;
        Ok(Self { kind, content })
    }
}

pub fn decode_envelope<T: DeserializeOwned>(body: &str, kind: ContentKind) -> Result<T, EonetError> {
    Envelope::<T>::decode(body, kind).map(|env| env.content)
}

/// Render query values to strings, failing on the first value without a string form.
pub fn query_pairs(query: &Query) -> Result<Vec<(String, String)>, EonetError> {
    query
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(EonetError::InvalidParameter {
                        key: key.clone(),
                        value: other.to_string(),
                    })
                }
            };
            Ok((key.clone(), rendered))
        })
        .collect()
}

/// Base URL + endpoint path + query. An absolute endpoint replaces the base entirely.
pub fn build_url(base: &str, endpoint: &str, query: &Query) -> Result<Url, EonetError> {
    // Validate parameters before anything else so bad input never reaches the network.
    let pairs = query_pairs(query)?;

    let mut url = match Url::parse(endpoint) {
        Ok(abs) if abs.has_host() => abs,
        _ => {
            let mut url = Url::parse(base)
                .map_err(|e| EonetError::InvalidUrl(format!("{base}: {e}")))?;
            url.path_segments_mut()
                .map_err(|_| EonetError::InvalidUrl(format!("{base}: cannot take a path")))?
                .pop_if_empty()
                .extend(endpoint.split('/').filter(|s| !s.is_empty()));
            url
        }
    };

    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(url)
}

/// The network seam: fetch the body behind a fully built URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: Url) -> Result<String, EonetError>;
}

/// reqwest-backed transport with connect/request timeouts.
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(cfg: &EonetConfig) -> Result<Self, EonetError> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: Url) -> Result<String, EonetError> {
        let shown = url.to_string();
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(EonetError::Status {
                url: shown,
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}

/// EONET client: builds requests, drives the transport, decodes envelopes.
#[derive(Clone)]
pub struct Eonet {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl Eonet {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        crate::telemetry::ensure_metrics_described();
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    /// One request, one network call. No caching, no retry.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &Query,
        kind: ContentKind,
    ) -> Result<T, EonetError> {
        let result = self.request_inner(endpoint, query, kind).await;
        if let Err(e) = &result {
            counter!("eonet_request_errors_total", "kind" => e.kind()).increment(1);
        }
        result
    }

    async fn request_inner<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &Query,
        kind: ContentKind,
    ) -> Result<T, EonetError> {
        let url = build_url(&self.base_url, endpoint, query)?;
        tracing::debug!(target: "eonet", %url, %kind, "request");

        let t0 = Instant::now();
        counter!("eonet_requests_total", "kind" => kind.key()).increment(1);
        let body = self.transport.get(url).await;
        histogram!("eonet_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        decode_envelope(&body?, kind)
    }
}
