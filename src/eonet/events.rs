// src/eonet/events.rs
use metrics::counter;
use serde_json::json;

use crate::eonet::transport::{ContentKind, Eonet, Query};
use crate::eonet::types::{Category, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Open,
    Closed,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Open => "open",
            EventStatus::Closed => "closed",
        }
    }
}

/// Fetches the open and closed events of one category over a lookback window.
#[derive(Clone)]
pub struct EventFetcher {
    client: Eonet,
    fallback_endpoint: String,
}

impl EventFetcher {
    /// `fallback_endpoint` serves categories that carry no endpoint of their own.
    pub fn new(client: Eonet, fallback_endpoint: impl Into<String>) -> Self {
        Self {
            client,
            fallback_endpoint: fallback_endpoint.into(),
        }
    }

    /// Open events followed by closed events. Never fails; a failed half is empty.
    /// No dedup here: the same event may come back from both halves.
    pub async fn events_for(&self, category: &Category, lookback_days: u32) -> Vec<Event> {
        let endpoint = if category.endpoint.is_empty() {
            self.fallback_endpoint.as_str()
        } else {
            category.endpoint.as_str()
        };

        let (mut open, closed) = tokio::join!(
            self.events_with_status(endpoint, lookback_days, EventStatus::Open),
            self.events_with_status(endpoint, lookback_days, EventStatus::Closed),
        );
        open.extend(closed);

        counter!("eonet_events_decoded_total").increment(open.len() as u64);
        tracing::debug!(
            target: "eonet",
            category = %category.id,
            events = open.len(),
            "category events fetched"
        );
        open
    }

    async fn events_with_status(
        &self,
        endpoint: &str,
        lookback_days: u32,
        status: EventStatus,
    ) -> Vec<Event> {
        let mut query = Query::new();
        query.insert("days".to_string(), json!(lookback_days));
        query.insert("status".to_string(), json!(status.as_str()));

        match self
            .client
            .request::<Vec<Event>>(endpoint, &query, ContentKind::Events)
            .await
        {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(
                    target: "eonet",
                    kind = e.kind(),
                    decode = e.is_decode(),
                    error = %e,
                    endpoint,
                    status = status.as_str(),
                    "event fetch failed, using empty list"
                );
                counter!("eonet_fail_soft_total", "stage" => "events").increment(1);
                Vec::new()
            }
        }
    }
}
