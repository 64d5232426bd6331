// tests/common/mod.rs
// Scripted EONET transport shared by integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use eonet_aggregator::eonet::Transport;
use eonet_aggregator::EonetError;
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const BASE: &str = "http://eonet.test/api/v2.1";

#[derive(Clone)]
enum Reply {
    Body(String),
    Fail(EonetError),
    Panic,
}

/// Replies keyed by `path?query`; unknown keys fail with a transport error.
/// Tracks total calls, peak concurrent calls, and peak distinct paths in flight
/// (a category's open and closed calls share one path).
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, Reply>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
    active_paths: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    peak_paths: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, key: &str, body: Value) {
        self.replies
            .lock()
            .insert(key.to_string(), Reply::Body(body.to_string()));
    }

    pub fn reply_raw(&self, key: &str, body: &str) {
        self.replies
            .lock()
            .insert(key.to_string(), Reply::Body(body.to_string()));
    }

    pub fn fail(&self, key: &str, err: EonetError) {
        self.replies.lock().insert(key.to_string(), Reply::Fail(err));
    }

    /// The call for `key` panics inside the transport.
    pub fn panic_on(&self, key: &str) {
        self.replies.lock().insert(key.to_string(), Reply::Panic);
    }

    /// Delay every call whose path equals `path`.
    pub fn delay(&self, path: &str, d: Duration) {
        self.delays.lock().insert(path.to_string(), d);
    }

    pub fn categories(&self, cats: Value) {
        self.reply("/api/v2.1/categories", json!({ "title": "EONET Event Categories", "categories": cats }));
    }

    pub fn events(&self, path: &str, status: &str, events: Value) {
        self.reply(
            &events_key(path, status),
            json!({ "title": "EONET Events", "events": events }),
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|k| k.split('?').next() == Some(path))
            .count()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_paths(&self) -> usize {
        self.peak_paths.load(Ordering::SeqCst)
    }
}

pub fn events_key(path: &str, status: &str) -> String {
    format!("{path}?days=360&status={status}")
}

pub fn category_json(id: u32, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("{title} description"),
        "link": format!("{BASE}/categories/{id}"),
    })
}

pub fn event_json(id: &str, category_ids: &[u32], closed: Option<&str>) -> Value {
    let cats: Vec<Value> = category_ids
        .iter()
        .map(|c| json!({ "id": c, "title": format!("cat {c}") }))
        .collect();
    json!({
        "id": id,
        "title": format!("event {id}"),
        "closed": closed,
        "categories": cats,
        "geometries": [{ "date": "2020-01-01T00:00:00Z", "type": "Point", "coordinates": [0.0, 0.0] }],
    })
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: Url) -> Result<String, EonetError> {
        let path = url.path().to_string();
        let key = match url.query() {
            Some(q) => format!("{path}?{q}"),
            None => path.clone(),
        };
        self.calls.lock().push(key.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        {
            let mut active = self.active_paths.lock();
            *active.entry(path.clone()).or_default() += 1;
            self.peak_paths.fetch_max(active.len(), Ordering::SeqCst);
        }

        let delay = self.delays.lock().get(&path).copied();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        } else {
            tokio::task::yield_now().await;
        }

        {
            let mut active = self.active_paths.lock();
            if let Some(n) = active.get_mut(&path) {
                *n -= 1;
                if *n == 0 {
                    active.remove(&path);
                }
            }
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self.replies.lock().get(&key).cloned();
        match reply {
            Some(Reply::Body(b)) => Ok(b),
            Some(Reply::Fail(e)) => Err(e),
            Some(Reply::Panic) => panic!("scripted panic for {key}"),
            None => Err(EonetError::Transport(format!("no scripted reply for {key}"))),
        }
    }
}

pub fn pipeline(mock: std::sync::Arc<MockTransport>, max_concurrent: usize) -> eonet_aggregator::Pipeline {
    let cfg = eonet_aggregator::EonetConfig {
        base_url: BASE.to_string(),
        max_concurrent,
        ..Default::default()
    };
    eonet_aggregator::Pipeline::from_config(&cfg, mock)
}

pub fn category_path(id: u32) -> String {
    format!("/api/v2.1/categories/{id}")
}
