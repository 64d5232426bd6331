// src/pipeline/scheduler.rs
use std::collections::HashSet;

use metrics::gauge;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::eonet::events::EventFetcher;
use crate::eonet::types::{Category, Event};

/// Events fetched for one category.
#[derive(Debug, Clone)]
pub struct CategoryEvents {
    pub category_id: String,
    pub events: Vec<Event>,
}

/// Fetch events for every category with at most `max_concurrent` fetches in flight.
///
/// Results arrive on the returned channel in completion order. The channel closes once
/// every category has been reported. Dropping the receiver stops further admissions;
/// fetches already in flight are left to finish on their own.
pub fn schedule_all(
    fetcher: EventFetcher,
    categories: Vec<Category>,
    lookback_days: u32,
    max_concurrent: usize,
) -> mpsc::Receiver<CategoryEvents> {
    let limit = max_concurrent.max(1);
    let (tx, rx) = mpsc::channel(limit);

    tokio::spawn(async move {
        let mut queue = categories.into_iter();
        let mut in_flight: JoinSet<CategoryEvents> = JoinSet::new();
        let mut outstanding: HashSet<String> = HashSet::new();

        loop {
            while in_flight.len() < limit && !tx.is_closed() {
                let Some(category) = queue.next() else { break };
                outstanding.insert(category.id.clone());
                let fetcher = fetcher.clone();
                in_flight.spawn(async move {
                    let events = fetcher.events_for(&category, lookback_days).await;
                    CategoryEvents {
                        category_id: category.id,
                        events,
                    }
                });
                gauge!("pipeline_inflight").set(in_flight.len() as f64);
            }

            let Some(joined) = in_flight.join_next().await else { break };
            gauge!("pipeline_inflight").set(in_flight.len() as f64);

            match joined {
                Ok(done) => {
                    outstanding.remove(&done.category_id);
                    if tx.send(done).await.is_err() {
                        tracing::debug!(target: "pipeline", "consumer gone, no further fetches");
                        in_flight.detach_all();
                        return;
                    }
                }
                Err(e) => {
                    // Reported below as an empty result once the task set drains.
                    tracing::warn!(target: "pipeline", error = ?e, "category fetch task failed");
                }
            }
        }

        // Anything still outstanding belongs to a task that panicked or was cancelled.
        for category_id in outstanding {
            let empty = CategoryEvents {
                category_id,
                events: Vec::new(),
            };
            if tx.send(empty).await.is_err() {
                return;
            }
        }
    });

    rx
}
