// src/pipeline/aggregator.rs
//! Running fold of per-category fetch results into the full category list.
//! Single owner, no I/O: the pipeline task feeds it one completion at a time.

use std::collections::HashSet;

use crate::eonet::types::{compare_closing_dates, Category, Event};

/// The full ordered category list at one point in a run.
pub type Snapshot = Vec<Category>;

/// Events from `events` that belong to `category` and that it does not hold yet,
/// deduplicated by id (first occurrence wins) and sorted by closing date.
pub fn filtered_events(events: &[Event], category: &Category) -> Vec<Event> {
    let mut seen: HashSet<&str> = category.events.iter().map(|e| e.id.as_str()).collect();
    let mut out: Vec<Event> = events
        .iter()
        .filter(|e| e.belongs_to(&category.id) && seen.insert(e.id.as_str()))
        .cloned()
        .collect();
    out.sort_by(compare_closing_dates);
    out
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    categories: Vec<Category>,
    completions: usize,
}

impl Aggregator {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories,
            completions: 0,
        }
    }

    /// Fold one completed fetch and return `(completions so far, snapshot)`.
    ///
    /// Membership is checked against every category, since an event may belong to
    /// several. Category order and identity never change; each category only gains
    /// events it did not already hold.
    pub fn fold(&mut self, events: &[Event]) -> (usize, Snapshot) {
        for category in self.categories.iter_mut() {
            let fresh = filtered_events(events, category);
            if fresh.is_empty() {
                continue;
            }
            let mut merged = Vec::with_capacity(category.events.len() + fresh.len());
            merged.extend_from_slice(&category.events);
            merged.extend(fresh);
            category.events = merged;
        }
        self.completions = (self.completions + 1).min(self.categories.len());
        (self.completions, self.categories.clone())
    }

    pub fn completions(&self) -> usize {
        self.completions
    }

    pub fn total(&self) -> usize {
        self.categories.len()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.categories.clone()
    }
}
