// src/eonet/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A named classification with its own event endpoint and a growing list of matched events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "title")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Absolute URL or path relative to the API base.
    #[serde(rename = "link", default)]
    pub endpoint: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            endpoint: String::new(),
            events: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn holds(&self, event_id: &str) -> bool {
        self.events.iter().any(|e| e.id == event_id)
    }
}

/// A time-bounded occurrence; `closed == None` means still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "category_ids")]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub closed: Option<DateTime<Utc>>,
    // Opaque; decoded but never interpreted.
    #[serde(default)]
    pub geometries: Vec<serde_json::Value>,
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
}

impl Event {
    pub fn new<I, S>(id: impl Into<String>, title: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            link: None,
            categories: categories.into_iter().map(Into::into).collect(),
            closed: None,
            geometries: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn closed_at(mut self, at: DateTime<Utc>) -> Self {
        self.closed = Some(at);
        self
    }

    pub fn belongs_to(&self, category_id: &str) -> bool {
        self.categories.contains(category_id)
    }
}

/// Ascending by closing date; open events (no date) sort last.
pub fn compare_closing_dates(a: &Event, b: &Event) -> Ordering {
    match (a.closed, b.closed) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// EONET sends category ids as numbers and event ids as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    RawId::deserialize(d).map(String::from)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCategoryRef {
    Object { id: RawId },
    Bare(RawId),
}

fn category_ids<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<String>, D::Error> {
    let refs = Vec::<RawCategoryRef>::deserialize(d)?;
    Ok(refs
        .into_iter()
        .map(|r| match r {
            RawCategoryRef::Object { id } | RawCategoryRef::Bare(id) => String::from(id),
        })
        .collect())
}
