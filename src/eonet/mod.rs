// src/eonet/mod.rs
//! NASA EONET access: transport seam, wire types, the shared category source and the
//! per-category event fetcher.

pub mod categories;
pub mod events;
pub mod transport;
pub mod types;

pub use categories::CategorySource;
pub use events::{EventFetcher, EventStatus};
pub use transport::{ContentKind, Eonet, HttpTransport, Transport};
pub use types::{Category, Event};
