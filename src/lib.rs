// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod eonet;
pub mod error;
pub mod pipeline;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::EonetConfig;
pub use crate::error::EonetError;
pub use crate::pipeline::{Pipeline, PipelineRun, RunOutcome, Snapshot};
