// src/error.rs
//! Typed failures surfaced by the EONET transport boundary.
//! Callers above the transport decide whether to recover (fail-soft) or propagate.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EonetError {
    /// Base URL or endpoint could not be turned into a request URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A query value has no string form (null, array, object).
    #[error("invalid query parameter `{key}` = {value}")]
    InvalidParameter { key: String, value: String },

    /// Payload was malformed or did not have the expected shape.
    #[error("decode failure: {0}")]
    Decode(String),

    /// Network-level failure (connect, timeout, body read).
    #[error("transport failure: {0}")]
    Transport(String),

    /// Server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
}

impl EonetError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Short, stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::Decode(_) => "decode",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
        }
    }
}

impl From<reqwest::Error> for EonetError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
