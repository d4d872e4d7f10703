//! Quote fetching from the upstream quote API.
//!
//! # Responsibility
//! - Define the `QuoteSource` seam and its HTTP implementation.
//! - Track loading/error/result state for the shell.
//!
//! # Invariants
//! - Only the most recently issued request may update coordinator state.

pub mod coordinator;
pub mod source;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FetchResult<T> = Result<T, FetchError>;

/// Failure of one quote fetch.
#[derive(Debug)]
pub enum FetchError {
    /// Endpoint URL could not be parsed or is not http(s).
    InvalidEndpoint(String),
    /// Request could not be sent or the body could not be read.
    Transport(reqwest::Error),
    /// Upstream answered with a non-success status.
    Status(u16),
    /// Body is not a JSON array of quote records.
    Decode(serde_json::Error),
    /// Upstream returned an empty array.
    Empty,
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEndpoint(value) => write!(f, "invalid quote endpoint: `{value}`"),
            Self::Transport(err) => write!(f, "could not reach quote service: {err}"),
            Self::Status(code) => write!(f, "quote service responded with status {code}"),
            Self::Decode(err) => write!(f, "could not read quote response: {err}"),
            Self::Empty => write!(f, "quote service returned no quotes"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::InvalidEndpoint(_) | Self::Status(_) | Self::Empty => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

impl FetchError {
    /// Stable short code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEndpoint(_) => "invalid_endpoint",
            Self::Transport(_) => "transport",
            Self::Status(_) => "bad_status",
            Self::Decode(_) => "decode",
            Self::Empty => "empty",
        }
    }
}
