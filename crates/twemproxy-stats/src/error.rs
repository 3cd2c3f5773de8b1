//! Error types for fetching and decoding stats documents.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors produced while turning a stats document into a [`crate::StatsSnapshot`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed stats document: {0}")]
    Malformed(String),

    #[error("missing field `{field}` in {scope}")]
    MissingField { scope: String, field: String },

    #[error("field `{field}` in {scope} is not a {expected}")]
    FieldTypeMismatch {
        scope: String,
        field: String,
        expected: &'static str,
    },

    #[error("unexpected field `{key}` in {scope}")]
    UnexpectedField { scope: String, key: String },
}

/// Which step of the round trip ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Connect,
    Read,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connect => f.write_str("connect"),
            FetchPhase::Read => f.write_str("read"),
        }
    }
}

/// Errors produced by a single round trip to the stats endpoint.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connection to stats endpoint failed: {0}")]
    Connection(#[from] std::io::Error),

    #[error("{phase} timed out after {after:?}")]
    Timeout { phase: FetchPhase, after: Duration },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
