//! Scrape error types.

use thiserror::Error;
use twemproxy_stats::{DecodeError, FetchError};

/// Errors that can end a single scrape. None of them is fatal to the
/// exporter; they collapse to `up = 0` at the collection boundary.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
