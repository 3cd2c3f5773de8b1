//! One round trip to the stats socket.
//!
//! The proxy writes a single JSON document on every new connection and
//! then either closes or idles. Each call opens its own connection,
//! reads exactly one document, and drops the connection.

use std::time::Duration;

use serde::de::IgnoredAny;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;

use crate::error::{FetchError, FetchPhase, FetchResult};

/// Upper bound on a single stats document.
pub const MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

/// Connect to `endpoint` (`host:port`) and read one JSON document.
///
/// `timeout` bounds the connect and, separately, the read that follows.
/// The returned bytes hold exactly one complete JSON value.
pub async fn fetch(endpoint: &str, timeout: Duration) -> FetchResult<Vec<u8>> {
    let mut stream = tokio::time::timeout(timeout, TcpStream::connect(endpoint))
        .await
        .map_err(|_| FetchError::Timeout {
            phase: FetchPhase::Connect,
            after: timeout,
        })??;

    tokio::time::timeout(timeout, read_document(&mut stream))
        .await
        .map_err(|_| FetchError::Timeout {
            phase: FetchPhase::Read,
            after: timeout,
        })?
}

/// Read from `reader` until the first JSON value is complete.
pub async fn read_document<R>(reader: &mut R) -> FetchResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(4096);
    let mut rescan = Rescan::default();

    loop {
        let start = buf.len();
        let n = reader.read_buf(&mut buf).await?;

        if n == 0 || rescan.due(&buf, start) {
            if let Some(len) = complete_document(&buf)? {
                buf.truncate(len);
                return Ok(buf);
            }
        }

        if n == 0 {
            return Err(FetchError::MalformedResponse(format!(
                "connection closed after {} bytes without a complete document",
                buf.len()
            )));
        }

        if buf.len() > MAX_DOCUMENT_BYTES {
            return Err(FetchError::MalformedResponse(format!(
                "document exceeds {MAX_DOCUMENT_BYTES} bytes"
            )));
        }
    }
}

/// Gate for [`complete_document`], which always parses from byte 0.
///
/// A parse runs when the new bytes end in `}` or `]`, or once the buffer
/// has doubled since the last parse. The first read is always parsed so
/// that non-JSON replies fail fast. Total parse work stays linear in the
/// document size unless the peer deliberately splits it after every
/// closing bracket.
#[derive(Debug, Default)]
struct Rescan {
    next_len: usize,
}

impl Rescan {
    fn due(&mut self, buf: &[u8], new_from: usize) -> bool {
        let closes = buf[new_from..]
            .iter()
            .rev()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| matches!(b, b'}' | b']'));

        if closes || buf.len() >= self.next_len {
            self.next_len = (buf.len() * 2).max(4096);
            true
        } else {
            false
        }
    }
}

/// Length of the first complete JSON value in `buf`, if there is one yet.
fn complete_document(buf: &[u8]) -> FetchResult<Option<usize>> {
    let mut values = serde_json::Deserializer::from_slice(buf).into_iter::<IgnoredAny>();
    match values.next() {
        Some(Ok(_)) => Ok(Some(values.byte_offset())),
        Some(Err(e)) if e.is_eof() => Ok(None),
        Some(Err(e)) => Err(FetchError::MalformedResponse(e.to_string())),
        None => Ok(None),
    }
}
