//! twemproxy-stats — typed access to the twemproxy stats socket.
//!
//! twemproxy (nutcracker) serves a JSON document on its stats port that
//! mixes fixed counters with one nested object per pool, each of which
//! mixes fixed counters with one nested object per backend server.
//!
//! # Architecture
//!
//! ```text
//! fetch(endpoint, timeout) → bytes of one JSON document
//!   └── decode(bytes) → StatsSnapshot
//!         └── pools: name → PoolSnapshot
//!               └── servers: name → ServerSnapshot
//! ```
//!
//! The fixed keys of each level are closed sets ([`RootField`],
//! [`PoolField`], [`ServerField`]); every other key names a child.

pub mod decode;
pub mod error;
pub mod fetch;
pub mod fields;
pub mod snapshot;

pub use decode::{decode, decode_value};
pub use error::{DecodeError, DecodeResult, FetchError, FetchPhase, FetchResult};
pub use fetch::{fetch, MAX_DOCUMENT_BYTES};
pub use fields::{PoolField, RootField, ServerField};
pub use snapshot::{PoolSnapshot, ServerSnapshot, StatsSnapshot};
