//! twemproxy-metrics — republishes twemproxy stats as labelled metrics.
//!
//! Each scrape fetches one stats document, decodes it into a
//! [`twemproxy_stats::StatsSnapshot`], and projects it onto a static
//! descriptor table. Failures never escape a scrape; they show up as
//! `twemproxy_exporter_up 0`.
//!
//! # Architecture
//!
//! ```text
//! Exporter
//!   ├── describe() → static descriptor table (22 metrics)
//!   ├── scrape()   → fetch + decode → StatsSnapshot
//!   └── collect()  → Collection { up, observations }
//!
//! project(StatsSnapshot) → Vec<Observation>
//!   root   → no labels
//!   pool   → {pool}
//!   server → {pool, server}
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for the telemetry endpoint
//! ```

pub mod descriptor;
pub mod error;
pub mod exporter;
pub mod observation;
pub mod project;
pub mod prometheus;

pub use descriptor::{MetricDesc, MetricKind, Scope, DESCRIPTORS, NAMESPACE};
pub use error::{ScrapeError, ScrapeResult};
pub use exporter::{Collection, Exporter, DEFAULT_TIMEOUT};
pub use observation::{Labels, Observation};
pub use project::{observation_count, project};
pub use prometheus::{render_prometheus, CONTENT_TYPE};
