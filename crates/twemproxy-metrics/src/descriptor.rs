//! Static metric descriptor table.
//!
//! Metric identity comes from this table, never from the JSON key text:
//! a key renamed upstream needs a table update here rather than silently
//! producing a new series. The table is built at compile time and shared
//! read-only by every scrape.

use twemproxy_stats::{PoolField, RootField, ServerField};

/// Prefix of every exported metric name.
pub const NAMESPACE: &str = "twemproxy_exporter";

/// Counter or gauge, fixed per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Level a metric is observed at; decides its label dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The exporter itself (`up`).
    Exporter,
    /// Stats root, no labels.
    Root,
    /// Per pool, labelled `pool`.
    Pool,
    /// Per server, labelled `pool` and `server`.
    Server,
}

impl Scope {
    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            Scope::Exporter | Scope::Root => &[],
            Scope::Pool => &["pool"],
            Scope::Server => &["pool", "server"],
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    /// Name without the namespace prefix.
    pub suffix: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub scope: Scope,
}

impl MetricDesc {
    /// Fully qualified metric name.
    pub fn name(&self) -> String {
        format!("{NAMESPACE}_{}", self.suffix)
    }

    pub fn label_names(&self) -> &'static [&'static str] {
        self.scope.label_names()
    }
}

const fn desc(
    suffix: &'static str,
    help: &'static str,
    kind: MetricKind,
    scope: Scope,
) -> MetricDesc {
    MetricDesc {
        suffix,
        help,
        kind,
        scope,
    }
}

use MetricKind::{Counter, Gauge};

pub static UP: MetricDesc = desc("up", "Could twemproxy be queried.", Gauge, Scope::Exporter);

// ── Root ───────────────────────────────────────────────────────

pub static CONNECTIONS_TOTAL: MetricDesc = desc(
    "connections_total",
    "Total number of connections.",
    Counter,
    Scope::Root,
);
pub static CURRENT_CONNECTIONS: MetricDesc = desc(
    "current_connections",
    "The current number of connections.",
    Gauge,
    Scope::Root,
);

// ── Pool ───────────────────────────────────────────────────────

pub static CLIENT_EOF_TOTAL: MetricDesc = desc(
    "client_eof_total",
    "Total number of client EOFs.",
    Counter,
    Scope::Pool,
);
pub static CLIENT_ERR_TOTAL: MetricDesc = desc(
    "client_err_total",
    "Total number of client errors.",
    Counter,
    Scope::Pool,
);
pub static CLIENT_CONNECTIONS_ACTIVE: MetricDesc = desc(
    "client_connections_active",
    "The current number of active client connections.",
    Gauge,
    Scope::Pool,
);
pub static BACKEND_SERVER_EJECTIONS_TOTAL: MetricDesc = desc(
    "backend_server_ejections_total",
    "The number of times a backend server has been ejected.",
    Counter,
    Scope::Pool,
);
pub static FORWARD_ERRORS_TOTAL: MetricDesc = desc(
    "forward_errors_total",
    "Total number of forward errors.",
    Counter,
    Scope::Pool,
);
pub static FRAGMENTS_TOTAL: MetricDesc = desc(
    "fragments_total",
    "Total number of fragments created from multi-vector requests.",
    Counter,
    Scope::Pool,
);

// ── Server ─────────────────────────────────────────────────────

pub static SERVER_EOF_TOTAL: MetricDesc = desc(
    "server_eof_total",
    "Total number of server EOFs.",
    Counter,
    Scope::Server,
);
pub static SERVER_ERR_TOTAL: MetricDesc = desc(
    "server_err_total",
    "Total number of server errors.",
    Counter,
    Scope::Server,
);
pub static SERVER_TIMEOUTS_TOTAL: MetricDesc = desc(
    "server_timeouts_total",
    "Total number of times the server has timed out.",
    Counter,
    Scope::Server,
);
pub static SERVER_CONNECTIONS_ACTIVE: MetricDesc = desc(
    "server_connections_active",
    "The current number of active server connections.",
    Gauge,
    Scope::Server,
);
pub static SERVER_EJECTED_AT: MetricDesc = desc(
    "server_ejected_at",
    "The time the server was last ejected, as reported by twemproxy.",
    Gauge,
    Scope::Server,
);
pub static SERVER_REQUESTS_TOTAL: MetricDesc = desc(
    "server_requests_total",
    "Total number of requests sent to the server.",
    Counter,
    Scope::Server,
);
pub static SERVER_REQUESTS_BYTES_TOTAL: MetricDesc = desc(
    "server_requests_bytes_total",
    "Total number of request bytes sent to the server.",
    Counter,
    Scope::Server,
);
pub static SERVER_RESPONSES_TOTAL: MetricDesc = desc(
    "server_responses_total",
    "Total number of responses received from the server.",
    Counter,
    Scope::Server,
);
pub static SERVER_RESPONSES_BYTES_TOTAL: MetricDesc = desc(
    "server_responses_bytes_total",
    "Total number of response bytes received from the server.",
    Counter,
    Scope::Server,
);
pub static INCOMING_QUEUE: MetricDesc = desc(
    "incoming_queue",
    "The current number of requests in the incoming queue.",
    Gauge,
    Scope::Server,
);
pub static INCOMING_QUEUE_BYTES: MetricDesc = desc(
    "incoming_queue_bytes",
    "The current number of bytes in the incoming queue.",
    Gauge,
    Scope::Server,
);
pub static OUTGOING_QUEUE: MetricDesc = desc(
    "outgoing_queue",
    "The current number of requests in the outgoing queue.",
    Gauge,
    Scope::Server,
);
pub static OUTGOING_QUEUE_BYTES: MetricDesc = desc(
    "outgoing_queue_bytes",
    "The current number of bytes in the outgoing queue.",
    Gauge,
    Scope::Server,
);

/// Every metric the exporter can emit, `up` first.
pub static DESCRIPTORS: [&MetricDesc; 22] = [
    &UP,
    &CONNECTIONS_TOTAL,
    &CURRENT_CONNECTIONS,
    &CLIENT_EOF_TOTAL,
    &CLIENT_ERR_TOTAL,
    &CLIENT_CONNECTIONS_ACTIVE,
    &BACKEND_SERVER_EJECTIONS_TOTAL,
    &FORWARD_ERRORS_TOTAL,
    &FRAGMENTS_TOTAL,
    &SERVER_EOF_TOTAL,
    &SERVER_ERR_TOTAL,
    &SERVER_TIMEOUTS_TOTAL,
    &SERVER_CONNECTIONS_ACTIVE,
    &SERVER_EJECTED_AT,
    &SERVER_REQUESTS_TOTAL,
    &SERVER_REQUESTS_BYTES_TOTAL,
    &SERVER_RESPONSES_TOTAL,
    &SERVER_RESPONSES_BYTES_TOTAL,
    &INCOMING_QUEUE,
    &INCOMING_QUEUE_BYTES,
    &OUTGOING_QUEUE,
    &OUTGOING_QUEUE_BYTES,
];

/// Metric for a root field. Service, source, version, uptime and
/// timestamp are decoded but not exported.
pub fn root_metric(field: RootField) -> Option<&'static MetricDesc> {
    match field {
        RootField::TotalConnections => Some(&CONNECTIONS_TOTAL),
        RootField::CurrConnections => Some(&CURRENT_CONNECTIONS),
        RootField::Service
        | RootField::Source
        | RootField::Version
        | RootField::Uptime
        | RootField::Timestamp => None,
    }
}

pub fn pool_metric(field: PoolField) -> &'static MetricDesc {
    match field {
        PoolField::ClientEof => &CLIENT_EOF_TOTAL,
        PoolField::ClientErr => &CLIENT_ERR_TOTAL,
        PoolField::ClientConnections => &CLIENT_CONNECTIONS_ACTIVE,
        PoolField::ServerEjects => &BACKEND_SERVER_EJECTIONS_TOTAL,
        PoolField::ForwardError => &FORWARD_ERRORS_TOTAL,
        PoolField::Fragments => &FRAGMENTS_TOTAL,
    }
}

pub fn server_metric(field: ServerField) -> &'static MetricDesc {
    match field {
        ServerField::ServerEof => &SERVER_EOF_TOTAL,
        ServerField::ServerErr => &SERVER_ERR_TOTAL,
        ServerField::ServerTimedout => &SERVER_TIMEOUTS_TOTAL,
        ServerField::ServerConnections => &SERVER_CONNECTIONS_ACTIVE,
        ServerField::ServerEjectedAt => &SERVER_EJECTED_AT,
        ServerField::Requests => &SERVER_REQUESTS_TOTAL,
        ServerField::RequestBytes => &SERVER_REQUESTS_BYTES_TOTAL,
        ServerField::Responses => &SERVER_RESPONSES_TOTAL,
        ServerField::ResponseBytes => &SERVER_RESPONSES_BYTES_TOTAL,
        ServerField::InQueue => &INCOMING_QUEUE,
        ServerField::InQueueBytes => &INCOMING_QUEUE_BYTES,
        ServerField::OutQueue => &OUTGOING_QUEUE,
        ServerField::OutQueueBytes => &OUTGOING_QUEUE_BYTES,
    }
}

/// Number of root fields that map to a metric.
pub fn exported_root_fields() -> usize {
    RootField::ALL
        .iter()
        .filter(|f| root_metric(**f).is_some())
        .count()
}
