//! Typed snapshot of one stats document.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::fields::{PoolField, RootField, ServerField};

/// One decoded stats document. Built fresh per fetch, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub service: String,
    pub source: String,
    pub version: String,
    /// Seconds since the proxy started.
    pub uptime: f64,
    /// Unix time the sample was taken.
    pub timestamp: f64,
    pub total_connections: f64,
    pub curr_connections: f64,
    /// Pool name → pool stats.
    pub pools: BTreeMap<String, PoolSnapshot>,
}

impl StatsSnapshot {
    /// Numeric value of a root field, `None` for the string fields.
    pub fn value(&self, field: RootField) -> Option<f64> {
        match field {
            RootField::Service | RootField::Source | RootField::Version => None,
            RootField::Uptime => Some(self.uptime),
            RootField::Timestamp => Some(self.timestamp),
            RootField::TotalConnections => Some(self.total_connections),
            RootField::CurrConnections => Some(self.curr_connections),
        }
    }

    /// Total number of servers across all pools.
    pub fn server_count(&self) -> usize {
        self.pools.values().map(|p| p.servers.len()).sum()
    }
}

/// Aggregate client-facing counters of one pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSnapshot {
    pub client_eof: f64,
    pub client_err: f64,
    pub client_connections: f64,
    pub server_ejects: f64,
    pub forward_error: f64,
    /// Fragments created from multi-vector requests.
    pub fragments: f64,
    /// Server name → server stats.
    pub servers: BTreeMap<String, ServerSnapshot>,
}

impl PoolSnapshot {
    pub fn value(&self, field: PoolField) -> f64 {
        match field {
            PoolField::ClientEof => self.client_eof,
            PoolField::ClientErr => self.client_err,
            PoolField::ClientConnections => self.client_connections,
            PoolField::ServerEjects => self.server_ejects,
            PoolField::ForwardError => self.forward_error,
            PoolField::Fragments => self.fragments,
        }
    }
}

/// Connection and queue counters of one backend server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerSnapshot {
    pub server_eof: f64,
    pub server_err: f64,
    pub server_timedout: f64,
    pub server_connections: f64,
    /// Time the server was last ejected, as reported upstream (units unconfirmed).
    pub server_ejected_at: f64,
    pub requests: f64,
    pub request_bytes: f64,
    pub responses: f64,
    pub response_bytes: f64,
    pub in_queue: f64,
    pub in_queue_bytes: f64,
    pub out_queue: f64,
    pub out_queue_bytes: f64,
}

impl ServerSnapshot {
    pub fn value(&self, field: ServerField) -> f64 {
        match field {
            ServerField::ServerEof => self.server_eof,
            ServerField::ServerErr => self.server_err,
            ServerField::ServerTimedout => self.server_timedout,
            ServerField::ServerConnections => self.server_connections,
            ServerField::ServerEjectedAt => self.server_ejected_at,
            ServerField::Requests => self.requests,
            ServerField::RequestBytes => self.request_bytes,
            ServerField::Responses => self.responses,
            ServerField::ResponseBytes => self.response_bytes,
            ServerField::InQueue => self.in_queue,
            ServerField::InQueueBytes => self.in_queue_bytes,
            ServerField::OutQueue => self.out_queue,
            ServerField::OutQueueBytes => self.out_queue_bytes,
        }
    }
}
