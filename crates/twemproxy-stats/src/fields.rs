//! Closed sets of fixed fields at each level of the stats document.
//!
//! Every key that is not listed here is the name of a child entity
//! (a pool at the root, a server inside a pool). Server objects have
//! no children, so a key outside [`ServerField`] is an error there.

/// Fixed fields of the stats root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootField {
    Service,
    Source,
    Version,
    Uptime,
    Timestamp,
    TotalConnections,
    CurrConnections,
}

impl RootField {
    pub const ALL: [RootField; 7] = [
        RootField::Service,
        RootField::Source,
        RootField::Version,
        RootField::Uptime,
        RootField::Timestamp,
        RootField::TotalConnections,
        RootField::CurrConnections,
    ];

    /// JSON key as written by the proxy.
    pub fn key(self) -> &'static str {
        match self {
            RootField::Service => "service",
            RootField::Source => "source",
            RootField::Version => "version",
            RootField::Uptime => "uptime",
            RootField::Timestamp => "timestamp",
            RootField::TotalConnections => "total_connections",
            RootField::CurrConnections => "curr_connections",
        }
    }

    /// Whether the field holds a number (the rest are strings).
    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            RootField::Service | RootField::Source | RootField::Version
        )
    }

    pub fn is_fixed_key(key: &str) -> bool {
        Self::ALL.iter().any(|f| f.key() == key)
    }
}

/// Fixed fields of a pool object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolField {
    ClientEof,
    ClientErr,
    ClientConnections,
    ServerEjects,
    ForwardError,
    Fragments,
}

impl PoolField {
    pub const ALL: [PoolField; 6] = [
        PoolField::ClientEof,
        PoolField::ClientErr,
        PoolField::ClientConnections,
        PoolField::ServerEjects,
        PoolField::ForwardError,
        PoolField::Fragments,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PoolField::ClientEof => "client_eof",
            PoolField::ClientErr => "client_err",
            PoolField::ClientConnections => "client_connections",
            PoolField::ServerEjects => "server_ejects",
            PoolField::ForwardError => "forward_error",
            PoolField::Fragments => "fragments",
        }
    }

    pub fn is_fixed_key(key: &str) -> bool {
        Self::ALL.iter().any(|f| f.key() == key)
    }
}

/// Fixed fields of a server object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerField {
    ServerEof,
    ServerErr,
    ServerTimedout,
    ServerConnections,
    ServerEjectedAt,
    Requests,
    RequestBytes,
    Responses,
    ResponseBytes,
    InQueue,
    InQueueBytes,
    OutQueue,
    OutQueueBytes,
}

impl ServerField {
    pub const ALL: [ServerField; 13] = [
        ServerField::ServerEof,
        ServerField::ServerErr,
        ServerField::ServerTimedout,
        ServerField::ServerConnections,
        ServerField::ServerEjectedAt,
        ServerField::Requests,
        ServerField::RequestBytes,
        ServerField::Responses,
        ServerField::ResponseBytes,
        ServerField::InQueue,
        ServerField::InQueueBytes,
        ServerField::OutQueue,
        ServerField::OutQueueBytes,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ServerField::ServerEof => "server_eof",
            ServerField::ServerErr => "server_err",
            ServerField::ServerTimedout => "server_timedout",
            ServerField::ServerConnections => "server_connections",
            ServerField::ServerEjectedAt => "server_ejected_at",
            ServerField::Requests => "requests",
            ServerField::RequestBytes => "request_bytes",
            ServerField::Responses => "responses",
            ServerField::ResponseBytes => "response_bytes",
            ServerField::InQueue => "in_queue",
            ServerField::InQueueBytes => "in_queue_bytes",
            ServerField::OutQueue => "out_queue",
            ServerField::OutQueueBytes => "out_queue_bytes",
        }
    }

    pub fn is_fixed_key(key: &str) -> bool {
        Self::ALL.iter().any(|f| f.key() == key)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn keys_are_unique_per_level() {
        let root: HashSet<_> = RootField::ALL.iter().map(|f| f.key()).collect();
        let pool: HashSet<_> = PoolField::ALL.iter().map(|f| f.key()).collect();
        let server: HashSet<_> = ServerField::ALL.iter().map(|f| f.key()).collect();
        assert_eq!(root.len(), 7);
        assert_eq!(pool.len(), 6);
        assert_eq!(server.len(), 13);
    }

    #[test]
    fn string_fields_are_not_numeric() {
        let numeric: Vec<_> = RootField::ALL
            .iter()
            .filter(|f| f.is_numeric())
            .map(|f| f.key())
            .collect();
        assert_eq!(
            numeric,
            vec!["uptime", "timestamp", "total_connections", "curr_connections"]
        );
    }

    #[test]
    fn fixed_key_membership() {
        assert!(RootField::is_fixed_key("curr_connections"));
        assert!(!RootField::is_fixed_key("proxied"));
        assert!(PoolField::is_fixed_key("fragments"));
        assert!(!PoolField::is_fixed_key("memcached-1"));
        assert!(ServerField::is_fixed_key("out_queue_bytes"));
        assert!(!ServerField::is_fixed_key("client_eof"));
    }
}
