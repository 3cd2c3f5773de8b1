//! The exporter: one fetch, decode and projection per scrape.
//!
//! The exporter holds only its endpoint and timeout. Every `collect()`
//! opens its own connection and builds its own snapshot, so concurrent
//! scrapes share nothing but the static descriptor table.

use std::time::Duration;

use tracing::{debug, warn};
use twemproxy_stats::{decode, fetch, StatsSnapshot};

use crate::descriptor::{MetricDesc, DESCRIPTORS, UP};
use crate::error::ScrapeResult;
use crate::observation::{Labels, Observation};
use crate::project::project;

/// Fetch timeout used when none (or zero) is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of one collection cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Whether the stats endpoint could be queried and decoded.
    pub up: bool,
    /// Empty when `up` is false.
    pub observations: Vec<Observation>,
}

impl Collection {
    pub fn up(observations: Vec<Observation>) -> Self {
        Self {
            up: true,
            observations,
        }
    }

    pub fn down() -> Self {
        Self {
            up: false,
            observations: Vec::new(),
        }
    }

    /// The `up` sample, emitted whether or not the scrape succeeded.
    pub fn up_observation(&self) -> Observation {
        Observation::new(&UP, Labels::None, if self.up { 1.0 } else { 0.0 })
    }
}

/// Collects twemproxy stats from one stats endpoint.
#[derive(Debug, Clone)]
pub struct Exporter {
    endpoint: String,
    timeout: Duration,
}

impl Exporter {
    /// Create an exporter for `endpoint` (`host:port`). A zero timeout
    /// falls back to [`DEFAULT_TIMEOUT`].
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// All metric descriptors, independent of any fetch.
    pub fn describe(&self) -> &'static [&'static MetricDesc] {
        &DESCRIPTORS
    }

    /// One fetch and decode round trip.
    pub async fn scrape(&self) -> ScrapeResult<StatsSnapshot> {
        let bytes = fetch(&self.endpoint, self.timeout).await?;
        Ok(decode(&bytes)?)
    }

    /// One full collection cycle. Never fails: any fetch or decode error
    /// yields `up = false` and no observations.
    pub async fn collect(&self) -> Collection {
        match self.scrape().await {
            Ok(snapshot) => {
                let observations = project(&snapshot);
                debug!(
                    endpoint = %self.endpoint,
                    pools = snapshot.pools.len(),
                    servers = snapshot.server_count(),
                    observations = observations.len(),
                    "collected twemproxy stats"
                );
                Collection::up(observations)
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "failed to collect stats");
                Collection::down()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    use super::*;
    use crate::descriptor::Scope;

    const GOOD: &str = r#"{
        "service": "nutcracker", "source": "cache-01", "version": "0.4.1",
        "uptime": 10, "timestamp": 1492553521,
        "total_connections": 67, "curr_connections": 5,
        "proxied": {
            "client_eof": 65, "client_err": 0, "client_connections": 2,
            "server_ejects": 0, "forward_error": 0, "fragments": 0,
            "memcached-1": {
                "server_eof": 0, "server_err": 0, "server_timedout": 0,
                "server_connections": 1, "server_ejected_at": 0,
                "requests": 35, "request_bytes": 1495,
                "responses": 35, "response_bytes": 290,
                "in_queue": 0, "in_queue_bytes": 0,
                "out_queue": 0, "out_queue_bytes": 0
            }
        }
    }"#;

    const MISSING_TOTAL: &str = r#"{
        "service": "nutcracker", "source": "cache-01", "version": "0.4.1",
        "uptime": 10, "timestamp": 1492553521, "curr_connections": 5
    }"#;

    /// Fake stats port answering the n-th connection with `bodies[n % len]`.
    async fn fake_stats_port(bodies: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let served = Arc::new(AtomicUsize::new(0));

        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let n = served.fetch_add(1, Ordering::SeqCst);
                let body = bodies[n % bodies.len()];
                tokio::spawn(async move {
                    let _ = sock.write_all(body.as_bytes()).await;
                });
            }
        });

        addr
    }

    async fn refused_addr() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        addr
    }

    #[test]
    fn zero_timeout_uses_default() {
        let exporter = Exporter::new("localhost:22222", Duration::ZERO);
        assert_eq!(exporter.timeout(), DEFAULT_TIMEOUT);

        let exporter = Exporter::new("localhost:22222", Duration::from_millis(250));
        assert_eq!(exporter.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn describe_is_static() {
        let exporter = Exporter::new("unreachable.invalid:1", Duration::from_secs(1));
        let descs = exporter.describe();
        assert_eq!(descs.len(), 22);
        assert_eq!(descs[0].suffix, "up");
        assert_eq!(descs.iter().filter(|d| d.scope == Scope::Server).count(), 13);
    }

    #[test]
    fn up_observation_reflects_state() {
        assert_eq!(Collection::up(vec![]).up_observation().value, 1.0);
        assert_eq!(Collection::down().up_observation().value, 0.0);
        assert_eq!(Collection::down().up_observation().metric.suffix, "up");
    }

    #[tokio::test]
    async fn collect_success() {
        let exporter = Exporter::new(fake_stats_port(vec![GOOD]).await, Duration::from_secs(2));
        let collection = exporter.collect().await;

        assert!(collection.up);
        assert_eq!(collection.observations.len(), 2 + 6 + 13);
        assert!(collection.observations.iter().any(|o| {
            o.metric.suffix == "server_requests_bytes_total"
                && o.labels == Labels::server("proxied", "memcached-1")
                && o.value == 1495.0
        }));
    }

    #[tokio::test]
    async fn missing_field_is_down() {
        let exporter =
            Exporter::new(fake_stats_port(vec![MISSING_TOTAL]).await, Duration::from_secs(2));

        let err = exporter.scrape().await.unwrap_err();
        assert!(matches!(
            err,
            crate::ScrapeError::Decode(twemproxy_stats::DecodeError::MissingField { ref field, .. })
                if field == "total_connections"
        ));

        let collection = exporter.collect().await;
        assert!(!collection.up);
        assert!(collection.observations.is_empty());
    }

    #[tokio::test]
    async fn refused_connection_is_down() {
        let exporter = Exporter::new(refused_addr().await, Duration::from_secs(2));

        assert!(matches!(
            exporter.scrape().await,
            Err(crate::ScrapeError::Fetch(_))
        ));

        let collection = exporter.collect().await;
        assert_eq!(collection, Collection::down());
    }

    #[tokio::test]
    async fn failure_does_not_carry_over() {
        let addr = fake_stats_port(vec![MISSING_TOTAL, GOOD]).await;
        let exporter = Exporter::new(addr, Duration::from_secs(2));

        assert!(!exporter.collect().await.up);
        assert!(exporter.collect().await.up);
        assert!(!exporter.collect().await.up);
    }

    #[tokio::test]
    async fn concurrent_collects() {
        let exporter = Arc::new(Exporter::new(
            fake_stats_port(vec![GOOD]).await,
            Duration::from_secs(2),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let exporter = Arc::clone(&exporter);
                tokio::spawn(async move { exporter.collect().await })
            })
            .collect();

        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }
        assert!(results.iter().all(|c| c.up));
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
