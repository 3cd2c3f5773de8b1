//! Projection of a decoded snapshot onto the descriptor table.

use twemproxy_stats::{PoolField, RootField, ServerField, StatsSnapshot};

use crate::descriptor::{exported_root_fields, pool_metric, root_metric, server_metric};
use crate::observation::{Labels, Observation};

/// Flatten a snapshot into observations.
///
/// Emits the exported root fields once, every pool field once per pool
/// and every server field once per server. Pure: the same snapshot always
/// yields the same observations in the same order.
pub fn project(snapshot: &StatsSnapshot) -> Vec<Observation> {
    let mut out = Vec::with_capacity(observation_count(snapshot));

    for field in RootField::ALL {
        if let (Some(metric), Some(value)) = (root_metric(field), snapshot.value(field)) {
            out.push(Observation::new(metric, Labels::None, value));
        }
    }

    for (pool_name, pool) in &snapshot.pools {
        for field in PoolField::ALL {
            out.push(Observation::new(
                pool_metric(field),
                Labels::pool(pool_name),
                pool.value(field),
            ));
        }

        for (server_name, server) in &pool.servers {
            for field in ServerField::ALL {
                out.push(Observation::new(
                    server_metric(field),
                    Labels::server(pool_name, server_name),
                    server.value(field),
                ));
            }
        }
    }

    out
}

/// Number of observations [`project`] yields for `snapshot`.
pub fn observation_count(snapshot: &StatsSnapshot) -> usize {
    exported_root_fields()
        + PoolField::ALL.len() * snapshot.pools.len()
        + ServerField::ALL.len() * snapshot.server_count()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::{json, Value};
    use twemproxy_stats::decode_value;

    use super::*;
    use crate::descriptor::{Scope, BACKEND_SERVER_EJECTIONS_TOTAL, SERVER_REQUESTS_BYTES_TOTAL};

    fn server(request_bytes: u64) -> Value {
        json!({
            "server_eof": 0, "server_err": 0, "server_timedout": 0,
            "server_connections": 1, "server_ejected_at": 0,
            "requests": 35, "request_bytes": request_bytes,
            "responses": 35, "response_bytes": 290,
            "in_queue": 0, "in_queue_bytes": 0, "out_queue": 0, "out_queue_bytes": 0
        })
    }

    fn pool(servers: &[(&str, u64)]) -> Value {
        let mut p = json!({
            "client_eof": 65, "client_err": 1, "client_connections": 2,
            "server_ejects": 7, "forward_error": 0, "fragments": 3
        });
        for (name, bytes) in servers {
            p[*name] = server(*bytes);
        }
        p
    }

    fn snapshot(pools: &[(&str, Value)]) -> StatsSnapshot {
        let mut doc = json!({
            "service": "nutcracker", "source": "cache-01", "version": "0.4.1",
            "uptime": 1523, "timestamp": 1492553521,
            "total_connections": 67, "curr_connections": 5
        });
        for (name, p) in pools {
            doc[*name] = p.clone();
        }
        decode_value(doc).unwrap()
    }

    #[test]
    fn pool_without_servers() {
        let snap = snapshot(&[("proxied", pool(&[]))]);
        let obs = project(&snap);

        assert_eq!(obs.len(), 2 + 6);
        assert_eq!(obs.len(), observation_count(&snap));
        assert!(obs.iter().all(|o| o.metric.scope != Scope::Server));
        assert_eq!(
            obs.iter().filter(|o| o.metric.scope == Scope::Pool).count(),
            6
        );
    }

    #[test]
    fn server_request_bytes_appear_once() {
        let snap = snapshot(&[(
            "proxied",
            pool(&[("memcached-1", 1495), ("memcached-2", 10)]),
        )]);
        let obs = project(&snap);

        let matching: Vec<_> = obs
            .iter()
            .filter(|o| {
                o.metric == &SERVER_REQUESTS_BYTES_TOTAL
                    && o.labels == Labels::server("proxied", "memcached-1")
            })
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].value, 1495.0);
    }

    #[test]
    fn count_formula_holds() {
        let snap = snapshot(&[
            ("a", pool(&[("a1", 1), ("a2", 2), ("a3", 3)])),
            ("b", pool(&[("b1", 1)])),
            ("c", pool(&[])),
        ]);
        let obs = project(&snap);
        assert_eq!(obs.len(), 2 + 6 * 3 + 13 * 4);
        assert_eq!(obs.len(), observation_count(&snap));
    }

    #[test]
    fn labels_follow_scope() {
        let snap = snapshot(&[("proxied", pool(&[("m1", 1)]))]);
        for o in project(&snap) {
            match o.metric.scope {
                Scope::Root => assert_eq!(o.labels, Labels::None),
                Scope::Pool => assert_eq!(o.labels, Labels::pool("proxied")),
                Scope::Server => assert_eq!(o.labels, Labels::server("proxied", "m1")),
                Scope::Exporter => panic!("up is not projected"),
            }
        }
    }

    #[test]
    fn series_are_unique() {
        let snap = snapshot(&[
            ("a", pool(&[("shared-name", 1)])),
            ("b", pool(&[("shared-name", 2)])),
        ]);
        let obs = project(&snap);
        let series: HashSet<(String, Labels)> = obs
            .iter()
            .map(|o| (o.metric.name(), o.labels.clone()))
            .collect();
        assert_eq!(series.len(), obs.len());
    }

    #[test]
    fn projection_is_idempotent() {
        let snap = snapshot(&[
            ("a", pool(&[("a1", 1), ("a2", 2)])),
            ("b", pool(&[("b1", 5)])),
        ]);
        assert_eq!(project(&snap), project(&snap));
    }

    #[test]
    fn ejections_read_server_ejects() {
        let snap = snapshot(&[("proxied", pool(&[]))]);
        let obs = project(&snap);
        let ejections = obs
            .iter()
            .find(|o| o.metric == &BACKEND_SERVER_EJECTIONS_TOTAL)
            .unwrap();
        assert_eq!(ejections.value, 7.0);
    }

    #[test]
    fn root_values() {
        let snap = snapshot(&[]);
        let obs = project(&snap);
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].metric.suffix, "connections_total");
        assert_eq!(obs[0].value, 67.0);
        assert_eq!(obs[1].metric.suffix, "current_connections");
        assert_eq!(obs[1].value, 5.0);
    }
}
