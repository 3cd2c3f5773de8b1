//! End-to-end regression tests.
//!
//! Runs the full scrape path against a fake twemproxy stats port: the
//! router is driven with `oneshot`, the stats port is a real TCP listener.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tower::ServiceExt;
use twemproxy_api::build_router;
use twemproxy_metrics::{Exporter, CONTENT_TYPE, DESCRIPTORS};

const STATS: &str = include_str!("../../twemproxy-stats/tests/fixtures/nutcracker_stats.json");

/// Serve `body` to every connection, then close.
async fn fake_stats_port(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = sock.write_all(body.as_bytes()).await;
            });
        }
    });

    addr
}

async fn scrape(addr: String, path: &str) -> (StatusCode, Option<String>, String) {
    let exporter = Arc::new(Exporter::new(addr, Duration::from_secs(2)));
    let router = build_router(exporter, "/metrics");

    let response = router
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

fn samples(body: &str) -> Vec<&str> {
    body.lines().filter(|l| !l.starts_with('#')).collect()
}

#[tokio::test]
async fn scrape_fixture() {
    let (status, content_type, body) = scrape(fake_stats_port(STATS).await, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(CONTENT_TYPE));
    assert!(body.contains("twemproxy_exporter_up 1\n"));
    assert!(body.contains("twemproxy_exporter_connections_total 67\n"));
    assert!(body.contains("twemproxy_exporter_current_connections 5\n"));

    // 2 root + 6 per pool * 2 pools + 13 per server * 5 servers, plus up.
    assert_eq!(samples(&body).len(), 79 + 1);
    assert_eq!(body.matches("# TYPE ").count(), DESCRIPTORS.len());
}

#[tokio::test]
async fn scrape_fixture_series() {
    let (_, _, body) = scrape(fake_stats_port(STATS).await, "/metrics").await;

    for line in [
        "twemproxy_exporter_server_requests_bytes_total{pool=\"proxied\",server=\"memcached-1\"} 1495",
        "twemproxy_exporter_server_ejected_at{pool=\"proxied\",server=\"memcached-3\"} 1492553100",
        "twemproxy_exporter_client_eof_total{pool=\"proxied\"} 65",
        "twemproxy_exporter_backend_server_ejections_total{pool=\"sessions\"} 2",
        "twemproxy_exporter_fragments_total{pool=\"sessions\"} 12",
        "twemproxy_exporter_outgoing_queue_bytes{pool=\"sessions\",server=\"redis-a\"} 58",
    ] {
        assert!(body.lines().any(|l| l == line), "missing sample: {line}\n{body}");
    }
}

#[tokio::test]
async fn scrape_unreachable_stats_port() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let (status, _, body) = scrape(addr, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(samples(&body), vec!["twemproxy_exporter_up 0"]);
}

#[tokio::test]
async fn scrape_malformed_stats() {
    let (status, _, body) = scrape(fake_stats_port("{\"service\": ").await, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(samples(&body), vec!["twemproxy_exporter_up 0"]);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let (status, _, _) = scrape(fake_stats_port(STATS).await, "/stats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
