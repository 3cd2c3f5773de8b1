//! twemproxy-api — HTTP surface of the exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Landing page linking to the telemetry path |
//! | GET | `<telemetry path>` | Prometheus exposition (default `/metrics`) |
//! | GET | `/healthz` | Exporter liveness, no upstream I/O |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use twemproxy_metrics::Exporter;

/// Shared state for handlers.
#[derive(Clone)]
pub struct ApiState {
    pub exporter: Arc<Exporter>,
    pub telemetry_path: String,
}

/// Build the exporter router.
pub fn build_router(exporter: Arc<Exporter>, telemetry_path: &str) -> Router {
    let state = ApiState {
        exporter,
        telemetry_path: telemetry_path.to_string(),
    };

    Router::new()
        .route("/", get(handlers::landing_page))
        .route("/healthz", get(handlers::healthz))
        .route(telemetry_path, get(handlers::metrics))
        .with_state(state)
}
