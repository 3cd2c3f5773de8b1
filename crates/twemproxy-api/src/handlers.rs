//! HTTP handlers.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use tracing::debug;
use twemproxy_metrics::{render_prometheus, CONTENT_TYPE};

use crate::ApiState;

/// GET <telemetry path>
///
/// Runs one collection cycle. Always 200: a failed scrape is reported
/// through `twemproxy_exporter_up 0`, not through the HTTP status.
pub async fn metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let collection = state.exporter.collect().await;
    debug!(up = collection.up, samples = collection.observations.len(), "scrape served");

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        render_prometheus(&collection),
    )
}

/// GET /
pub async fn landing_page(State(state): State<ApiState>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>twemproxy exporter</title></head>\n\
         <body>\n\
         <h1>twemproxy exporter</h1>\n\
         <p>Stats endpoint: {endpoint}</p>\n\
         <p><a href=\"{path}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        endpoint = state.exporter.endpoint(),
        path = state.telemetry_path,
    ))
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
