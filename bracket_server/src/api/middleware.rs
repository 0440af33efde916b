//! Per-route request metrics and access logging.
//!
//! Installed with `Router::route_layer` so the [`MatchedPath`] extension is
//! available and metric labels use route templates (`/api/v1/tournaments/{id}`)
//! rather than raw URIs.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use super::request_id::RequestId;
use crate::{logging, metrics};

/// Record request count and latency, then log the completed request.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().to_string();
    let path = match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => request.uri().path().to_string(),
    };
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_string())
        .unwrap_or_default();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();

    metrics::http_requests_total(&method, &path, status);
    metrics::http_request_duration_ms(&method, &path, elapsed.as_secs_f64() * 1000.0);
    logging::log_api_request(&request_id, &method, &path, status, elapsed.as_millis() as u64);

    response
}
