//! Request logging middleware.
//!
//! One line per request with service, method, path, status and latency.
//! Health checks are not logged.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

pub async fn log_requests(
    State(service): State<&'static str>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if path == "/health" {
        return next.run(request).await;
    }

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    match status {
        500.. => warn!(
            service,
            method = %method,
            path = %path,
            status,
            latency_ms,
            "Request failed (5xx)"
        ),
        400..=499 => info!(
            service,
            method = %method,
            path = %path,
            status,
            latency_ms,
            "Request rejected (4xx)"
        ),
        _ => info!(
            service,
            method = %method,
            path = %path,
            status,
            latency_ms,
            "Request completed"
        ),
    }

    response
}
