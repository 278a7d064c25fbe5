//! Ambient HTTP middleware, carried over from the teacher's
//! `crates/server/src/middleware.rs`. `api_key_auth` and its rate limiter are
//! dropped (see DESIGN.md); `request_id`/`log_requests` need no `ServerState`
//! and are reused as-is.
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Tags the request with an id (from `x-request-id` if present, else a new
/// uuid) so `log_requests` and tool-call tracing spans can correlate.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert("x-request-id", request_id.parse().unwrap());

    response
}

pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let request_id = request
        .extensions()
        .get::<String>()
        .cloned()
        .unwrap_or_default();

    tracing::info!(method = %method, uri = %uri, request_id = %request_id, "request started");

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "request completed"
    );

    response
}
