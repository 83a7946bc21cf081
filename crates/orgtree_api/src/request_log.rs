//! Per-request access logging.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs one `event=http_request` line per request and echoes the generated
/// request id in the `x-request-id` response header.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(request).await;

    let status = response.status();
    let duration_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        log::error!(
            "event=http_request module=api status=error request_id={request_id} method={method} path={path} code={} duration_ms={duration_ms}",
            status.as_u16()
        );
    } else {
        log::info!(
            "event=http_request module=api status=ok request_id={request_id} method={method} path={path} code={} duration_ms={duration_ms}",
            status.as_u16()
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
