// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::debug;

/// Multipart uploads and file downloads carry binary payloads that are
/// large and unreadable in logs, so their bodies are passed through
/// untouched instead of being buffered for logging.
fn is_binary_body(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            ct.starts_with("multipart/")
                || ct.starts_with("application/pdf")
                || ct.starts_with("application/octet-stream")
                || ct.starts_with("text/csv")
        })
        .unwrap_or(false)
}

fn log_json_body(label: &str, prefix: &str, suffix: String, bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }
    if let Ok(body_str) = std::str::from_utf8(bytes) {
        let pretty = serde_json::from_str::<serde_json::Value>(body_str)
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
            .unwrap_or_else(|| body_str.to_string());
        debug!(context = %suffix, body = %pretty, "{} {}", prefix, label);
    }
}

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    let request = if is_binary_body(request.headers()) {
        debug!(
            method = %request.method(),
            uri = %request.uri(),
            "📥 Request (binary body omitted)"
        );
        request
    } else {
        let (parts, body) = request.into_parts();
        let bytes = to_bytes(body, usize::MAX)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        log_json_body(
            "Request",
            "📥",
            format!("{} {}", parts.method, parts.uri),
            &bytes,
        );

        Request::from_parts(parts, Body::from(bytes))
    };

    let response = next.run(request).await;

    if is_binary_body(response.headers()) {
        debug!(status = %response.status(), "📤 Response (binary body omitted)");
        return Ok(response);
    }

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    log_json_body("Response", "📤", parts.status.to_string(), &bytes);

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_multipart_bodies_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=x"),
        );
        assert!(is_binary_body(&headers));
    }

    #[test]
    fn test_csv_downloads_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        assert!(is_binary_body(&headers));
    }

    #[test]
    fn test_json_bodies_are_logged() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_binary_body(&headers));
    }
}
