// rate_limit_middleware.rs
use crate::services::rate_limit::{RateLimitResult, RateLimitService};
use axum::{
    extract::{ConnectInfo, Extension, Request},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

#[derive(Serialize)]
struct RateLimitErrorResponse {
    error: String,
    code: String,
    retry_after: u32,
}

/// Routes that fan out to the LLM provider get the tighter AI budget.
fn is_ai_route(path: &str) -> bool {
    path.starts_with("/api/mentor")
        || path.ends_with("/extract")
        || path.ends_with("/review")
}

/// Extract IP address from request
fn extract_ip_address(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    // X-Forwarded-For first (proxied requests), first hop in the chain
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    connect_info.map(|info| info.0.ip().to_string())
}

/// Extract a stable identifier from the bearer token, falling back to IP.
/// The token is not decoded here; a prefix is enough to bucket requests.
fn extract_identifier(headers: &HeaderMap, ip_address: Option<&str>) -> String {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| format!("token:{}", &token[..token.len().min(20)]))
        .or_else(|| ip_address.map(|ip| format!("anon:{}", ip)))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    Extension(rate_limit_service): Extension<Arc<RateLimitService>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let headers = request.headers().clone();
    let ip_address = extract_ip_address(&headers, connect_info.as_ref());
    let identifier = extract_identifier(&headers, ip_address.as_deref());
    let path = request.uri().path().to_string();
    let ai_route = is_ai_route(&path);

    match rate_limit_service
        .check_rate_limit(&identifier, ai_route)
        .await
    {
        RateLimitResult::Allowed => {
            debug!(identifier = %identifier, path = %path, "Request within rate limit");
            Ok(next.run(request).await)
        }
        RateLimitResult::Limited { retry_after } => {
            let body = RateLimitErrorResponse {
                error: "Too many requests. Please try again later.".to_string(),
                code: "RATE_LIMITED".to_string(),
                retry_after,
            };

            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("retry-after", value);
            }
            Err(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_route_detection() {
        assert!(is_ai_route("/api/mentor/chat"));
        assert!(is_ai_route("/api/documents/D_ABC123/extract"));
        assert!(is_ai_route("/api/documents/D_ABC123/review"));
        assert!(!is_ai_route("/api/applications"));
        assert!(!is_ai_route("/api/profile"));
    }
}
