//! Client IP extraction for the auth failure limiter.
//!
//! Trusts `X-Forwarded-For` (first entry) and `X-Real-IP` headers, in that
//! order. These headers are client-controlled: deploy behind a reverse
//! proxy that overwrites them, or the per-IP failure limiting can be
//! sidestepped by rotating spoofed addresses. Requests with no usable
//! header share the `"unknown"` key and are limited collectively.

use std::borrow::Cow;

use axum::http::Request;

/// Fallback key when no client IP can be determined.
pub const UNKNOWN_IP: &str = "unknown";

/// Extract the client IP from forwarding headers.
pub fn extract_client_ip<B>(req: &Request<B>) -> Cow<'static, str> {
    if let Some(value) = req.headers().get("x-forwarded-for")
        && let Ok(raw) = value.to_str()
    {
        // First entry is the originating client; later hops append.
        let first = raw.split(',').next().unwrap_or(raw).trim();
        if !first.is_empty() {
            return Cow::Owned(first.to_string());
        }
    }

    if let Some(value) = req.headers().get("x-real-ip")
        && let Ok(raw) = value.to_str()
    {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Cow::Owned(trimmed.to_string());
        }
    }

    Cow::Borrowed(UNKNOWN_IP)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_extract_from_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "203.0.113.7");
    }

    #[test]
    fn test_extract_from_real_ip() {
        let req = Request::builder()
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "198.51.100.2");
    }

    #[test]
    fn test_forwarded_for_takes_priority() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&req), "203.0.113.7");
    }

    #[test]
    fn test_unknown_fallback() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_client_ip(&req), UNKNOWN_IP);
    }
}
