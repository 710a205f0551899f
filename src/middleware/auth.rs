//! API key gate for the mapping exposure endpoints.
//!
//! The mapping exposure API hands out the entire obfuscated surface plus
//! fresh tokens, so it is the one place where the gateway itself enforces
//! authentication. The check is a constant-time comparison of the
//! `X-API-Key` header against the configured key, with per-IP rate limiting
//! of failed attempts to slow down brute forcing.
//!
//! Real user authentication (JWT sessions and the like) belongs to the
//! downstream application and runs independently of this layer. When no
//! `API_KEY` is configured the gate is disabled - acceptable in development
//! only, and the router logs a warning in that case.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};
use tracing::warn;

use super::ip::extract_client_ip;
use crate::error::AppError;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Failed attempts per IP per minute before further attempts are blocked.
const AUTH_FAILURE_LIMIT: NonZeroU32 = NonZeroU32::new(10).unwrap();

/// Burst allowance for the failure limiter.
const AUTH_FAILURE_BURST: NonZeroU32 = NonZeroU32::new(5).unwrap();

type AuthFailureLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// API key authentication layer for the system route group.
///
/// When the expected key is `None`, all requests are allowed (auth
/// disabled). Apply via `route_layer` so only the protected routes pay for
/// the check.
#[derive(Clone)]
pub struct ApiKeyAuth {
    expected_key: Option<Arc<String>>,
    failure_limiter: Option<Arc<AuthFailureLimiter>>,
}

impl ApiKeyAuth {
    /// Create the auth layer from an optional expected key.
    pub fn new(api_key: Option<String>) -> Self {
        // The failure limiter only exists when there is a key to brute force.
        let failure_limiter = api_key.is_some().then(|| {
            let quota = Quota::per_minute(AUTH_FAILURE_LIMIT).allow_burst(AUTH_FAILURE_BURST);
            Arc::new(RateLimiter::keyed(quota))
        });

        Self {
            expected_key: api_key.map(Arc::new),
            failure_limiter,
        }
    }

    /// Check if authentication is enabled.
    pub fn is_enabled(&self) -> bool {
        self.expected_key.is_some()
    }
}

impl<S> Layer<S> for ApiKeyAuth {
    type Service = ApiKeyAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyAuthService {
            inner,
            expected_key: self.expected_key.clone(),
            failure_limiter: self.failure_limiter.clone(),
        }
    }
}

/// API key authentication service wrapper.
#[derive(Clone)]
pub struct ApiKeyAuthService<S> {
    inner: S,
    expected_key: Option<Arc<String>>,
    failure_limiter: Option<Arc<AuthFailureLimiter>>,
}

impl<S> Service<Request<Body>> for ApiKeyAuthService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let expected_key = self.expected_key.clone();
        let failure_limiter = self.failure_limiter.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let expected = match expected_key {
                Some(key) => key,
                None => return inner.call(req).await,
            };

            let client_ip = extract_client_ip(&req).into_owned();

            // Too many recent failures from this IP: refuse before even
            // looking at the presented key.
            if let Some(ref limiter) = failure_limiter
                && limiter.check_key(&client_ip).is_err()
            {
                warn!(client_ip = %client_ip, "blocking request after repeated auth failures");
                return Ok(too_many_attempts_response());
            }

            // Owned copy so the request can move into the inner service.
            let provided = req
                .headers()
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            match provided {
                Some(key) if constant_time_eq(&key, &expected) => inner.call(req).await,
                Some(_) => {
                    record_failure(&failure_limiter, &client_ip);
                    warn!(
                        path = %req.uri().path(),
                        client_ip = %client_ip,
                        "invalid API key on mapping exposure endpoint"
                    );
                    Ok(AppError::Unauthorized("invalid API key".to_string()).into_response())
                }
                None => {
                    record_failure(&failure_limiter, &client_ip);
                    Ok(AppError::Unauthorized("API key required".to_string()).into_response())
                }
            }
        })
    }
}

/// Consume one failure token for this IP.
fn record_failure(limiter: &Option<Arc<AuthFailureLimiter>>, client_ip: &str) {
    if let Some(limiter) = limiter {
        let _ = limiter.check_key(&client_ip.to_string());
    }
}

/// Constant-time string comparison via the subtle crate.
///
/// Prevents timing attacks that probe the expected key byte by byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Build a 429 response for IPs with too many auth failures.
fn too_many_attempts_response() -> Response<Body> {
    (
        axum::http::StatusCode::TOO_MANY_REQUESTS,
        [
            ("Retry-After", "60"),
            ("Content-Type", "application/json"),
        ],
        r#"{"error":"too_many_requests","message":"Too many failed authentication attempts. Please wait before retrying."}"#,
    )
        .into_response()
}
