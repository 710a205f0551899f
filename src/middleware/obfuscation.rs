//! The URL obfuscation gateway: classification, rewriting, and blocking.
//!
//! Every inbound request is classified before any route matching happens:
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌─────────────────────┐  "/" (exact), /health, /docs, /openapi.json,
//! │      Bypass?        │──/api/v1/system/... ──────────────► inner router
//! └─────────┬───────────┘
//!           ▼
//! ┌─────────────────────┐  reverse-lookup, optional token check,
//! │  /api/x/... ?       │──rewrite to canonical path ───────► inner router
//! └─────────┬───────────┘        │
//!           │                    └─ 404 unknown alias, 403 bad token,
//!           ▼                       400 malformed timestamp
//! ┌─────────────────────┐
//! │  /api/v1/... ?      │── GET → 301 Location: alias
//! └─────────┬───────────┘   other → 308 + alias in body (no forward)
//!           ▼
//!      Passthrough ─────────────────────────────────────────► inner router
//! ```
//!
//! The layer wraps the whole router so classification runs ahead of the
//! handler chain. One transition per request; no state persists across
//! requests - the mapping table and codec it closes over are immutable.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::Json;
use axum::body::Body;
use axum::http::header::HeaderMap;
use axum::http::uri::Uri;
use axum::http::{Method, Request, Response, StatusCode, header};
use axum::response::IntoResponse;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::{MovedResponse, UseObfuscatedResponse};
use crate::registry::{CANONICAL_PREFIX, EndpointRegistry, OBFUSCATED_PREFIX};
use crate::token::{ACCESS_TOKEN_HEADER, TIMESTAMP_HEADER, TokenCodec, unix_now};

/// Classification of one inbound request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Exempt from the gateway: forwarded unmodified.
    Bypass,
    /// An obfuscated alias: resolved, optionally token-checked, rewritten.
    Obfuscated,
    /// A canonical API path accessed directly: redirected or rejected.
    DirectBlocked,
    /// Not recognized by the obfuscation scheme (static assets and the
    /// like): forwarded unmodified.
    Passthrough,
}

/// Classify a request path against the configured bypass prefixes.
///
/// The root path is matched exactly - matching it as a prefix would bypass
/// every request, since all paths start with `/`.
pub fn classify(path: &str, bypass_paths: &[String]) -> RouteClass {
    if path == "/" || bypass_paths.iter().any(|bp| path.starts_with(bp.as_str())) {
        return RouteClass::Bypass;
    }
    if path.starts_with(OBFUSCATED_PREFIX) {
        return RouteClass::Obfuscated;
    }
    if path.starts_with(CANONICAL_PREFIX) {
        return RouteClass::DirectBlocked;
    }
    RouteClass::Passthrough
}

/// URL obfuscation gateway layer.
///
/// Closes over the immutable registry and token codec; cloning is cheap
/// (`Arc` internals) and the layer is applied outermost on the router.
#[derive(Clone)]
pub struct ObfuscationLayer {
    registry: Arc<EndpointRegistry>,
    tokens: TokenCodec,
    bypass_paths: Arc<Vec<String>>,
    require_token: bool,
}

impl ObfuscationLayer {
    /// Create the gateway layer.
    ///
    /// # Arguments
    ///
    /// * `registry` - mapping table built at startup
    /// * `tokens` - freshness token codec sharing the registry's secret
    /// * `bypass_paths` - prefixes exempt from the gateway
    /// * `require_token` - reject obfuscated requests without freshness
    ///   headers instead of waving them through
    pub fn new(
        registry: Arc<EndpointRegistry>,
        tokens: TokenCodec,
        bypass_paths: Vec<String>,
        require_token: bool,
    ) -> Self {
        Self {
            registry,
            tokens,
            bypass_paths: Arc::new(bypass_paths),
            require_token,
        }
    }
}

impl<S> Layer<S> for ObfuscationLayer {
    type Service = ObfuscationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ObfuscationService {
            inner,
            registry: self.registry.clone(),
            tokens: self.tokens.clone(),
            bypass_paths: self.bypass_paths.clone(),
            require_token: self.require_token,
        }
    }
}

/// Gateway service wrapper around the inner router.
#[derive(Clone)]
pub struct ObfuscationService<S> {
    inner: S,
    registry: Arc<EndpointRegistry>,
    tokens: TokenCodec,
    bypass_paths: Arc<Vec<String>>,
    require_token: bool,
}

impl<S> Service<Request<Body>> for ObfuscationService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let registry = self.registry.clone();
        let tokens = self.tokens.clone();
        let bypass_paths = self.bypass_paths.clone();
        let require_token = self.require_token;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let path = req.uri().path().to_string();

            match classify(&path, &bypass_paths) {
                RouteClass::Bypass | RouteClass::Passthrough => inner.call(req).await,

                RouteClass::Obfuscated => {
                    let canonical = match registry.lookup_canonical(&path) {
                        Some(canonical) => canonical.to_string(),
                        None => {
                            // Server-side diagnostic only. Echoing the known
                            // aliases to the client would hand out the very
                            // mapping this layer exists to hide.
                            debug!(
                                requested = %path,
                                known_aliases = registry.len(),
                                "obfuscated path not in registry"
                            );
                            return Ok(AppError::UnknownMapping(path).into_response());
                        }
                    };

                    if let Err(e) = check_freshness(&tokens, &path, req.headers(), require_token) {
                        warn!(path = %path, error = %e, "freshness check failed");
                        return Ok(e.into_response());
                    }

                    if let Err(e) = rewrite_to_canonical(&mut req, &canonical) {
                        return Ok(e.into_response());
                    }

                    debug!(from = %path, to = %canonical, "rewriting obfuscated request");
                    inner.call(req).await
                }

                RouteClass::DirectBlocked => {
                    Ok(direct_access_response(&registry, req.method(), &path))
                }
            }
        })
    }
}

/// Validate the optional freshness header pair on an obfuscated request.
///
/// Verification is optional-by-omission: when the header pair is absent
/// (or incomplete), the request is allowed through untested unless
/// `require_token` is set. When both headers are present they are fully
/// verified - a bad pair is never silently ignored.
fn check_freshness(
    tokens: &TokenCodec,
    path: &str,
    headers: &HeaderMap,
    require_token: bool,
) -> Result<(), AppError> {
    let timestamp_raw = headers.get(TIMESTAMP_HEADER).and_then(|v| v.to_str().ok());
    let token = headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    match (timestamp_raw, token) {
        (Some(raw), Some(token)) => {
            let timestamp: i64 = raw
                .trim()
                .parse()
                .map_err(|_| AppError::MalformedTimestamp(raw.to_string()))?;

            if tokens.verify(path, token, timestamp, unix_now()) {
                Ok(())
            } else {
                Err(AppError::InvalidToken)
            }
        }
        _ if require_token => Err(AppError::InvalidToken),
        // One header without the other counts as "no check requested".
        _ => Ok(()),
    }
}

/// Rewrite the request's effective path to the canonical endpoint,
/// preserving the query string (method, headers, and body are untouched).
fn rewrite_to_canonical(req: &mut Request<Body>, canonical: &str) -> Result<(), AppError> {
    let path_and_query = match req.uri().query() {
        Some(query) => format!("{canonical}?{query}"),
        None => canonical.to_string(),
    };

    let mut parts = req.uri().clone().into_parts();
    parts.path_and_query = Some(
        path_and_query
            .parse()
            .map_err(|e| AppError::Internal(format!("rewritten path is not a valid URI: {e}")))?,
    );

    *req.uri_mut() = Uri::from_parts(parts)
        .map_err(|e| AppError::Internal(format!("failed to rebuild request URI: {e}")))?;

    Ok(())
}

/// Answer a request that hit a canonical path directly.
///
/// Safe reads get a 301 pointing at the alias. Mutating methods get a 308
/// with the alias in the body instead of an automatic redirect - replaying
/// a mutating request across a redirect must be the client's decision.
fn direct_access_response(
    registry: &EndpointRegistry,
    method: &Method,
    path: &str,
) -> Response<Body> {
    let Some(obfuscated) = registry.lookup_obfuscated(path) else {
        return AppError::UnknownMapping(path.to_string()).into_response();
    };

    debug!(path = %path, method = %method, "blocking direct canonical access");

    if method == Method::GET {
        (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, obfuscated.to_string())],
            Json(MovedResponse {
                detail: "Endpoint moved".to_string(),
                new_url: obfuscated.to_string(),
            }),
        )
            .into_response()
    } else {
        (
            StatusCode::PERMANENT_REDIRECT,
            Json(UseObfuscatedResponse {
                detail: "Use obfuscated endpoint".to_string(),
                obfuscated_url: obfuscated.to_string(),
                hint: "Add X-Timestamp and X-Access-Token headers for enhanced security"
                    .to_string(),
            }),
        )
            .into_response()
    }
}
