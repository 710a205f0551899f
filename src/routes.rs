//! Application routing configuration with the gateway middleware stack.
//!
//! # Middleware Stack (runtime order)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────────┐
//! │ Obfuscation gateway  │ ← classify/rewrite/block before route matching
//! └─────────┬────────────┘
//!           ▼
//! ┌──────────────────────┐
//! │        CORS          │
//! └─────────┬────────────┘
//!           ▼
//! ┌──────────────────────┐
//! │       Tracing        │ ← HTTP request/response logging
//! └─────────┬────────────┘
//!           ▼
//! ┌──────────────────────┐
//! │   Router / handlers  │ ← system routes additionally behind ApiKeyAuth
//! └──────────────────────┘
//! ```
//!
//! The gateway layer is applied last so it wraps everything and runs first:
//! obfuscated paths must be rewritten before Axum matches a route, and
//! direct canonical hits must be intercepted before they reach a handler.

use axum::Router;
use axum::routing::{get, post};
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers;
use crate::middleware::{ApiKeyAuth, ObfuscationLayer};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let cors = build_cors_layer(&config.cors_allowed_origins);

    // Mapping exposure routes, gated by API key when one is configured.
    let auth = ApiKeyAuth::new(config.api_key.clone());
    let mut system = Router::new()
        .route("/api/v1/system/endpoints", get(handlers::list_endpoints))
        .route(
            "/api/v1/system/token/{endpoint_hash}",
            get(handlers::mint_token),
        );
    if auth.is_enabled() {
        info!("API key protection enabled for mapping exposure endpoints");
        system = system.route_layer(auth);
    } else {
        warn!("mapping exposure endpoints are UNAUTHENTICATED (no API_KEY set)");
    }

    let router = Router::new()
        // Bypass routes
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .merge(system)
        // Canonical business routes. Direct hits never reach these - the
        // gateway intercepts them - so they are only reachable through a
        // rewritten obfuscated request.
        .route("/api/v1/auth/register", post(handlers::api::register))
        .route("/api/v1/auth/login", post(handlers::api::login))
        .route("/api/v1/auth/logout", post(handlers::api::logout))
        .route("/api/v1/users/me", get(handlers::api::users_me))
        .route(
            "/api/v1/posts",
            get(handlers::api::list_posts).post(handlers::api::create_post),
        )
        .route("/api/v1/comments", get(handlers::api::list_comments))
        .route("/api/v1/reactions", get(handlers::api::list_reactions));

    // Applied bottom to top: the obfuscation gateway goes last so it is
    // outermost and sees every request before routing.
    let gateway = ObfuscationLayer::new(
        state.registry.clone(),
        state.tokens.clone(),
        config.bypass_paths.clone(),
        config.require_access_token,
    );
    info!(
        endpoints = state.registry.len(),
        require_token = config.require_access_token,
        "obfuscation gateway configured"
    );

    // `Router::layer` runs middleware after route matching, which is too
    // late for a URI rewrite - wrap the finished router in the gateway and
    // mount the result as a fallback service so the gateway sees every
    // request before any route is matched.
    let inner = router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Router::new().fallback_service(gateway.layer(inner))
}

/// Build CORS layer from configuration.
///
/// Using `*` (any origin) is convenient for development but should be
/// avoided in production.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    if allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cors_layer_any() {
        let origins = vec!["*".to_string()];
        let _layer = build_cors_layer(&origins);
    }

    #[test]
    fn test_build_cors_layer_specific() {
        let origins = vec!["https://app.example.com".to_string()];
        let _layer = build_cors_layer(&origins);
    }
}
