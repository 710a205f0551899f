//! End-to-end tests for the obfuscation gateway.
//!
//! These drive the full router (gateway layer included) in-process via
//! `tower::ServiceExt::oneshot` - no sockets, no containers.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use pathveil::{AppState, Config, build_router};

const SECRET: &str = "2a7af6a1f754ab24d54eee4de0c4be9bd6f50685ea6f566c";
const API_KEY: &str = "test-ops-key";

fn test_config() -> Config {
    Config {
        secret_key: SECRET.to_string(),
        ..Config::default()
    }
}

fn test_state(config: Config) -> AppState {
    AppState::new(config).expect("test config must be valid")
}

fn app(config: Config) -> (Router, AppState) {
    let state = test_state(config);
    (build_router(state.clone()), state)
}

async fn send(router: &Router, req: Request<Body>) -> axum::response::Response {
    router.clone().oneshot(req).await.unwrap()
}

async fn get(router: &Router, path: &str) -> axum::response::Response {
    send(
        router,
        Request::builder().uri(path).body(Body::empty()).unwrap(),
    )
    .await
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Bypass and passthrough
// =============================================================================

#[tokio::test]
async fn health_is_bypassed() {
    let (router, _) = app(test_config());
    let response = get(&router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn root_is_bypassed() {
    let (router, _) = app(test_config());
    assert_eq!(get(&router, "/").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn unrelated_paths_pass_through_untouched() {
    let (router, _) = app(test_config());
    let response = get(&router, "/static/logo.png").await;

    // The gateway must not answer for routes outside its scheme; the
    // router's own 404 (empty body) proves the request passed through.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

// =============================================================================
// Obfuscated dispatch
// =============================================================================

#[tokio::test]
async fn obfuscated_request_reaches_canonical_handler() {
    let (router, state) = app(test_config());
    let obfuscated = state
        .registry
        .lookup_obfuscated("/api/v1/users/me")
        .unwrap()
        .to_string();

    let response = get(&router, &obfuscated).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["username"], "demo");
}

#[tokio::test]
async fn obfuscated_post_preserves_method_and_body() {
    let (router, state) = app(test_config());
    let obfuscated = state
        .registry
        .lookup_obfuscated("/api/v1/posts")
        .unwrap()
        .to_string();

    let request = Request::builder()
        .method("POST")
        .uri(&obfuscated)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"title":"hello"}"#))
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["post"]["title"], "hello");
}

#[tokio::test]
async fn unknown_obfuscated_path_is_404_without_leaking_mappings() {
    let (router, state) = app(test_config());
    let response = get(&router, "/api/x/000000000000").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    // The error body must not echo any known alias.
    for (_, obfuscated) in state.registry.iter() {
        assert!(!text.contains(obfuscated), "404 body leaked {obfuscated}");
    }
}

// =============================================================================
// Freshness tokens
// =============================================================================

#[tokio::test]
async fn valid_token_is_accepted() {
    let (router, state) = app(test_config());
    let obfuscated = state
        .registry
        .lookup_obfuscated("/api/v1/users/me")
        .unwrap()
        .to_string();
    let issued = state.tokens.issue_now(&obfuscated);

    let request = Request::builder()
        .uri(&obfuscated)
        .header("X-Timestamp", issued.timestamp.to_string())
        .header("X-Access-Token", &issued.token)
        .body(Body::empty())
        .unwrap();

    assert_eq!(send(&router, request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_token_is_403() {
    let (router, state) = app(test_config());
    let obfuscated = state
        .registry
        .lookup_obfuscated("/api/v1/users/me")
        .unwrap()
        .to_string();

    // Stamped beyond the validity window.
    let stale = pathveil::token::unix_now() - 301;
    let issued = state.tokens.issue(&obfuscated, stale);

    let request = Request::builder()
        .uri(&obfuscated)
        .header("X-Timestamp", issued.timestamp.to_string())
        .header("X-Access-Token", &issued.token)
        .body(Body::empty())
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn wrong_path_token_is_403() {
    let (router, state) = app(test_config());
    let users_me = state
        .registry
        .lookup_obfuscated("/api/v1/users/me")
        .unwrap()
        .to_string();
    let posts = state
        .registry
        .lookup_obfuscated("/api/v1/posts")
        .unwrap()
        .to_string();
    let issued = state.tokens.issue_now(&posts);

    let request = Request::builder()
        .uri(&users_me)
        .header("X-Timestamp", issued.timestamp.to_string())
        .header("X-Access-Token", &issued.token)
        .body(Body::empty())
        .unwrap();

    assert_eq!(send(&router, request).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_timestamp_is_400() {
    let (router, state) = app(test_config());
    let obfuscated = state
        .registry
        .lookup_obfuscated("/api/v1/users/me")
        .unwrap()
        .to_string();

    let request = Request::builder()
        .uri(&obfuscated)
        .header("X-Timestamp", "yesterday")
        .header("X-Access-Token", "0123456789abcdef")
        .body(Body::empty())
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_timestamp");
}

#[tokio::test]
async fn missing_token_headers_are_allowed_by_default() {
    let (router, state) = app(test_config());
    let obfuscated = state
        .registry
        .lookup_obfuscated("/api/v1/posts")
        .unwrap()
        .to_string();

    assert_eq!(get(&router, &obfuscated).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_token_headers_rejected_when_required() {
    let config = Config {
        require_access_token: true,
        ..test_config()
    };
    let (router, state) = app(config);
    let obfuscated = state
        .registry
        .lookup_obfuscated("/api/v1/posts")
        .unwrap()
        .to_string();

    assert_eq!(
        get(&router, &obfuscated).await.status(),
        StatusCode::FORBIDDEN
    );
}

// =============================================================================
// Direct-access policy
// =============================================================================

#[tokio::test]
async fn direct_get_redirects_to_obfuscated() {
    let (router, state) = app(test_config());
    let expected = state
        .registry
        .lookup_obfuscated("/api/v1/posts")
        .unwrap()
        .to_string();

    let response = get(&router, "/api/v1/posts").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap(),
        expected
    );

    let body = body_json(response).await;
    assert_eq!(body["new_url"], expected);
}

#[tokio::test]
async fn direct_post_is_rejected_not_forwarded() {
    let (router, state) = app(test_config());
    let expected = state
        .registry
        .lookup_obfuscated("/api/v1/posts")
        .unwrap()
        .to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/posts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"title":"should never land"}"#))
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert!(response.headers().get(header::LOCATION).is_none());

    // The body is the policy's hint, not the handler's 201 - proof the
    // request never reached the handler chain.
    let body = body_json(response).await;
    assert_eq!(body["obfuscated_url"], expected);
    assert!(body["hint"].as_str().unwrap().contains("X-Timestamp"));
}

#[tokio::test]
async fn direct_access_to_unmapped_canonical_is_404() {
    let (router, _) = app(test_config());
    assert_eq!(
        get(&router, "/api/v1/admin/secrets").await.status(),
        StatusCode::NOT_FOUND
    );
}

// =============================================================================
// Mapping exposure API
// =============================================================================

#[tokio::test]
async fn system_endpoints_require_api_key_when_configured() {
    let config = Config {
        api_key: Some(API_KEY.to_string()),
        ..test_config()
    };
    let (router, _) = app(config);

    let response = get(&router, "/api/v1/system/endpoints").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn system_endpoints_return_full_mapping_with_tokens() {
    let config = Config {
        api_key: Some(API_KEY.to_string()),
        ..test_config()
    };
    let (router, state) = app(config);

    let request = Request::builder()
        .uri("/api/v1/system/endpoints")
        .header("X-API-Key", API_KEY)
        .body(Body::empty())
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let endpoints = body["endpoints"].as_object().unwrap();
    assert_eq!(endpoints.len(), state.registry.len());

    // Every entry's alias matches the registry and its token verifies.
    for (canonical, entry) in endpoints {
        let expected = state.registry.lookup_obfuscated(canonical).unwrap();
        assert_eq!(entry["obfuscated_url"], expected);

        let timestamp = entry["access"]["timestamp"].as_i64().unwrap();
        let token = entry["access"]["token"].as_str().unwrap();
        assert!(state.tokens.verify(expected, token, timestamp, timestamp));
        assert_eq!(entry["access"]["expires_in_secs"], 300);
    }
}

#[tokio::test]
async fn token_mint_endpoint_issues_verifiable_token() {
    let (router, state) = app(test_config());
    let obfuscated = state
        .registry
        .lookup_obfuscated("/api/v1/users/me")
        .unwrap()
        .to_string();
    let hash = obfuscated.strip_prefix("/api/x/").unwrap();

    let response = get(&router, &format!("/api/v1/system/token/{hash}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["endpoint"], obfuscated);

    let timestamp: i64 = body["headers"]["X-Timestamp"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let token = body["headers"]["X-Access-Token"].as_str().unwrap();
    assert!(state.tokens.verify(&obfuscated, token, timestamp, timestamp));
}

#[tokio::test]
async fn token_mint_for_unknown_hash_is_404() {
    let (router, _) = app(test_config());
    assert_eq!(
        get(&router, "/api/v1/system/token/000000000000")
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

// =============================================================================
// Determinism across router instances
// =============================================================================

#[tokio::test]
async fn same_secret_yields_same_surface_across_processes() {
    let (_, state_a) = app(test_config());
    let (router_b, state_b) = app(test_config());

    // A client that learned the mapping from one instance can use it
    // against another built from the same secret.
    for (canonical, obfuscated) in state_a.registry.iter() {
        assert_eq!(state_b.registry.lookup_canonical(obfuscated), Some(canonical));
    }

    let alias = state_a
        .registry
        .lookup_obfuscated("/api/v1/users/me")
        .unwrap()
        .to_string();
    assert_eq!(get(&router_b, &alias).await.status(), StatusCode::OK);
}
