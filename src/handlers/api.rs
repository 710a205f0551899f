//! Stand-in handlers for the downstream application.
//!
//! The gateway treats the business API as an external collaborator: it only
//! needs canonical paths to resolve to *some* handler after a rewrite. A
//! real deployment replaces this module with its own routes (user store,
//! posts, persistence, uploads); these handlers exist so the gateway is
//! demonstrable and testable end-to-end without any of that.

use axum::Json;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
}

/// `POST /api/v1/auth/register`
pub async fn register(Json(body): Json<RegisterRequest>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({ "id": 1, "username": body.username, "email": body.email })),
    )
}

/// `POST /api/v1/auth/login`
pub async fn login() -> Json<TokenPair> {
    Json(TokenPair {
        access_token: "demo-session-token".to_string(),
        token_type: "bearer".to_string(),
    })
}

/// `POST /api/v1/auth/logout`
pub async fn logout() -> Json<Value> {
    Json(json!({ "detail": "Logged out" }))
}

/// `GET /api/v1/users/me`
pub async fn users_me() -> Json<Value> {
    Json(json!({ "id": 1, "username": "demo", "karma": 0 }))
}

/// `GET /api/v1/posts`
pub async fn list_posts() -> Json<Value> {
    Json(json!({ "posts": [], "total": 0 }))
}

/// `POST /api/v1/posts`
pub async fn create_post(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({ "id": 1, "post": body })),
    )
}

/// `GET /api/v1/comments`
pub async fn list_comments() -> Json<Value> {
    Json(json!({ "comments": [] }))
}

/// `GET /api/v1/reactions`
pub async fn list_reactions() -> Json<Value> {
    Json(json!({ "reactions": [] }))
}
