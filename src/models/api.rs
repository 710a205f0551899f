use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Root welcome message.
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// A freshly minted token plus its validity, as handed to clients.
#[derive(Debug, Serialize)]
pub struct AccessGrant {
    /// Unix seconds at issuance; echo back via `X-Timestamp`.
    pub timestamp: i64,
    /// Token digest; echo back via `X-Access-Token`.
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in_secs: i64,
}

/// One canonical endpoint's obfuscated alias and a token for it.
#[derive(Debug, Serialize)]
pub struct EndpointMapping {
    pub obfuscated_url: String,
    pub access: AccessGrant,
}

/// Hints returned alongside the mapping so clients know how to use it.
#[derive(Debug, Serialize)]
pub struct UsageNotes {
    pub security_headers: String,
    pub token_validity: String,
    pub direct_access: String,
}

impl UsageNotes {
    pub fn new(token_max_age_secs: i64) -> Self {
        Self {
            security_headers: "Include X-Timestamp and X-Access-Token for enhanced security"
                .to_string(),
            token_validity: format!("Access tokens are valid for {token_max_age_secs} seconds"),
            direct_access: "Direct API calls to /api/v1/* will be redirected or blocked"
                .to_string(),
        }
    }
}

/// Full mapping exposure response: every canonical endpoint with its alias
/// and a fresh token. Consumers fetch this once per session and re-fetch
/// when tokens expire.
#[derive(Debug, Serialize)]
pub struct EndpointsResponse {
    pub message: String,
    pub endpoints: BTreeMap<String, EndpointMapping>,
    pub usage_notes: UsageNotes,
}

/// The exact header values a client should attach to its next request.
#[derive(Debug, Serialize)]
pub struct TokenHeaders {
    #[serde(rename = "X-Timestamp")]
    pub x_timestamp: String,
    #[serde(rename = "X-Access-Token")]
    pub x_access_token: String,
}

/// Response for a single freshly minted token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub endpoint: String,
    pub access: AccessGrant,
    pub headers: TokenHeaders,
}

/// Body of the 301 answer to a direct GET on a canonical path.
#[derive(Debug, Serialize)]
pub struct MovedResponse {
    pub detail: String,
    pub new_url: String,
}

/// Body of the 308 answer to a direct non-GET on a canonical path.
///
/// Deliberately not an automatic redirect: silently replaying a mutating
/// request across a redirect is unsafe, so the client is told where to go
/// and must re-issue the request itself.
#[derive(Debug, Serialize)]
pub struct UseObfuscatedResponse {
    pub detail: String,
    pub obfuscated_url: String,
    pub hint: String,
}
