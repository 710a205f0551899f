//! Mapping exposure endpoints.
//!
//! Legitimate clients discover the obfuscated surface here instead of
//! scraping it: one call returns every canonical endpoint's alias plus a
//! freshly minted freshness token. Consumers are expected to call this once
//! per session, reuse the tokens until they expire, then re-fetch.
//!
//! Both routes live under `/api/v1/system/`, which is a gateway bypass
//! prefix, and are protected by the [`ApiKeyAuth`] layer when an API key is
//! configured.
//!
//! [`ApiKeyAuth`]: crate::middleware::ApiKeyAuth

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, AppResult};
use crate::models::{
    AccessGrant, EndpointMapping, EndpointsResponse, TokenHeaders, TokenResponse, UsageNotes,
};
use crate::registry::OBFUSCATED_PREFIX;
use crate::state::AppState;
use crate::token::{TokenCodec, unix_now};

/// `GET /api/v1/system/endpoints`
///
/// Return the full canonical-to-obfuscated mapping, each entry carrying a
/// token stamped at the same instant.
#[instrument(skip(state))]
pub async fn list_endpoints(State(state): State<AppState>) -> Json<EndpointsResponse> {
    let now = unix_now();

    let endpoints: BTreeMap<String, EndpointMapping> = state
        .registry
        .iter()
        .map(|(canonical, obfuscated)| {
            (
                canonical.to_string(),
                EndpointMapping {
                    obfuscated_url: obfuscated.to_string(),
                    access: access_grant(&state.tokens, obfuscated, now),
                },
            )
        })
        .collect();

    Json(EndpointsResponse {
        message: "Obfuscated endpoint mappings".to_string(),
        endpoints,
        usage_notes: UsageNotes::new(state.tokens.max_age_secs()),
    })
}

/// `GET /api/v1/system/token/{endpoint_hash}`
///
/// Mint a fresh token for one obfuscated endpoint, identified by its hash
/// (the part after `/api/x/`).
///
/// # Errors
///
/// Returns `AppError::UnknownMapping` (404) if the hash is not in the
/// registry.
#[instrument(skip(state))]
pub async fn mint_token(
    State(state): State<AppState>,
    Path(endpoint_hash): Path<String>,
) -> AppResult<Json<TokenResponse>> {
    let obfuscated = format!("{OBFUSCATED_PREFIX}{endpoint_hash}");

    if state.registry.lookup_canonical(&obfuscated).is_none() {
        return Err(AppError::UnknownMapping(obfuscated));
    }

    let grant = access_grant(&state.tokens, &obfuscated, unix_now());

    Ok(Json(TokenResponse {
        endpoint: obfuscated,
        headers: TokenHeaders {
            x_timestamp: grant.timestamp.to_string(),
            x_access_token: grant.token.clone(),
        },
        access: grant,
    }))
}

/// Issue a token for `path` and package it with its validity.
fn access_grant(tokens: &TokenCodec, path: &str, now: i64) -> AccessGrant {
    let issued = tokens.issue(path, now);
    AccessGrant {
        timestamp: issued.timestamp,
        token: issued.token,
        expires_in_secs: tokens.max_age_secs(),
    }
}
