//! Deterministic endpoint-to-obfuscated-path mapping.
//!
//! At startup the registry derives, for every canonical endpoint, an opaque
//! alias of the form `/api/x/<12 hex chars>` via an HMAC keyed with the
//! shared secret. The forward map (canonical -> obfuscated) and its reverse
//! are built together, checked for truncation collisions, and are immutable
//! from then on - handlers share the registry behind an `Arc` and read it
//! concurrently without locking.
//!
//! Absence of a mapping is a normal outcome, not an error: the caller
//! decides whether a miss means 404, passthrough, or something else.

use std::collections::BTreeMap;

use hmac::Mac;

use crate::error::{AppError, AppResult};
use crate::token::keyed_mac;

/// Namespace prefix for obfuscated aliases.
pub const OBFUSCATED_PREFIX: &str = "/api/x/";

/// Namespace prefix for the real API, subject to direct-access blocking.
pub const CANONICAL_PREFIX: &str = "/api/v1/";

/// Length of the hex-encoded path hash (48 bits).
pub const PATH_HASH_HEX_LEN: usize = 12;

/// The fixed, process-wide list of canonical endpoints to obfuscate.
///
/// Established at startup; endpoints are not created or destroyed at
/// runtime. Paths outside this list are either bypassed or passed through
/// untouched by the gateway.
pub const CANONICAL_ENDPOINTS: [&str; 7] = [
    "/api/v1/auth/register",
    "/api/v1/auth/login",
    "/api/v1/auth/logout",
    "/api/v1/users/me",
    "/api/v1/posts",
    "/api/v1/comments",
    "/api/v1/reactions",
];

/// Immutable forward/reverse mapping between canonical and obfuscated paths.
///
/// Invariant: the reverse map is exactly the structural inverse of the
/// forward map. Both are built together in [`EndpointRegistry::build_from`]
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRegistry {
    forward: BTreeMap<String, String>,
    reverse: BTreeMap<String, String>,
}

impl EndpointRegistry {
    /// Build the registry for the standard endpoint list.
    pub fn build(secret: &str) -> AppResult<Self> {
        Self::build_from(secret, &CANONICAL_ENDPOINTS)
    }

    /// Build a registry for an explicit endpoint list.
    ///
    /// Endpoints are processed in the given order. A truncated-hash
    /// collision between two endpoints is a startup failure, not a silent
    /// overwrite: 48 bits of hash make collisions unlikely at the scale of
    /// a handful of endpoints, but the registry refuses to serve a surface
    /// where two canonical paths share one alias.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` on a collision or duplicate endpoint.
    pub fn build_from(secret: &str, endpoints: &[&str]) -> AppResult<Self> {
        let mut forward = BTreeMap::new();
        let mut reverse = BTreeMap::new();

        for endpoint in endpoints {
            let obfuscated = format!("{OBFUSCATED_PREFIX}{}", path_hash(secret, endpoint));

            if let Some(previous) = reverse.insert(obfuscated.clone(), (*endpoint).to_string()) {
                return Err(AppError::ConfigError(format!(
                    "obfuscated path collision: {previous} and {endpoint} both map to {obfuscated}"
                )));
            }
            forward.insert((*endpoint).to_string(), obfuscated);
        }

        Ok(Self { forward, reverse })
    }

    /// Look up the obfuscated alias for a canonical path.
    pub fn lookup_obfuscated(&self, canonical: &str) -> Option<&str> {
        self.forward.get(canonical).map(String::as_str)
    }

    /// Look up the canonical path behind an obfuscated alias.
    pub fn lookup_canonical(&self, obfuscated: &str) -> Option<&str> {
        self.reverse.get(obfuscated).map(String::as_str)
    }

    /// Iterate `(canonical, obfuscated)` pairs in stable (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forward
            .iter()
            .map(|(canonical, obfuscated)| (canonical.as_str(), obfuscated.as_str()))
    }

    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Derive the truncated keyed hash for one canonical path.
fn path_hash(secret: &str, canonical: &str) -> String {
    let mut mac = keyed_mac(secret.as_bytes());
    mac.update(canonical.as_bytes());

    let mut digest = hex::encode(mac.finalize().into_bytes());
    digest.truncate(PATH_HASH_HEX_LEN);
    digest
}
