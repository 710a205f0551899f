//! Time-based freshness tokens for obfuscated endpoints.
//!
//! A token is a short-lived proof that a client obtained an obfuscated path
//! recently. It is derived from the shared secret, the obfuscated path, and
//! an issuance timestamp:
//!
//! ```text
//! token = hex(HMAC-SHA256(secret, "{path}:{timestamp}"))[..16]
//! ```
//!
//! Clients attach the pair via the `X-Timestamp` and `X-Access-Token`
//! headers. Verification recomputes the digest and compares it in constant
//! time, and additionally bounds the timestamp's age: tokens older than the
//! validity window are rejected, as are tokens from too far in the future
//! (a small allowance covers clock skew).
//!
//! The codec is stateless and pure - safe for unsynchronized concurrent use.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the token's issuance timestamp (integer Unix seconds).
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// Header carrying the 16-hex-character token digest.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Length of the hex-encoded token digest.
pub const TOKEN_DIGEST_HEX_LEN: usize = 16;

/// Default maximum token age in seconds (5 minutes).
pub const DEFAULT_TOKEN_MAX_AGE_SECS: i64 = 300;

/// Default tolerance for tokens stamped in the future, in seconds.
/// Covers minor clock skew between the issuing and verifying hosts.
pub const DEFAULT_TOKEN_MAX_SKEW_SECS: i64 = 60;

/// An issued freshness token, bound to one obfuscated path.
///
/// Ephemeral by design: never persisted, regenerated on demand, valid only
/// within the freshness window relative to wall-clock time at verification.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AccessToken {
    /// Unix seconds at the moment of issuance.
    pub timestamp: i64,
    /// Truncated hex HMAC digest over `"{path}:{timestamp}"`.
    pub token: String,
}

/// Issues and verifies freshness tokens from the shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Arc<String>,
    max_age_secs: i64,
    max_skew_secs: i64,
}

impl TokenCodec {
    /// Create a codec from the shared secret and freshness window bounds.
    pub fn new(secret: impl Into<String>, max_age_secs: i64, max_skew_secs: i64) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            max_age_secs,
            max_skew_secs,
        }
    }

    /// Create a codec with the default 300s/-60s freshness window.
    pub fn with_defaults(secret: impl Into<String>) -> Self {
        Self::new(
            secret,
            DEFAULT_TOKEN_MAX_AGE_SECS,
            DEFAULT_TOKEN_MAX_SKEW_SECS,
        )
    }

    /// Issue a token for `path` stamped at `now` (Unix seconds).
    pub fn issue(&self, path: &str, now: i64) -> AccessToken {
        AccessToken {
            timestamp: now,
            token: self.digest(path, now),
        }
    }

    /// Issue a token for `path` stamped at the current wall-clock time.
    pub fn issue_now(&self, path: &str) -> AccessToken {
        self.issue(path, unix_now())
    }

    /// Verify a token presented for `path` with its claimed `timestamp`,
    /// evaluated at wall-clock time `now`.
    ///
    /// Fails when the token is older than the validity window, stamped too
    /// far in the future, or when the digest does not match. Both window
    /// boundaries are inclusive-valid. There is no partial-credit state.
    pub fn verify(&self, path: &str, token: &str, timestamp: i64, now: i64) -> bool {
        let age = now - timestamp;
        if age > self.max_age_secs || age < -self.max_skew_secs {
            return false;
        }

        let expected = self.digest(path, timestamp);
        // Constant-time comparison so a mismatching digest cannot be probed
        // byte by byte via response timing.
        expected.as_bytes().ct_eq(token.as_bytes()).into()
    }

    /// The configured maximum token age in seconds.
    pub fn max_age_secs(&self) -> i64 {
        self.max_age_secs
    }

    fn digest(&self, path: &str, timestamp: i64) -> String {
        let mut mac = keyed_mac(self.secret.as_bytes());
        mac.update(path.as_bytes());
        mac.update(b":");
        mac.update(timestamp.to_string().as_bytes());

        let mut digest = hex::encode(mac.finalize().into_bytes());
        digest.truncate(TOKEN_DIGEST_HEX_LEN);
        digest
    }
}

/// Construct an HMAC-SHA256 instance keyed with `secret`.
pub(crate) fn keyed_mac(secret: &[u8]) -> HmacSha256 {
    match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        // HMAC-SHA256 accepts keys of any length.
        Err(_) => unreachable!("HMAC-SHA256 key initialization cannot fail"),
    }
}

/// Current wall-clock time as integer Unix seconds.
pub fn unix_now() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        // Pre-epoch system clocks only occur on badly misconfigured hosts;
        // saturate rather than panic in the request path.
        Err(_) => 0,
    }
}
