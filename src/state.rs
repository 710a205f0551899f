//! Shared application state for Axum handlers.
//!
//! The state is cloned per request handler; everything inside is either
//! `Arc`-wrapped or cheaply clonable. The registry and the token codec are
//! built once at startup and immutable afterwards, so concurrent reads need
//! no synchronization (see the gateway's concurrency model: no shared
//! mutable state exists across requests).

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::AppResult;
use crate::registry::EndpointRegistry;
use crate::token::TokenCodec;

/// Shared application state for Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Immutable canonical/obfuscated path mapping
    pub registry: Arc<EndpointRegistry>,
    /// Freshness token codec
    pub tokens: TokenCodec,
    /// Timestamp when the application started
    pub started_at: Instant,
}

impl AppState {
    /// Build application state from validated configuration.
    ///
    /// This is where the startup self-checks run: the secret is validated
    /// and the registry build fails fast on a truncated-hash collision, so
    /// a misconfigured process never serves an unusable obfuscated surface.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` on an invalid secret or a registry
    /// collision.
    pub fn new(config: Config) -> AppResult<Self> {
        config.validate()?;

        let registry = EndpointRegistry::build(&config.secret_key)?;
        let tokens = TokenCodec::new(
            config.secret_key.clone(),
            config.token_max_age_secs,
            config.token_max_skew_secs,
        );

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            tokens,
            started_at: Instant::now(),
        })
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_state_builds_registry_from_secret() {
        let state = AppState::new(Config::default()).unwrap();
        assert_eq!(state.registry.len(), 7);
    }

    #[test]
    fn test_state_rejects_invalid_config() {
        let config = Config {
            secret_key: String::new(),
            ..Config::default()
        };
        assert!(AppState::new(config).is_err());
    }

    #[test]
    fn test_tokens_share_registry_secret() {
        let state = AppState::new(Config::default()).unwrap();
        let obfuscated = state.registry.lookup_obfuscated("/api/v1/posts").unwrap();
        let issued = state.tokens.issue(obfuscated, 1_700_000_000);
        assert!(
            state
                .tokens
                .verify(obfuscated, &issued.token, 1_700_000_000, 1_700_000_000)
        );
    }
}
