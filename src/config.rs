//! Application configuration loaded from environment variables.
//!
//! All configuration is loaded from environment variables (or a `.env` file)
//! with development defaults where a default is safe. The shared secret has
//! no default: an empty or missing secret would silently produce an
//! obfuscated-but-unusable API surface, so startup fails fast instead.
//!
//! # Security Configuration
//!
//! - `SECRET_KEY`: shared secret for path derivation and token HMACs (required)
//! - `API_KEY`: when set, the mapping exposure endpoints require this key
//! - `REQUIRE_ACCESS_TOKEN`: when `true`, obfuscated requests without the
//!   freshness headers are rejected instead of being let through
//! - `OBFUSCATION_BYPASS_PATHS`: prefixes exempt from the gateway

use std::env;

use crate::error::{AppError, AppResult};
use crate::token::{DEFAULT_TOKEN_MAX_AGE_SECS, DEFAULT_TOKEN_MAX_SKEW_SECS};

/// Minimum accepted secret length, in bytes.
///
/// Shorter secrets make the 48-bit path hashes and 64-bit token digests
/// guessable in practice regardless of the HMAC construction.
const MIN_SECRET_LEN: usize = 16;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 8000)
    pub port: u16,

    // =========================================================================
    // Obfuscation Configuration
    // =========================================================================
    /// Shared secret for path derivation and token HMACs. Required.
    pub secret_key: String,

    /// Path prefixes the gateway never touches, besides the root path
    /// (which is matched exactly, never as a prefix).
    pub bypass_paths: Vec<String>,

    /// When `true`, obfuscated requests must carry valid freshness headers.
    /// When `false` (the default), requests without the header pair skip
    /// token verification entirely - tokens are additional security, not
    /// mandatory.
    pub require_access_token: bool,

    /// Maximum accepted token age in seconds (default: 300).
    pub token_max_age_secs: i64,

    /// Accepted future skew for token timestamps in seconds (default: 60).
    pub token_max_skew_secs: i64,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// API key protecting the mapping exposure endpoints (optional - when
    /// unset, the endpoints are open, which is only acceptable in dev).
    pub api_key: Option<String>,

    /// Comma-separated list of allowed CORS origins ("*" allows any).
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the secret is missing/too short or
    /// any numeric value fails to parse or validate.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 8000)?,

            secret_key: env::var("SECRET_KEY").unwrap_or_default(),
            bypass_paths: Self::parse_bypass_paths(),
            require_access_token: Self::parse_env("REQUIRE_ACCESS_TOKEN", false)?,
            token_max_age_secs: Self::parse_env("TOKEN_MAX_AGE_SECS", DEFAULT_TOKEN_MAX_AGE_SECS)?,
            token_max_skew_secs: Self::parse_env(
                "TOKEN_MAX_SKEW_SECS",
                DEFAULT_TOKEN_MAX_SKEW_SECS,
            )?,

            api_key: env::var("API_KEY").ok().filter(|k| !k.is_empty()),
            cors_allowed_origins: Self::parse_cors_origins(),

            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    pub fn validate(&self) -> AppResult<()> {
        if self.secret_key.is_empty() {
            return Err(AppError::ConfigError(
                "SECRET_KEY must be set - an empty secret makes every derived path \
                 and token worthless"
                    .to_string(),
            ));
        }

        if self.secret_key.len() < MIN_SECRET_LEN {
            return Err(AppError::ConfigError(format!(
                "SECRET_KEY must be at least {MIN_SECRET_LEN} bytes, got {}",
                self.secret_key.len()
            )));
        }

        if self.token_max_age_secs <= 0 {
            return Err(AppError::ConfigError(
                "TOKEN_MAX_AGE_SECS must be greater than 0".to_string(),
            ));
        }

        if self.token_max_skew_secs < 0 {
            return Err(AppError::ConfigError(
                "TOKEN_MAX_SKEW_SECS must not be negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if the mapping exposure endpoints require an API key.
    pub fn auth_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse gateway bypass prefixes from the environment.
    ///
    /// Default covers the health check, interactive docs, the machine
    /// readable schema, and the mapping exposure namespace. The root path
    /// is always bypassed and does not need to be listed.
    fn parse_bypass_paths() -> Vec<String> {
        env::var("OBFUSCATION_BYPASS_PATHS")
            .unwrap_or_else(|_| "/health,/docs,/openapi.json,/api/v1/system/".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s.starts_with('/'))
            .collect()
    }

    /// Parse CORS allowed origins from environment variable.
    fn parse_cors_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            secret_key: "dev-secret-0123456789abcdef".to_string(),
            bypass_paths: vec![
                "/health".to_string(),
                "/docs".to_string(),
                "/openapi.json".to_string(),
                "/api/v1/system/".to_string(),
            ],
            require_access_token: false,
            token_max_age_secs: DEFAULT_TOKEN_MAX_AGE_SECS,
            token_max_skew_secs: DEFAULT_TOKEN_MAX_SKEW_SECS,
            api_key: None,
            cors_allowed_origins: vec!["*".to_string()],
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.token_max_age_secs, 300);
        assert_eq!(config.token_max_skew_secs, 60);
        assert!(!config.require_access_token);
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_addr_format() {
        let config = Config {
            host: "localhost".to_string(),
            port: 8000,
            ..Config::default()
        };

        assert_eq!(config.server_addr(), "localhost:8000");
    }

    #[test]
    fn test_validate_empty_secret() {
        let config = Config {
            secret_key: String::new(),
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("SECRET_KEY"));
    }

    #[test]
    fn test_validate_short_secret() {
        let config = Config {
            secret_key: "short".to_string(),
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_token_age() {
        let config = Config {
            token_max_age_secs: 0,
            ..Config::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("TOKEN_MAX_AGE_SECS")
        );
    }

    #[test]
    fn test_validate_negative_skew() {
        let config = Config {
            token_max_skew_secs: -1,
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auth_enabled() {
        let config = Config::default();
        assert!(!config.auth_enabled());

        let config = Config {
            api_key: Some("secret-key".to_string()),
            ..Config::default()
        };
        assert!(config.auth_enabled());
    }
}
