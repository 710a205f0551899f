//! # pathveil
//!
//! A URL obfuscation gateway for Axum. The gateway hides an application's
//! real API surface behind opaque, deterministically-derived paths and
//! optionally gates access with short-lived HMAC freshness tokens - path
//! level obfuscation layered in front of an otherwise ordinary API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Obfuscation gateway (classify → token check → rewrite)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (CORS → Trace; ApiKeyAuth on system routes)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (health, mapping exposure, business stand-ins)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EndpointRegistry + TokenCodec (immutable, shared via Arc)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What this is not
//!
//! Not an access-control system: it does not replace authentication,
//! encrypt traffic, or make an obfuscated path undiscoverable - anyone
//! holding a mapping can replay it. It raises the cost of casual endpoint
//! discovery, nothing more.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pathveil::{AppState, Config, build_router};
//!
//! # fn main() -> Result<(), pathveil::AppError> {
//! let config = Config::from_env()?;
//! let state = AppState::new(config)?;
//! let app = build_router(state);
//! // Serve `app` with axum::serve...
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Configuration
//!
//! ```bash
//! SECRET_KEY=change-me-0123456789abcdef \
//! API_KEY=ops-key \
//! REQUIRE_ACCESS_TOKEN=true \
//! cargo run
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod registry;
pub mod routes;
pub mod state;
pub mod token;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use registry::EndpointRegistry;
pub use routes::build_router;
pub use state::AppState;
pub use token::{AccessToken, TokenCodec};
