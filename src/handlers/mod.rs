//! HTTP request handlers.
//!
//! - [`health`]: root and health check (gateway bypass paths)
//! - [`system`]: mapping exposure API (API-key protected)
//! - [`api`]: stand-in business handlers behind the canonical paths

pub mod api;
pub mod health;
pub mod system;

pub use health::{health_check, root};
pub use system::{list_endpoints, mint_token};
