//! HTTP middleware: the obfuscation gateway and the API key gate.
//!
//! The [`obfuscation`] layer is the core of this crate. It wraps the whole
//! router so every request is classified before any route matching:
//!
//! ```text
//! Request → Obfuscation gateway → CORS → Trace → Router → Handler
//!               │
//!               ├─ bypass / passthrough: forwarded unmodified
//!               ├─ /api/x/…: token check + rewrite to canonical path
//!               └─ /api/v1/…: 301 (GET) or 308 (other) toward the alias
//! ```
//!
//! The [`auth`] layer protects only the mapping exposure route group, using
//! constant-time key comparison and per-IP failure limiting.

pub mod auth;
pub mod ip;
pub mod obfuscation;

pub use auth::{API_KEY_HEADER, ApiKeyAuth};
pub use ip::{UNKNOWN_IP, extract_client_ip};
pub use obfuscation::{ObfuscationLayer, RouteClass, classify};
