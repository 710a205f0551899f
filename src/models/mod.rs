//! Request/response models for the gateway's own endpoints.

pub mod api;

pub use api::{
    AccessGrant, EndpointMapping, EndpointsResponse, HealthResponse, MovedResponse, TokenHeaders,
    TokenResponse, UsageNotes, UseObfuscatedResponse, WelcomeResponse,
};
