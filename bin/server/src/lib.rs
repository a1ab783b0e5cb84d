//! bookgate HTTP server.
//!
//! Fronts the catalog with OAuth2 login, per-request authorization and
//! logout with provider token revocation.

pub mod app;
pub mod auth;
pub mod config;
