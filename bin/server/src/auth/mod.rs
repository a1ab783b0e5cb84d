//! Authentication boundary for the bookgate server.
//!
//! This module provides:
//! - OAuth2 login with the external identity provider
//! - Database-backed session and identity storage
//! - Authorization middleware gating every route through the policy
//!
//! # Authorization Model
//!
//! The principal's role is read from the local identity store at login and
//! embedded in the session. A role change made by an operator takes effect on
//! the next login (or session expiry). The policy is a fixed, ordered rule
//! list evaluated per request; nothing else grants access.

pub mod db;
pub mod middleware;
pub mod oauth;
pub mod routes;

use bookgate_access::{
    AuthenticationGateway, AuthorizationPolicy, IdentityRecordStore, ProviderClient,
    SessionStore, SessionTerminator,
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SessionConfig;

pub use middleware::{CurrentPrincipal, authorize};
pub use oauth::OAuthProviderClient;
pub use routes::{admin, callback, home, login, login_error, logout, not_found, profile};

/// Shared application state.
pub struct AppState {
    /// Completes logins.
    pub gateway: AuthenticationGateway,
    /// Ends sessions.
    pub terminator: SessionTerminator,
    /// Decides every request.
    pub policy: AuthorizationPolicy,
    /// Session storage.
    pub sessions: Arc<dyn SessionStore>,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        provider: Arc<dyn ProviderClient>,
        identities: Arc<dyn IdentityRecordStore>,
        sessions: Arc<dyn SessionStore>,
        policy: AuthorizationPolicy,
        session_config: SessionConfig,
        revoke_timeout: Duration,
    ) -> Self {
        Self {
            gateway: AuthenticationGateway::new(provider.clone(), identities),
            terminator: SessionTerminator::new(provider, sessions.clone(), revoke_timeout),
            policy,
            sessions,
            session_config,
        }
    }
}
