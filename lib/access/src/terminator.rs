//! Logout.
//!
//! [`SessionTerminator::logout`] revokes the provider token best-effort,
//! deletes the local session unconditionally and returns a fixed redirect
//! target. Revocation is bounded by a timeout and never retried: a token the
//! provider did not revoke stays valid only until the provider expires it.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::provider::{AccessToken, ProviderClient};
use crate::session::SessionId;
use crate::store::SessionStore;

/// Where logout sends the browser.
pub const LOGOUT_REDIRECT: &str = "/";

/// Default upper bound for the revocation call.
pub const DEFAULT_REVOKE_TIMEOUT: Duration = Duration::from_secs(5);

/// What happened to the provider token during logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationOutcome {
    /// The provider confirmed revocation.
    Revoked,
    /// The provider returned an error.
    Failed,
    /// The provider did not answer within the timeout.
    TimedOut,
    /// There was no session, so no token to revoke.
    NotAttempted,
}

/// Result of a logout. The redirect never depends on the revocation outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    redirect_target: &'static str,
    revocation: RevocationOutcome,
}

impl LogoutOutcome {
    /// Returns the redirect target.
    #[must_use]
    pub fn redirect_target(&self) -> &'static str {
        self.redirect_target
    }

    /// Returns the revocation outcome.
    #[must_use]
    pub fn revocation(&self) -> RevocationOutcome {
        self.revocation
    }
}

/// Ends sessions.
#[derive(Clone)]
pub struct SessionTerminator {
    provider: Arc<dyn ProviderClient>,
    sessions: Arc<dyn SessionStore>,
    revoke_timeout: Duration,
}

impl SessionTerminator {
    /// Creates a terminator with the given revocation timeout.
    #[must_use]
    pub fn new(
        provider: Arc<dyn ProviderClient>,
        sessions: Arc<dyn SessionStore>,
        revoke_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            sessions,
            revoke_timeout,
        }
    }

    /// Logs out the session, if any.
    ///
    /// Always completes: revocation and store failures are logged, not
    /// returned. After this returns the session id resolves to no principal.
    #[instrument(skip_all)]
    pub async fn logout(&self, session_id: Option<&SessionId>) -> LogoutOutcome {
        let Some(session_id) = session_id else {
            return outcome(RevocationOutcome::NotAttempted);
        };

        let token = match self.sessions.find(session_id).await {
            Ok(Some(session)) => Some(session.into_principal().access_token().clone()),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to load session for logout");
                None
            }
        };

        let revocation = match token {
            Some(token) => self.revoke(&token).await,
            None => RevocationOutcome::NotAttempted,
        };

        if let Err(e) = self.sessions.delete(session_id).await {
            error!(error = %e, "failed to delete session on logout");
        }
        debug!("session invalidated");

        outcome(revocation)
    }

    async fn revoke(&self, token: &AccessToken) -> RevocationOutcome {
        match tokio::time::timeout(self.revoke_timeout, self.provider.revoke(token)).await {
            Ok(Ok(())) => {
                info!("provider token revoked");
                RevocationOutcome::Revoked
            }
            Ok(Err(e)) => {
                warn!(error = %e, "provider token revocation failed");
                RevocationOutcome::Failed
            }
            Err(_) => {
                warn!(
                    timeout_ms = millis(self.revoke_timeout),
                    "provider token revocation timed out"
                );
                RevocationOutcome::TimedOut
            }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn outcome(revocation: RevocationOutcome) -> LogoutOutcome {
    LogoutOutcome {
        redirect_target: LOGOUT_REDIRECT,
        revocation,
    }
}
