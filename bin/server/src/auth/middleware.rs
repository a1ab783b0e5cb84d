//! Authorization middleware and the principal extractor for Axum.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use bookgate_access::{Decision, Denial, Principal, SessionId};
use std::sync::Arc;
use tracing::{debug, error};

use super::AppState;
use super::routes::SESSION_COOKIE;

/// The caller's principal, if the request carried a live session.
///
/// Inserted by [`authorize`] on every allowed request.
#[derive(Debug, Clone, Default)]
pub struct CurrentPrincipal(pub Option<Principal>);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentPrincipal>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Resolves the session cookie and applies the authorization policy.
///
/// Unauthenticated requests get `401` under `/api/` and a redirect to the
/// login page elsewhere. Forbidden requests get a uniform `403`.
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = match jar.get(SESSION_COOKIE) {
        Some(cookie) => resolve_principal(&state, &SessionId::new(cookie.value())).await,
        None => None,
    };

    let path = request.uri().path().to_string();
    match state.policy.decide(&path, principal.as_ref()) {
        Decision::Allow => {
            request.extensions_mut().insert(CurrentPrincipal(principal));
            next.run(request).await
        }
        Decision::Deny(Denial::Unauthenticated) => {
            debug!(path = %path, "unauthenticated request denied");
            if path.starts_with("/api/") {
                StatusCode::UNAUTHORIZED.into_response()
            } else {
                Redirect::to("/login").into_response()
            }
        }
        Decision::Deny(Denial::Forbidden) => {
            debug!(path = %path, "forbidden request denied");
            (StatusCode::FORBIDDEN, "Forbidden").into_response()
        }
    }
}

/// Looks up a live session. Expired sessions are deleted.
async fn resolve_principal(state: &AppState, session_id: &SessionId) -> Option<Principal> {
    let session = match state.sessions.find(session_id).await {
        Ok(session) => session?,
        Err(e) => {
            error!(error = %e, "failed to load session");
            return None;
        }
    };

    if session.is_expired() {
        debug!("session expired");
        if let Err(e) = state.sessions.delete(session_id).await {
            error!(error = %e, "failed to delete expired session");
        }
        return None;
    }

    Some(session.into_principal())
}
