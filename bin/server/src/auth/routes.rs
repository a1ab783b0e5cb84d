//! Authentication routes for login, callback, logout and the profile.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bookgate_access::{AuthenticationError, Session, SessionId, StoreError, project};
use chrono::Duration as ChronoDuration;
use oauth2::CsrfToken;
use rootcause::prelude::Report;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use time::Duration as TimeDuration;
use tracing::{info, warn};

use super::{AppState, CurrentPrincipal, db::generate_session_id};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// OAuth state cookie name (for CSRF protection during the login flow).
const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Where failed logins land.
const LOGIN_ERROR_PATH: &str = "/login/error";

/// Where successful logins land.
const LOGIN_SUCCESS_PATH: &str = "/profile";

/// Query parameters for the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Initiates the OAuth login flow by redirecting to the identity provider.
pub async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let csrf_state = CsrfToken::new_random().secret().clone();
    let auth_url = state.gateway.provider().authorization_url(&csrf_state);

    let cookie = Cookie::build((OAUTH_STATE_COOKIE, csrf_state))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    (jar.add(cookie), Redirect::to(&auth_url))
}

/// Handles the callback after the user consents at the identity provider.
///
/// Any failure redirects to the login error page without creating a session.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> (CookieJar, Result<Redirect, LoginFailure>) {
    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let previous = jar.get(SESSION_COOKIE).map(|c| SessionId::new(c.value()));
    let jar = jar.add(expired(OAUTH_STATE_COOKIE));

    match establish_session(&state, query, expected_state, previous).await {
        Ok(session) => {
            let cookie = Cookie::build((SESSION_COOKIE, session.id().as_str().to_string()))
                .path("/")
                .http_only(true)
                .secure(state.session_config.secure_cookies)
                .same_site(SameSite::Lax)
                .max_age(TimeDuration::minutes(state.session_config.duration_minutes));
            (jar.add(cookie), Ok(Redirect::to(LOGIN_SUCCESS_PATH)))
        }
        Err(failure) => (jar, Err(failure)),
    }
}

async fn establish_session(
    state: &AppState,
    query: CallbackQuery,
    expected_state: Option<String>,
    previous: Option<SessionId>,
) -> Result<Session, LoginFailure> {
    if let Some(error) = query.error {
        return Err(LoginFailure::ProviderDenied { error });
    }
    match (query.state, expected_state) {
        (Some(received), Some(expected)) if received == expected => {}
        _ => return Err(LoginFailure::StateMismatch),
    }
    let code = query.code.ok_or(LoginFailure::MissingCode)?;

    let principal = state
        .gateway
        .complete_login(&code)
        .await
        .map_err(LoginFailure::Authentication)?;

    // A second login replaces the previous session.
    if let Some(previous) = previous {
        if let Err(e) = state.sessions.delete(&previous).await {
            warn!(error = %e, "failed to delete previous session");
        }
    }

    let session = Session::new(
        generate_session_id(),
        principal,
        ChronoDuration::minutes(state.session_config.duration_minutes),
    );
    state
        .sessions
        .create(&session)
        .await
        .map_err(LoginFailure::Session)?;

    info!(identity_id = %session.principal().identity_id(), "session established");
    Ok(session)
}

/// Logs out: revokes the provider token best-effort and deletes the session.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let session_id = jar.get(SESSION_COOKIE).map(|c| SessionId::new(c.value()));

    let outcome = state.terminator.logout(session_id.as_ref()).await;

    (
        jar.add(expired(SESSION_COOKIE)),
        Redirect::to(outcome.redirect_target()),
    )
}

/// Returns the caller's profile as JSON.
pub async fn profile(CurrentPrincipal(principal): CurrentPrincipal) -> Response {
    match project(principal.as_ref()) {
        Ok(view) => Json(view).into_response(),
        Err(e) => (StatusCode::UNAUTHORIZED, e.to_string()).into_response(),
    }
}

/// Landing page for failed logins.
pub async fn login_error() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, "Login failed")
}

/// Home page.
pub async fn home(CurrentPrincipal(principal): CurrentPrincipal) -> String {
    match principal {
        Some(principal) => format!("bookgate: signed in as {}", principal.display().name),
        None => "bookgate: not signed in".to_string(),
    }
}

/// Administration page.
pub async fn admin(CurrentPrincipal(principal): CurrentPrincipal) -> String {
    let name = principal
        .map(|p| p.display().name.clone())
        .unwrap_or_default();
    format!("bookgate administration: {name}")
}

/// Fallback for unknown paths.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

fn expired(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Why a login callback failed.
#[derive(Debug)]
pub enum LoginFailure {
    /// The provider redirected back with an error instead of a code.
    ProviderDenied { error: String },
    /// The state parameter did not match the cookie.
    StateMismatch,
    /// The callback carried no authorization code.
    MissingCode,
    /// The gateway rejected the login.
    Authentication(Report<AuthenticationError>),
    /// The session could not be stored.
    Session(StoreError),
}

impl fmt::Display for LoginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderDenied { error } => write!(f, "provider returned error: {error}"),
            Self::StateMismatch => write!(f, "OAuth state mismatch"),
            Self::MissingCode => write!(f, "missing authorization code"),
            Self::Authentication(report) => write!(f, "{}", report.current_context()),
            Self::Session(e) => write!(f, "failed to store session: {e}"),
        }
    }
}

impl IntoResponse for LoginFailure {
    fn into_response(self) -> Response {
        warn!(reason = %self, "login failed");
        Redirect::to(LOGIN_ERROR_PATH).into_response()
    }
}
