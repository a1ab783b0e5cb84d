//! HTTP routing.

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};

/// Builds the application router.
///
/// The authorization middleware wraps every route, including the fallback.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(auth::home))
        .route("/login", get(auth::login))
        .route("/login/callback", get(auth::callback))
        .route("/login/error", get(auth::login_error))
        .route("/logout", get(auth::logout))
        .route("/profile", get(auth::profile))
        .route("/admin", get(auth::admin))
        .fallback(auth::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth::authorize))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use bookgate_access::{
        AccessToken, AuthorizationPolicy, Identity, MemoryIdentityStore, MemorySessionStore,
        ProviderAttributes, ProviderClient, ProviderError, ProviderSession, Role, Session,
        SessionId, SessionStore,
    };
    use bookgate_core::IdentityId;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    /// Accepts the code "good" for Ann and rejects everything else.
    #[derive(Default)]
    struct FakeProvider {
        exchanges: AtomicUsize,
        revocations: AtomicUsize,
    }

    #[async_trait]
    impl ProviderClient for FakeProvider {
        fn authorization_url(&self, csrf_state: &str) -> String {
            format!("https://provider.test/authorize?state={csrf_state}")
        }

        async fn exchange_code(&self, code: &str) -> Result<ProviderSession, ProviderError> {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            if code != "good" {
                return Err(ProviderError::TokenExchange {
                    reason: "invalid_grant".to_string(),
                });
            }
            Ok(ProviderSession::new(
                AccessToken::new("gho_token"),
                ProviderAttributes::from_value(json!({
                    "email": "a@x.com",
                    "name": "Ann",
                    "login": "ann",
                    "id": 101
                }))?,
            ))
        }

        async fn revoke(&self, _token: &AccessToken) -> Result<(), ProviderError> {
            self.revocations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Harness {
        app: Router,
        provider: Arc<FakeProvider>,
        identities: Arc<MemoryIdentityStore>,
        sessions: Arc<MemorySessionStore>,
    }

    fn harness() -> Harness {
        let provider = Arc::new(FakeProvider::default());
        let identities = Arc::new(MemoryIdentityStore::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let state = Arc::new(AppState::new(
            provider.clone(),
            identities.clone(),
            sessions.clone(),
            AuthorizationPolicy::catalog_default().unwrap(),
            SessionConfig {
                secure_cookies: false,
                ..SessionConfig::default()
            },
            Duration::from_millis(100),
        ));
        Harness {
            app: router(state),
            provider,
            identities,
            sessions,
        }
    }

    async fn get(app: &Router, uri: &str, cookie: Option<String>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .expect("request failed")
    }

    fn location(response: &Response) -> &str {
        response.headers()[LOCATION].to_str().unwrap()
    }

    /// Returns the value of a `Set-Cookie` header for `name`, if any.
    fn set_cookie(response: &Response, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| value.strip_prefix(&prefix))
            .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Runs the login redirect and callback, returning the session cookie value.
    async fn log_in(app: &Router) -> String {
        let response = get(app, "/login", None).await;
        let state = set_cookie(&response, "oauth_state").unwrap();

        let response = get(
            app,
            &format!("/login/callback?code=good&state={state}"),
            Some(format!("oauth_state={state}")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/profile");
        set_cookie(&response, "session").unwrap()
    }

    #[tokio::test]
    async fn login_redirects_to_provider_with_state_cookie() {
        let h = harness();

        let response = get(&h.app, "/login", None).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let state = set_cookie(&response, "oauth_state").unwrap();
        assert!(!state.is_empty());
        assert_eq!(
            location(&response),
            format!("https://provider.test/authorize?state={state}")
        );
    }

    #[tokio::test]
    async fn full_login_profile_logout_flow() {
        let h = harness();
        let session = log_in(&h.app).await;
        let cookie = format!("session={session}");

        let response = get(&h.app, "/profile", Some(cookie.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"name": "Ann", "login": "ann", "id": 101, "email": "a@x.com"})
        );

        let response = get(&h.app, "/admin", Some(cookie.clone())).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = get(&h.app, "/logout", Some(cookie.clone())).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        assert_eq!(set_cookie(&response, "session").as_deref(), Some(""));
        assert_eq!(h.provider.revocations.load(Ordering::SeqCst), 1);
        assert!(h.sessions.find(&SessionId::new(session)).await.unwrap().is_none());

        let response = get(&h.app, "/profile", Some(cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn second_login_reuses_identity_and_replaces_session() {
        let h = harness();
        let first = log_in(&h.app).await;

        let response = get(&h.app, "/login", Some(format!("session={first}"))).await;
        let state = set_cookie(&response, "oauth_state").unwrap();
        let response = get(
            &h.app,
            &format!("/login/callback?code=good&state={state}"),
            Some(format!("session={first}; oauth_state={state}")),
        )
        .await;
        let second = set_cookie(&response, "session").unwrap();

        assert_ne!(first, second);
        assert!(h.sessions.find(&SessionId::new(first)).await.unwrap().is_none());
        assert_eq!(h.identities.len().await, 1);
    }

    #[tokio::test]
    async fn admin_identity_reaches_admin_page() {
        let h = harness();
        let now = Utc::now();
        h.identities
            .seed(Identity::with_all_fields(
                IdentityId::new(1),
                "a@x.com".to_string(),
                Some("Ann".to_string()),
                Role::Admin,
                now,
                now,
            ))
            .await;
        let session = log_in(&h.app).await;

        let response = get(&h.app, "/admin", Some(format!("session={session}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn callback_with_mismatched_state_creates_no_session() {
        let h = harness();

        let response = get(
            &h.app,
            "/login/callback?code=good&state=forged",
            Some("oauth_state=expected".to_string()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login/error");
        assert!(set_cookie(&response, "session").is_none());
        assert_eq!(h.provider.exchanges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn callback_without_state_cookie_is_rejected() {
        let h = harness();

        let response = get(&h.app, "/login/callback?code=good&state=s", None).await;

        assert_eq!(location(&response), "/login/error");
        assert!(h.identities.is_empty().await);
    }

    #[tokio::test]
    async fn provider_error_and_failed_exchange_land_on_error_page() {
        let h = harness();

        let denied = get(
            &h.app,
            "/login/callback?error=access_denied&state=s",
            Some("oauth_state=s".to_string()),
        )
        .await;
        let failed = get(
            &h.app,
            "/login/callback?code=bad&state=s",
            Some("oauth_state=s".to_string()),
        )
        .await;

        assert_eq!(location(&denied), "/login/error");
        assert_eq!(location(&failed), "/login/error");
        assert!(set_cookie(&failed, "session").is_none());
        assert_eq!(h.provider.exchanges.load(Ordering::SeqCst), 1);

        let page = get(&h.app, "/login/error", None).await;
        assert_eq!(page.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn anonymous_requests_are_denied_by_path_kind() {
        let h = harness();

        let api = get(&h.app, "/api/v1/books", None).await;
        assert_eq!(api.status(), StatusCode::UNAUTHORIZED);

        let page = get(&h.app, "/profile", None).await;
        assert_eq!(page.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&page), "/login");

        let unknown = get(&h.app, "/somewhere/else", None).await;
        assert_eq!(location(&unknown), "/login");

        let dotted = get(&h.app, "/css/../admin", None).await;
        assert_eq!(location(&dotted), "/login");

        let home = get(&h.app, "/", None).await;
        assert_eq!(home.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn authenticated_unknown_path_is_not_found() {
        let h = harness();
        let session = log_in(&h.app).await;

        let response = get(&h.app, "/somewhere/else", Some(format!("session={session}"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn expired_session_is_anonymous_and_deleted() {
        let h = harness();
        let session = log_in(&h.app).await;
        let id = SessionId::new(session.clone());
        let principal = h.sessions.find(&id).await.unwrap().unwrap().into_principal();
        h.sessions.delete(&id).await.unwrap();
        h.sessions
            .create(&Session::new(id.clone(), principal, ChronoDuration::minutes(-1)))
            .await
            .unwrap();

        let response = get(&h.app, "/profile", Some(format!("session={session}"))).await;

        assert_eq!(location(&response), "/login");
        assert!(h.sessions.find(&id).await.unwrap().is_none());
    }
}
