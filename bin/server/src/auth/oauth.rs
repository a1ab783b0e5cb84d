//! OAuth2 provider client built on the `oauth2` crate.
//!
//! Logs a user in with the authorization-code flow, then reads their
//! attributes from the provider's userinfo endpoint. Logout revokes the access
//! token through the RFC 7009 revocation endpoint when one is configured.

use async_trait::async_trait;
use bookgate_access::{
    AccessToken, ProviderAttributes, ProviderClient, ProviderConfig, ProviderError, ProviderSession,
};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet,
    EndpointNotSet, EndpointSet, RedirectUrl, RevocationUrl, Scope, StandardRevocableToken,
    TokenResponse, TokenUrl,
};
use serde_json::Value;
use tracing::{debug, instrument};

/// Client with authorization and token endpoints set, and a revocation
/// endpoint that may be missing.
type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointMaybeSet, EndpointSet>;

/// [`ProviderClient`] for a GitHub-style OAuth2 provider.
pub struct OAuthProviderClient {
    client: ConfiguredClient,
    http: reqwest::Client,
    userinfo_url: String,
    scopes: Vec<Scope>,
}

impl OAuthProviderClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` if an endpoint URL is invalid
    /// or the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> bookgate_core::Result<Self, ProviderError> {
        let auth_url = AuthUrl::new(config.authorization_url().to_string())
            .map_err(|e| configuration(format!("invalid authorization URL: {e}")))?;
        let token_url = TokenUrl::new(config.token_url().to_string())
            .map_err(|e| configuration(format!("invalid token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string())
            .map_err(|e| configuration(format!("invalid redirect URI: {e}")))?;
        let revocation_url = config
            .revocation_url()
            .map(|url| RevocationUrl::new(url.to_string()))
            .transpose()
            .map_err(|e| configuration(format!("invalid revocation URL: {e}")))?;

        let client = BasicClient::new(ClientId::new(config.client_id().to_string()))
            .set_client_secret(ClientSecret::new(config.client_secret().to_string()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url)
            .set_revocation_url_option(revocation_url);

        // Token and userinfo requests must not follow redirects.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.request_timeout())
            .user_agent(concat!("bookgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            http,
            userinfo_url: config.userinfo_url().to_string(),
            scopes: config
                .scopes()
                .into_iter()
                .map(|scope| Scope::new(scope.to_string()))
                .collect(),
        })
    }

    async fn fetch_attributes(&self, token: &str) -> Result<ProviderAttributes, ProviderError> {
        let attributes = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ProviderError::Attributes {
                reason: e.to_string(),
            })?
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Attributes {
                reason: format!("invalid userinfo response: {e}"),
            })?;
        ProviderAttributes::from_value(attributes)
    }
}

#[async_trait]
impl ProviderClient for OAuthProviderClient {
    fn authorization_url(&self, csrf_state: &str) -> String {
        let (url, _) = self
            .client
            .authorize_url(|| CsrfToken::new(csrf_state.to_string()))
            .add_scopes(self.scopes.iter().cloned())
            .url();
        url.to_string()
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<ProviderSession, ProviderError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::TokenExchange {
                reason: e.to_string(),
            })?;
        let secret = token.access_token().secret().clone();
        debug!("authorization code exchanged");

        let attributes = self.fetch_attributes(&secret).await?;
        Ok(ProviderSession::new(AccessToken::new(secret), attributes))
    }

    #[instrument(skip_all)]
    async fn revoke(&self, token: &AccessToken) -> Result<(), ProviderError> {
        let request = self
            .client
            .revoke_token(StandardRevocableToken::AccessToken(
                oauth2::AccessToken::new(token.secret().to_string()),
            ))
            .map_err(|e| ProviderError::Configuration {
                reason: e.to_string(),
            })?;
        request
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::Revocation {
                reason: e.to_string(),
            })
    }
}

fn configuration(reason: String) -> ProviderError {
    ProviderError::Configuration { reason }
}
