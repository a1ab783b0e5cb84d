//! OAuth2 identity provider configuration.
//!
//! The provider is a plain OAuth2 authorization server with a userinfo
//! endpoint (GitHub-style) and, optionally, an RFC 7009 revocation endpoint.
//!
//! Fields with defaults can be omitted when loading from environment variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the OAuth2 identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// Where the browser is sent for consent.
    authorization_url: String,
    /// The token endpoint for the authorization-code exchange.
    token_url: String,
    /// Endpoint returning the logged-in user's attributes as a JSON object.
    userinfo_url: String,
    /// RFC 7009 revocation endpoint. Without it every revocation at logout
    /// fails and is only logged.
    #[serde(default)]
    revocation_url: Option<String>,
    /// The redirect URI for the callback (e.g., "https://app.example.com/login/callback").
    redirect_uri: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "read:user,user:email"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// Upper bound for the revocation call at logout, in milliseconds.
    /// Default: 5000
    #[serde(default = "default_revoke_timeout_ms")]
    revoke_timeout_ms: u64,
    /// Upper bound for each token and userinfo request, in milliseconds.
    /// Default: 10000
    #[serde(default = "default_request_timeout_ms")]
    request_timeout_ms: u64,
}

fn default_scopes() -> String {
    "read:user,user:email".to_string()
}

fn default_revoke_timeout_ms() -> u64 {
    5000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl ProviderConfig {
    /// Creates a configuration builder with the required endpoints.
    #[must_use]
    pub fn builder(
        client_id: String,
        client_secret: String,
        authorization_url: String,
        token_url: String,
        userinfo_url: String,
        redirect_uri: String,
    ) -> ProviderConfigBuilder {
        ProviderConfigBuilder {
            config: Self {
                client_id,
                client_secret,
                authorization_url,
                token_url,
                userinfo_url,
                revocation_url: None,
                redirect_uri,
                scopes: default_scopes(),
                revoke_timeout_ms: default_revoke_timeout_ms(),
                request_timeout_ms: default_request_timeout_ms(),
            },
        }
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the authorization endpoint.
    #[must_use]
    pub fn authorization_url(&self) -> &str {
        &self.authorization_url
    }

    /// Returns the token endpoint.
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Returns the userinfo endpoint.
    #[must_use]
    pub fn userinfo_url(&self) -> &str {
        &self.userinfo_url
    }

    /// Returns the revocation endpoint, if configured.
    #[must_use]
    pub fn revocation_url(&self) -> Option<&str> {
        self.revocation_url.as_deref()
    }

    /// Returns the OAuth2 redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the OAuth2 scopes to request, parsed from comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns the revocation timeout.
    #[must_use]
    pub fn revoke_timeout(&self) -> Duration {
        Duration::from_millis(self.revoke_timeout_ms)
    }

    /// Returns the timeout for token and userinfo requests.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Builder for `ProviderConfig`.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
    config: ProviderConfig,
}

impl ProviderConfigBuilder {
    /// Sets the revocation endpoint.
    #[must_use]
    pub fn revocation_url(mut self, url: String) -> Self {
        self.config.revocation_url = Some(url);
        self
    }

    /// Sets the OAuth2 scopes to request.
    #[must_use]
    pub fn scopes(mut self, scopes: &[&str]) -> Self {
        self.config.scopes = scopes.join(",");
        self
    }

    /// Sets the revocation timeout.
    #[must_use]
    pub fn revoke_timeout(mut self, timeout: Duration) -> Self {
        self.config.revoke_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the timeout for token and userinfo requests.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builds the `ProviderConfig`.
    #[must_use]
    pub fn build(self) -> ProviderConfig {
        self.config
    }
}
