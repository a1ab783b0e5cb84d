//! Identity provider seam.
//!
//! The provider is an external collaborator: this crate only consumes its
//! code-exchange and revocation operations through [`ProviderClient`]. A
//! successful exchange yields a [`ProviderSession`], which owns the access
//! token and the untyped attribute bag until the principal builder consumes
//! them.

use async_trait::async_trait;
use bookgate_core::ProviderSubjectId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::ProviderError;

/// A provider-issued access token.
///
/// The token is kept only so it can be revoked at logout. `Debug` output is
/// redacted so the secret never reaches logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the token secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// The raw, string-keyed attribute object returned by the provider.
///
/// Values are read only through the named accessors below; nothing outside
/// this crate sees the untyped map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderAttributes(Map<String, Value>);

impl ProviderAttributes {
    /// Parses a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ProviderError::Attributes {
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }

    /// The `email` attribute, if present and not blank.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.text("email")
    }

    /// The `name` attribute, if present and not blank.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    /// The `login` attribute, if present and not blank.
    #[must_use]
    pub fn login(&self) -> Option<&str> {
        self.text("login")
    }

    /// The raw `id` attribute. Use `principal::subject_id` to read it.
    pub(crate) fn raw_id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The outcome of one successful code exchange.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    access_token: AccessToken,
    attributes: ProviderAttributes,
}

impl ProviderSession {
    /// Creates a provider session from an exchange result.
    #[must_use]
    pub fn new(access_token: AccessToken, attributes: ProviderAttributes) -> Self {
        Self {
            access_token,
            attributes,
        }
    }

    /// Returns the attribute bag.
    #[must_use]
    pub fn attributes(&self) -> &ProviderAttributes {
        &self.attributes
    }

    /// Returns the provider's numeric account ID, if it sent one.
    #[must_use]
    pub fn subject_id(&self) -> Option<ProviderSubjectId> {
        crate::principal::subject_id(&self.attributes)
    }

    /// Splits the session into its token and attributes.
    #[must_use]
    pub fn into_parts(self) -> (AccessToken, ProviderAttributes) {
        (self.access_token, self.attributes)
    }
}

/// Client for the external identity provider.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Builds the URL the browser is sent to for consent.
    ///
    /// `csrf_state` is echoed back on the callback.
    fn authorization_url(&self, csrf_state: &str) -> String;

    /// Exchanges an authorization code for an access token and the user's
    /// attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if the token or attribute request fails.
    async fn exchange_code(&self, code: &str) -> Result<ProviderSession, ProviderError>;

    /// Asks the provider to invalidate an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects or cannot process the request.
    async fn revoke(&self, token: &AccessToken) -> Result<(), ProviderError>;
}
