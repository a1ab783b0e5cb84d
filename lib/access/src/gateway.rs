//! Login callback orchestration.
//!
//! [`AuthenticationGateway::complete_login`] turns an authorization code into
//! a [`Principal`]: exchange the code with the provider, require an email,
//! provision the local identity, build the principal. Any failure aborts the
//! login before a session exists. Provider failures are never retried.

use bookgate_core::Result;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::AuthenticationError;
use crate::principal::{Principal, PrincipalBuilder};
use crate::provider::ProviderClient;
use crate::provision::provision;
use crate::store::IdentityRecordStore;

/// Completes logins against one identity provider and one identity store.
#[derive(Clone)]
pub struct AuthenticationGateway {
    provider: Arc<dyn ProviderClient>,
    identities: Arc<dyn IdentityRecordStore>,
    builder: PrincipalBuilder,
}

impl AuthenticationGateway {
    /// Creates a gateway.
    #[must_use]
    pub fn new(provider: Arc<dyn ProviderClient>, identities: Arc<dyn IdentityRecordStore>) -> Self {
        Self {
            provider,
            identities,
            builder: PrincipalBuilder,
        }
    }

    /// Returns the provider client.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn ProviderClient> {
        &self.provider
    }

    /// Exchanges `code` and returns the principal for the logged-in identity.
    ///
    /// May insert one identity row.
    ///
    /// # Errors
    ///
    /// - `ProviderError` if the code exchange fails
    /// - `MissingIdentityAttribute` if the provider sent no email
    /// - `Store` if the identity store fails
    #[instrument(skip_all)]
    pub async fn complete_login(&self, code: &str) -> Result<Principal, AuthenticationError> {
        let provider_session = self.provider.exchange_code(code).await.map_err(|e| {
            warn!(error = %e, "provider code exchange failed");
            AuthenticationError::ProviderError {
                reason: e.to_string(),
            }
        })?;

        let attributes = provider_session.attributes();
        let email = attributes
            .email()
            .ok_or_else(|| {
                warn!("provider response has no email attribute");
                AuthenticationError::MissingIdentityAttribute {
                    attribute: "email".to_string(),
                }
            })?
            .to_string();

        let identity = provision(self.identities.as_ref(), &email, attributes.name())
            .await
            .inspect_err(|e| warn!(error = %e, "identity provisioning failed"))?;

        let (access_token, attributes) = provider_session.into_parts();
        let principal = self.builder.build(&identity, &attributes, access_token);
        info!(
            identity_id = %principal.identity_id(),
            role = %principal.role(),
            "login completed"
        );
        Ok(principal)
    }
}
