//! Identity provisioning on login.
//!
//! Finds the local identity for an email, creating a standard-role identity
//! on first login. Two first logins for the same email may race the insert;
//! the store's uniqueness constraint rejects the loser, which re-reads the
//! winner's row exactly once.

use tracing::{debug, info, warn};

use crate::error::{AuthenticationError, StoreError};
use crate::identity::{Identity, NewIdentity};
use crate::store::IdentityRecordStore;

/// Returns the identity for `email`, creating it if this is a first login.
///
/// An existing identity keeps its ID and role. Its display name is
/// refreshed when the provider sends a different, non-blank name.
///
/// # Errors
///
/// Returns `AuthenticationError::Store` if the store fails, or if the row
/// is still missing after a conflicting insert.
pub async fn provision(
    store: &dyn IdentityRecordStore,
    email: &str,
    display_name: Option<&str>,
) -> Result<Identity, AuthenticationError> {
    if let Some(existing) = store.find_by_email(email).await.map_err(store_failure)? {
        debug!(identity_id = %existing.id(), "identity found");
        return refresh_display_name(store, existing, display_name).await;
    }

    let new = NewIdentity::standard(email, display_name.map(str::to_string));
    match store.insert(new).await {
        Ok(created) => {
            info!(identity_id = %created.id(), "provisioned new identity");
            Ok(created)
        }
        Err(StoreError::Conflict { .. }) => {
            debug!("concurrent first login won the insert, re-reading");
            store
                .find_by_email(email)
                .await
                .map_err(store_failure)?
                .ok_or_else(|| {
                    warn!("identity missing after unique-email conflict");
                    AuthenticationError::Store {
                        reason: "identity missing after insert conflict".to_string(),
                    }
                })
        }
        Err(e) => Err(store_failure(e)),
    }
}

async fn refresh_display_name(
    store: &dyn IdentityRecordStore,
    existing: Identity,
    display_name: Option<&str>,
) -> Result<Identity, AuthenticationError> {
    match display_name {
        Some(name) if existing.display_name() != Some(name) => store
            .update_display_name(existing.id(), Some(name))
            .await
            .map_err(store_failure),
        _ => Ok(existing),
    }
}

fn store_failure(e: StoreError) -> AuthenticationError {
    AuthenticationError::Store {
        reason: e.to_string(),
    }
}
