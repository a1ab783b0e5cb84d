//! Local identity records.
//!
//! An `Identity` is the catalog's own record of a person who has logged in
//! through the identity provider. Identities are keyed by email: one email
//! maps to at most one identity, and the email never changes after creation.

use bookgate_core::IdentityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// A persisted local identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Store-generated identifier.
    id: IdentityId,
    /// Unique, immutable lookup key.
    email: String,
    /// Name shown in the catalog, refreshed from the provider on login.
    display_name: Option<String>,
    /// The single source of truth for authorization.
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Identity {
    /// Reconstitutes an identity from storage.
    #[must_use]
    pub fn with_all_fields(
        id: IdentityId,
        email: String,
        display_name: Option<String>,
        role: Role,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            display_name,
            role,
            created_at,
            updated_at,
        }
    }

    /// Returns the identity's ID.
    #[must_use]
    pub fn id(&self) -> IdentityId {
        self.id
    }

    /// Returns the email key.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name, if known.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the identity's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns when the identity was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the identity was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sets the display name.
    pub fn set_display_name(&mut self, display_name: Option<String>) {
        self.display_name = display_name;
        self.updated_at = Utc::now();
    }
}

/// An identity about to be inserted. The store assigns the ID.
///
/// `standard` is the only constructor, so provisioning can never grant admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    email: String,
    display_name: Option<String>,
    role: Role,
}

impl NewIdentity {
    /// Creates a standard-role identity for a first login.
    #[must_use]
    pub fn standard(email: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            email: email.into(),
            display_name,
            role: Role::Standard,
        }
    }

    /// Returns the email key.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the role the identity will be created with.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Turns this into a persisted identity with the given ID.
    #[must_use]
    pub fn into_identity(self, id: IdentityId, now: DateTime<Utc>) -> Identity {
        Identity::with_all_fields(id, self.email, self.display_name, self.role, now, now)
    }
}
