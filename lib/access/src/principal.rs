//! The internal representation of an authenticated caller.
//!
//! A [`Principal`] is built once per login by [`PrincipalBuilder`] from the
//! local identity and the provider's attribute bag. This is the boundary where
//! untyped provider data becomes typed: nothing past it sees the raw map.

use bookgate_core::{IdentityId, ProviderSubjectId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::Identity;
use crate::provider::{AccessToken, ProviderAttributes};
use crate::role::Role;

/// Display fields copied from the provider at login.
///
/// Missing attributes are empty strings (or `None` for the numeric ID).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayAttributes {
    pub name: String,
    pub login: String,
    pub email: String,
    pub subject_id: Option<ProviderSubjectId>,
}

/// An authenticated caller for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    identity_id: IdentityId,
    role: Role,
    display: DisplayAttributes,
    /// Kept for revocation at logout. Never sent to clients.
    access_token: AccessToken,
}

impl Principal {
    /// Returns the local identity ID.
    #[must_use]
    pub fn identity_id(&self) -> IdentityId {
        self.identity_id
    }

    /// Returns the role from the identity store.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the display attributes.
    #[must_use]
    pub fn display(&self) -> &DisplayAttributes {
        &self.display
    }

    /// Returns the provider access token for revocation.
    #[must_use]
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns true if the principal is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Builds principals. Pure: no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrincipalBuilder;

impl PrincipalBuilder {
    /// Maps an identity, the provider attributes and the access token into a
    /// principal.
    ///
    /// The role is taken from `identity` only. Provider-side roles, groups
    /// or authorities in `attributes` are ignored.
    #[must_use]
    pub fn build(
        &self,
        identity: &Identity,
        attributes: &ProviderAttributes,
        access_token: AccessToken,
    ) -> Principal {
        let display = DisplayAttributes {
            name: attributes.name().unwrap_or_default().to_string(),
            login: attributes.login().unwrap_or_default().to_string(),
            email: attributes
                .email()
                .unwrap_or(identity.email())
                .to_string(),
            subject_id: subject_id(attributes),
        };

        Principal {
            identity_id: identity.id(),
            role: identity.role(),
            display,
            access_token,
        }
    }
}

/// Reads the provider's numeric `id` attribute.
///
/// This is the only place provider ids are widened. JSON numbers arrive as
/// either signed or unsigned 64-bit integers (32-bit ids included); both map
/// losslessly onto `i64`. An unsigned value above `i64::MAX`, a float, or a
/// non-number yields `None` rather than a truncated id.
pub(crate) fn subject_id(attributes: &ProviderAttributes) -> Option<ProviderSubjectId> {
    let Value::Number(number) = attributes.raw_id()? else {
        return None;
    };

    number
        .as_i64()
        .or_else(|| number.as_u64().and_then(|n| i64::try_from(n).ok()))
        .map(ProviderSubjectId::new)
}
