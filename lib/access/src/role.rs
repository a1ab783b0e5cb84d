//! Role types for catalog access control.
//!
//! Every identity carries exactly one role, stored in the identity store.
//! The role is fixed when the identity is provisioned and is never derived
//! from anything the identity provider sends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access role of a local identity.
///
/// - `Standard`: Catalog access
/// - `Admin`: Catalog access plus the administration area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular catalog user. Assigned to every provisioned identity.
    Standard,
    /// Administrator. Only granted out of band.
    Admin,
}

impl Role {
    /// Returns true if this role has admin privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns the storage name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Set of roles an authorization rule accepts.
///
/// Roles do not imply each other: a rule open to both roles lists both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet {
    roles: Vec<Role>,
}

impl RoleSet {
    /// Creates an empty role set. A rule requiring it admits nobody.
    #[must_use]
    pub fn none() -> Self {
        Self { roles: Vec::new() }
    }

    /// Creates a role set accepting any catalog role.
    #[must_use]
    pub fn any() -> Self {
        Self {
            roles: vec![Role::Standard, Role::Admin],
        }
    }

    /// Creates a role set accepting administrators only.
    #[must_use]
    pub fn admin() -> Self {
        Self {
            roles: vec![Role::Admin],
        }
    }

    /// Returns true if the set accepts the role.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl Default for RoleSet {
    fn default() -> Self {
        Self::none()
    }
}
