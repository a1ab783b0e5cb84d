//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `AuthenticationError`: Login callback failures (provider, attributes, store)
//! - `ProviderError`: Failures reported by the identity provider client
//! - `StoreError`: Identity and session store failures
//! - `PolicyError`: Invalid authorization rules at startup
//! - `NotAuthenticated`: Explicit absence of a principal

use std::fmt;

/// Errors from completing a login.
///
/// Every variant is terminal for the login attempt: no session is
/// established and the caller is sent to the login-error view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The code exchange or attribute fetch failed.
    ProviderError { reason: String },
    /// The provider response lacked a required attribute.
    MissingIdentityAttribute { attribute: String },
    /// The identity store failed in a way the single re-read could not resolve.
    Store { reason: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderError { reason } => {
                write!(f, "identity provider error: {reason}")
            }
            Self::MissingIdentityAttribute { attribute } => {
                write!(f, "missing required identity attribute: {attribute}")
            }
            Self::Store { reason } => {
                write!(f, "identity store error: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from identity provider operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The authorization code could not be exchanged for a token.
    TokenExchange { reason: String },
    /// The user attribute endpoint failed or returned malformed data.
    Attributes { reason: String },
    /// The token revocation request failed.
    Revocation { reason: String },
    /// The provider client is misconfigured.
    Configuration { reason: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenExchange { reason } => {
                write!(f, "token exchange failed: {reason}")
            }
            Self::Attributes { reason } => {
                write!(f, "failed to fetch user attributes: {reason}")
            }
            Self::Revocation { reason } => {
                write!(f, "token revocation failed: {reason}")
            }
            Self::Configuration { reason } => {
                write!(f, "provider configuration error: {reason}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Errors from identity and session stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An identity with this email already exists.
    Conflict { email: String },
    /// The record to update does not exist.
    NotFound { key: String },
    /// The backing store failed.
    Unavailable { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { email } => {
                write!(f, "identity already exists for email: {email}")
            }
            Self::NotFound { key } => {
                write!(f, "record not found: {key}")
            }
            Self::Unavailable { reason } => {
                write!(f, "store unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from building the authorization policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A path pattern could not be parsed.
    InvalidPattern { pattern: String, reason: String },
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "invalid path pattern '{pattern}': {reason}")
            }
        }
    }
}

impl std::error::Error for PolicyError {}

/// Signal that no principal is attached to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotAuthenticated;

impl fmt::Display for NotAuthenticated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not authenticated")
    }
}

impl std::error::Error for NotAuthenticated {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_error_provider_display() {
        let err = AuthenticationError::ProviderError {
            reason: "connection timeout".to_string(),
        };
        assert!(err.to_string().contains("identity provider error"));
        assert!(err.to_string().contains("connection timeout"));
    }

    #[test]
    fn authentication_error_missing_attribute_display() {
        let err = AuthenticationError::MissingIdentityAttribute {
            attribute: "email".to_string(),
        };
        assert!(err.to_string().contains("missing required identity attribute"));
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn store_conflict_display() {
        let err = StoreError::Conflict {
            email: "a@x.com".to_string(),
        };
        assert!(err.to_string().contains("already exists"));
        assert!(err.to_string().contains("a@x.com"));
    }

    #[test]
    fn provider_revocation_display() {
        let err = ProviderError::Revocation {
            reason: "HTTP 503".to_string(),
        };
        assert!(err.to_string().contains("revocation failed"));
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn policy_error_display() {
        let err = PolicyError::InvalidPattern {
            pattern: "admin/**".to_string(),
            reason: "must start with '/'".to_string(),
        };
        assert!(err.to_string().contains("admin/**"));
        assert!(err.to_string().contains("must start with"));
    }

    #[test]
    fn not_authenticated_display() {
        assert_eq!(NotAuthenticated.to_string(), "not authenticated");
    }
}
