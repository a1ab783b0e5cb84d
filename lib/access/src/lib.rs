//! Authentication, session lifecycle and authorization for bookgate.
//!
//! Login is delegated to an external OAuth2 provider. On callback the
//! [`AuthenticationGateway`] provisions a local [`Identity`] keyed by email and
//! builds a [`Principal`] for the session. Every request is then checked by the
//! [`AuthorizationPolicy`]. [`SessionTerminator`] ends sessions and revokes the
//! provider token best-effort.
//!
//! Roles are never taken from the provider: new identities are `standard`
//! and only an operator can promote one to `admin` in the store.

pub mod error;
pub mod gateway;
pub mod identity;
pub mod policy;
pub mod principal;
pub mod profile;
pub mod provider;
pub mod provider_config;
pub mod provision;
pub mod role;
pub mod session;
pub mod store;
pub mod terminator;

#[cfg(test)]
mod testing;

pub use error::{AuthenticationError, NotAuthenticated, PolicyError, ProviderError, StoreError};
pub use gateway::AuthenticationGateway;
pub use identity::{Identity, NewIdentity};
pub use policy::{
    AuthorizationPolicy, AuthorizationRule, Decision, Denial, PathPattern, Requirement, RuleConfig,
};
pub use principal::{DisplayAttributes, Principal, PrincipalBuilder};
pub use profile::{ProfileView, project};
pub use provider::{AccessToken, ProviderAttributes, ProviderClient, ProviderSession};
pub use provider_config::{ProviderConfig, ProviderConfigBuilder};
pub use role::{Role, RoleSet, UnknownRole};
pub use session::{Session, SessionId};
pub use store::{IdentityRecordStore, MemoryIdentityStore, MemorySessionStore, SessionStore};
pub use terminator::{LogoutOutcome, RevocationOutcome, SessionTerminator};
