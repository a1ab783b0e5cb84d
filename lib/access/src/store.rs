//! Storage traits for identities and sessions, with in-memory implementations.
//!
//! The in-memory stores back tests and database-less development runs. The
//! server provides PostgreSQL implementations of the same traits.

use async_trait::async_trait;
use bookgate_core::IdentityId;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::identity::{Identity, NewIdentity};
use crate::session::{Session, SessionId};

/// Persistent mapping from email to local identity.
///
/// Implementations must enforce email uniqueness natively: `insert` fails
/// with `StoreError::Conflict` when another writer already created the row.
#[async_trait]
pub trait IdentityRecordStore: Send + Sync {
    /// Looks up an identity by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    /// Inserts a new identity and returns it with its generated ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email is already taken.
    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError>;

    /// Replaces the display name of an existing identity.
    async fn update_display_name(
        &self,
        id: IdentityId,
        display_name: Option<&str>,
    ) -> Result<Identity, StoreError>;
}

/// Storage for authenticated sessions.
///
/// A session id with no record is an anonymous session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a new session.
    async fn create(&self, session: &Session) -> Result<(), StoreError>;

    /// Finds a session by ID.
    async fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Deletes a session. Deleting a missing session is not an error.
    async fn delete(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Deletes expired sessions and returns how many were removed.
    async fn delete_expired(&self) -> Result<u64, StoreError>;
}

#[derive(Debug, Default)]
struct IdentityTable {
    next_id: i64,
    by_email: HashMap<String, Identity>,
}

/// In-memory identity store.
///
/// The uniqueness check and the insert happen under one lock, which plays
/// the role of a database unique constraint.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    table: Mutex<IdentityTable>,
}

impl MemoryIdentityStore {
    /// Creates an empty store. The first inserted identity gets ID 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an identity with an explicit role, bypassing provisioning.
    ///
    /// This stands in for out-of-band administration (for example granting
    /// admin) and is never called on the login path.
    pub async fn seed(&self, identity: Identity) {
        let mut table = self.table.lock().await;
        table.next_id = table.next_id.max(identity.id().get());
        table
            .by_email
            .insert(identity.email().to_string(), identity);
    }

    /// Returns the number of stored identities.
    pub async fn len(&self) -> usize {
        self.table.lock().await.by_email.len()
    }

    /// Returns true if no identities are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl IdentityRecordStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.table.lock().await.by_email.get(email).cloned())
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let mut table = self.table.lock().await;
        if table.by_email.contains_key(identity.email()) {
            return Err(StoreError::Conflict {
                email: identity.email().to_string(),
            });
        }

        table.next_id += 1;
        let id = IdentityId::new(table.next_id);
        let identity = identity.into_identity(id, Utc::now());
        table
            .by_email
            .insert(identity.email().to_string(), identity.clone());
        Ok(identity)
    }

    async fn update_display_name(
        &self,
        id: IdentityId,
        display_name: Option<&str>,
    ) -> Result<Identity, StoreError> {
        let mut table = self.table.lock().await;
        let identity = table
            .by_email
            .values_mut()
            .find(|identity| identity.id() == id)
            .ok_or_else(|| StoreError::NotFound {
                key: id.to_string(),
            })?;
        identity.set_display_name(display_name.map(str::to_string));
        Ok(identity.clone())
    }
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .await
            .insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.lock().await.get(id).cloned())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        self.sessions.lock().await.remove(id);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}
