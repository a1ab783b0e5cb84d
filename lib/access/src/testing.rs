//! Hand-written collaborator fakes shared by the unit tests.

use async_trait::async_trait;
use bookgate_core::IdentityId;
use chrono::Utc;
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Barrier;

use crate::error::{ProviderError, StoreError};
use crate::identity::{Identity, NewIdentity};
use crate::provider::{AccessToken, ProviderAttributes, ProviderClient, ProviderSession};
use crate::session::{Session, SessionId};
use crate::store::{IdentityRecordStore, MemoryIdentityStore, MemorySessionStore, SessionStore};

/// How the fake provider answers `revoke`.
#[derive(Debug, Clone, Copy)]
pub enum RevokeBehavior {
    Succeed,
    Fail,
    Hang,
}

/// Provider that returns a fixed attribute object for every code.
pub struct FakeProvider {
    attributes: Option<Value>,
    revoke: RevokeBehavior,
    exchanges: AtomicUsize,
    revoked: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn returning(attributes: Value) -> Self {
        Self {
            attributes: Some(attributes),
            revoke: RevokeBehavior::Succeed,
            exchanges: AtomicUsize::new(0),
            revoked: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            attributes: None,
            ..Self::returning(Value::Null)
        }
    }

    pub fn with_revoke(mut self, revoke: RevokeBehavior) -> Self {
        self.revoke = revoke;
        self
    }

    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    pub fn revoked(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderClient for FakeProvider {
    fn authorization_url(&self, csrf_state: &str) -> String {
        format!("https://provider.test/authorize?state={csrf_state}")
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderSession, ProviderError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        let attributes = self
            .attributes
            .clone()
            .ok_or_else(|| ProviderError::TokenExchange {
                reason: "invalid_grant".to_string(),
            })?;
        Ok(ProviderSession::new(
            AccessToken::new(format!("token-for-{code}")),
            ProviderAttributes::from_value(attributes)?,
        ))
    }

    async fn revoke(&self, token: &AccessToken) -> Result<(), ProviderError> {
        self.revoked
            .lock()
            .unwrap()
            .push(token.secret().to_string());
        match self.revoke {
            RevokeBehavior::Succeed => Ok(()),
            RevokeBehavior::Fail => Err(ProviderError::Revocation {
                reason: "HTTP 503".to_string(),
            }),
            RevokeBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

/// Store whose first lookup misses although another writer has already
/// inserted the row, so the provisioning insert hits the unique constraint.
pub struct RacingIdentityStore {
    inner: MemoryIdentityStore,
    winner: Identity,
    find_calls: AtomicUsize,
    insert_calls: AtomicUsize,
}

impl RacingIdentityStore {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            inner: MemoryIdentityStore::new(),
            winner: NewIdentity::standard("a@x.com", Some("Ann".to_string()))
                .into_identity(IdentityId::new(1), now),
            find_calls: AtomicUsize::new(0),
            insert_calls: AtomicUsize::new(0),
        }
    }

    pub fn winner_id(&self) -> IdentityId {
        self.winner.id()
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityRecordStore for RacingIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        if self.find_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.inner.seed(self.winner.clone()).await;
            return Ok(None);
        }
        self.inner.find_by_email(email).await
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(identity).await
    }

    async fn update_display_name(
        &self,
        id: IdentityId,
        display_name: Option<&str>,
    ) -> Result<Identity, StoreError> {
        self.inner.update_display_name(id, display_name).await
    }
}

/// Store that holds every first lookup at a barrier, so concurrent logins
/// all miss before any of them inserts.
pub struct BarrierIdentityStore {
    pub inner: MemoryIdentityStore,
    barrier: Barrier,
    lookups: AtomicUsize,
    parties: usize,
}

impl BarrierIdentityStore {
    pub fn new(parties: usize) -> Self {
        Self {
            inner: MemoryIdentityStore::new(),
            barrier: Barrier::new(parties),
            lookups: AtomicUsize::new(0),
            parties,
        }
    }
}

#[async_trait]
impl IdentityRecordStore for BarrierIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let found = self.inner.find_by_email(email).await?;
        if self.lookups.fetch_add(1, Ordering::SeqCst) < self.parties {
            self.barrier.wait().await;
        }
        Ok(found)
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        self.inner.insert(identity).await
    }

    async fn update_display_name(
        &self,
        id: IdentityId,
        display_name: Option<&str>,
    ) -> Result<Identity, StoreError> {
        self.inner.update_display_name(id, display_name).await
    }
}

/// Store that fails every call.
pub struct UnavailableIdentityStore;

#[async_trait]
impl IdentityRecordStore for UnavailableIdentityStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<Identity>, StoreError> {
        Err(unavailable())
    }

    async fn insert(&self, _identity: NewIdentity) -> Result<Identity, StoreError> {
        Err(unavailable())
    }

    async fn update_display_name(
        &self,
        _id: IdentityId,
        _display_name: Option<&str>,
    ) -> Result<Identity, StoreError> {
        Err(unavailable())
    }
}

/// Session store that fails every call.
pub struct UnavailableSessionStore;

#[async_trait]
impl SessionStore for UnavailableSessionStore {
    async fn create(&self, _session: &Session) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn find(&self, _id: &SessionId) -> Result<Option<Session>, StoreError> {
        Err(unavailable())
    }

    async fn delete(&self, _id: &SessionId) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        Err(unavailable())
    }
}

/// Session store whose reads work but whose deletes fail.
#[derive(Default)]
pub struct UndeletableSessionStore {
    pub inner: MemorySessionStore,
}

#[async_trait]
impl SessionStore for UndeletableSessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        self.inner.create(session).await
    }

    async fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        self.inner.find(id).await
    }

    async fn delete(&self, _id: &SessionId) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        Err(unavailable())
    }
}

fn unavailable() -> StoreError {
    StoreError::Unavailable {
        reason: "connection refused".to_string(),
    }
}
