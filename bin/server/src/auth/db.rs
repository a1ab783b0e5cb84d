//! PostgreSQL stores for identities and sessions.

use async_trait::async_trait;
use bookgate_access::{
    Identity, IdentityRecordStore, NewIdentity, Principal, Role, Session, SessionId, SessionStore,
    StoreError,
};
use bookgate_core::IdentityId;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for identity queries.
#[derive(FromRow)]
struct IdentityRow {
    id: i64,
    email: String,
    display_name: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IdentityRow {
    fn try_into_identity(self) -> Result<Identity, StoreError> {
        let role = Role::from_str(&self.role).map_err(|e| StoreError::Unavailable {
            reason: format!("identity {}: {e}", self.id),
        })?;
        Ok(Identity::with_all_fields(
            IdentityId::new(self.id),
            self.email,
            self.display_name,
            role,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    principal: serde_json::Value,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session, StoreError> {
        let principal: Principal =
            serde_json::from_value(self.principal).map_err(|e| StoreError::Unavailable {
                reason: format!("invalid principal in session '{}': {e}", self.id),
            })?;
        Ok(Session::with_all_fields(
            SessionId::new(self.id),
            principal,
            self.created_at,
            self.expires_at,
        ))
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable {
        reason: e.to_string(),
    }
}

/// Identity store backed by the `identities` table.
///
/// Email uniqueness is enforced by the table's `UNIQUE` constraint.
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    /// Creates a new identity store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRecordStore for PgIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let row: Option<IdentityRow> = sqlx::query_as(
            r#"
            SELECT id, email, display_name, role, created_at, updated_at
            FROM identities
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(IdentityRow::try_into_identity).transpose()
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let row: IdentityRow = sqlx::query_as(
            r#"
            INSERT INTO identities (email, display_name, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, display_name, role, created_at, updated_at
            "#,
        )
        .bind(identity.email())
        .bind(identity.display_name())
        .bind(identity.role().as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict {
                email: identity.email().to_string(),
            },
            other => unavailable(other),
        })?;

        row.try_into_identity()
    }

    async fn update_display_name(
        &self,
        id: IdentityId,
        display_name: Option<&str>,
    ) -> Result<Identity, StoreError> {
        let row: Option<IdentityRow> = sqlx::query_as(
            r#"
            UPDATE identities
            SET display_name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, display_name, role, created_at, updated_at
            "#,
        )
        .bind(id.get())
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.ok_or_else(|| StoreError::NotFound { key: id.to_string() })?
            .try_into_identity()
    }
}

/// Session store backed by the `sessions` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Creates a new session store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        let principal = serde_json::to_value(session.principal()).map_err(|e| {
            StoreError::Unavailable {
                reason: format!("failed to serialize principal: {e}"),
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, identity_id, principal, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.principal().identity_id().get())
        .bind(principal)
        .bind(session.created_at())
        .bind(session.expires_at())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, principal, created_at, expires_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(SessionRow::try_into_session).transpose()
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(result.rows_affected())
    }
}

/// Generates a unique session ID using ULID.
pub fn generate_session_id() -> SessionId {
    SessionId::new(ulid::Ulid::new().to_string())
}
