// SPDX-License-Identifier: MIT
//! Identity reference — read-only projection of the external identity
//! collaborator.
//!
//! The engine never owns accounts; it consumes a stable
//! `(user_id, display_name, region_id)` tuple per user, plus the soft-delete
//! flag. The `IdentityProvider` trait is the seam: the ledger validates
//! appends through it and the aggregator resolves populations through it.
//! `SqliteIdentity` is the bundled implementation, reading the `users`
//! projection table that a host keeps in sync.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::EngineError;

/// One user as seen by the engine.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: String,
    pub display_name: String,
    pub region_id: i64,
    /// Soft-delete marker. Whether deleted accounts stay in leaderboard
    /// populations is a configuration decision, not an identity one.
    pub is_deleted: bool,
}

impl UserRef {
    /// Build a projection entry with a freshly minted v4 user id — the same
    /// GUID shape the upstream identity system assigns.
    pub fn new(display_name: impl Into<String>, region_id: i64) -> Self {
        Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            region_id,
            is_deleted: false,
        }
    }
}

/// Read-only view of the identity collaborator.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a user id to its projection entry, or `None` if unknown.
    async fn resolve(&self, user_id: &str) -> Result<Option<UserRef>, EngineError>;

    /// All known users, soft-deleted included.
    async fn list_users(&self) -> Result<Vec<UserRef>, EngineError>;

    /// All users whose region matches, soft-deleted included.
    async fn users_in_region(&self, region_id: i64) -> Result<Vec<UserRef>, EngineError>;
}

/// Identity projection backed by the engine's own SQLite database.
#[derive(Clone)]
pub struct SqliteIdentity {
    pool: SqlitePool,
}

impl SqliteIdentity {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ─── Projection sync (host-side, not part of the aggregation core) ───────

    /// Insert or replace one user in the projection.
    pub async fn put_user(&self, user: &UserRef) -> Result<(), EngineError> {
        sqlx::query(
            "INSERT OR REPLACE INTO users (user_id, display_name, region_id, is_deleted)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&user.user_id)
        .bind(&user.display_name)
        .bind(user.region_id)
        .bind(user.is_deleted)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark a user soft-deleted in the projection. Returns `false` if the
    /// user id is unknown.
    pub async fn set_deleted(&self, user_id: &str, deleted: bool) -> Result<bool, EngineError> {
        let result = sqlx::query("UPDATE users SET is_deleted = ? WHERE user_id = ?")
            .bind(deleted)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl IdentityProvider for SqliteIdentity {
    async fn resolve(&self, user_id: &str) -> Result<Option<UserRef>, EngineError> {
        Ok(sqlx::query_as(
            "SELECT user_id, display_name, region_id, is_deleted
             FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_users(&self) -> Result<Vec<UserRef>, EngineError> {
        Ok(sqlx::query_as(
            "SELECT user_id, display_name, region_id, is_deleted
             FROM users ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn users_in_region(&self, region_id: i64) -> Result<Vec<UserRef>, EngineError> {
        Ok(sqlx::query_as(
            "SELECT user_id, display_name, region_id, is_deleted
             FROM users WHERE region_id = ? ORDER BY user_id",
        )
        .bind(region_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
