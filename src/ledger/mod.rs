// SPDX-License-Identifier: MIT
//! The progress ledger — append-only store of completion records.
//!
//! Every completion submission becomes exactly one row in `level_results`.
//! Rows are never updated or deleted; replays of the same `(user, level)`
//! pair each get their own row and each counts toward totals. Validation
//! lives here, at the append boundary: the aggregator downstream can assume
//! every record references a known user and carries a non-negative score.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

use crate::error::EngineError;
use crate::identity::IdentityProvider;

/// Bind-parameter budget per `IN (...)` query. SQLite builds commonly cap
/// host parameters at 999, so chunk conservatively below that.
const MAX_BIND_PARAMS: usize = 900;

/// One immutable completion event.
///
/// `record_id` is assigned by SQLite at insertion (AUTOINCREMENT) and is
/// globally unique and monotonically increasing in insertion order, under
/// concurrent writers included. `completion_date` is an ISO-8601 calendar
/// date, e.g. `"2026-08-30"`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub record_id: i64,
    pub user_id: String,
    pub level_id: i64,
    pub score: i64,
    pub completion_date: String,
}

/// Append/query layer over the `level_results` table.
#[derive(Clone)]
pub struct Ledger {
    pool: SqlitePool,
    identity: Arc<dyn IdentityProvider>,
}

impl Ledger {
    pub fn new(pool: SqlitePool, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { pool, identity }
    }

    /// Append one completion record.
    ///
    /// `completion_date` defaults to today (UTC) when the caller does not
    /// supply one. Fails with `UnknownUser` if `user_id` does not resolve in
    /// the identity projection and `InvalidScore` if `score` is negative.
    /// The returned record carries the freshly assigned `record_id` and is
    /// visible to every subsequent query.
    pub async fn append(
        &self,
        user_id: &str,
        level_id: i64,
        score: i64,
        completion_date: Option<NaiveDate>,
    ) -> Result<ProgressRecord, EngineError> {
        if score < 0 {
            return Err(EngineError::InvalidScore(score));
        }
        if self.identity.resolve(user_id).await?.is_none() {
            return Err(EngineError::UnknownUser(user_id.to_string()));
        }

        let date = completion_date
            .unwrap_or_else(|| Utc::now().date_naive())
            .to_string();

        let result = sqlx::query(
            "INSERT INTO level_results (user_id, level_id, score, completion_date)
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(level_id)
        .bind(score)
        .bind(&date)
        .execute(&self.pool)
        .await?;

        let record_id = result.last_insert_rowid();
        debug!(record_id, user_id, level_id, score, "completion recorded");

        Ok(sqlx::query_as(
            "SELECT record_id, user_id, level_id, score, completion_date
             FROM level_results WHERE record_id = ?",
        )
        .bind(record_id)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Every record in the ledger, in insertion order.
    pub async fn query_all(&self) -> Result<Vec<ProgressRecord>, EngineError> {
        Ok(sqlx::query_as(
            "SELECT record_id, user_id, level_id, score, completion_date
             FROM level_results ORDER BY record_id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Every record belonging to one of the given users, in insertion order.
    /// Equivalent in result to filtering `query_all` by membership.
    pub async fn query_by_users(
        &self,
        user_ids: &[String],
    ) -> Result<Vec<ProgressRecord>, EngineError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        // SQLite has no array bind; build the placeholder list by hand.
        // Populations larger than the host-parameter limit are split into
        // chunks and merged back into insertion order.
        let mut records: Vec<ProgressRecord> = Vec::new();
        for chunk in user_ids.chunks(MAX_BIND_PARAMS) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT record_id, user_id, level_id, score, completion_date
                 FROM level_results WHERE user_id IN ({placeholders}) ORDER BY record_id"
            );

            let mut query = sqlx::query_as(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            records.extend(query.fetch_all(&self.pool).await?);
        }
        records.sort_by_key(|r| r.record_id);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{SqliteIdentity, UserRef};
    use crate::storage::Storage;

    async fn setup() -> (Ledger, SqliteIdentity) {
        let dir = tempfile::tempdir().unwrap().keep();
        let storage = Storage::new(&dir.join("data")).await.unwrap();
        let identity = SqliteIdentity::new(storage.pool());
        let ledger = Ledger::new(storage.pool(), Arc::new(identity.clone()));
        (ledger, identity)
    }

    async fn add_user(identity: &SqliteIdentity, id: &str) {
        identity
            .put_user(&UserRef {
                user_id: id.to_string(),
                display_name: id.to_uppercase(),
                region_id: 1,
                is_deleted: false,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn append_assigns_monotonic_ids() {
        let (ledger, identity) = setup().await;
        add_user(&identity, "u1").await;

        let first = ledger.append("u1", 1, 10, None).await.unwrap();
        let second = ledger.append("u1", 2, 20, None).await.unwrap();
        assert!(second.record_id > first.record_id);
        assert_eq!(first.score, 10);
    }

    #[tokio::test]
    async fn append_defaults_date_to_today() {
        let (ledger, identity) = setup().await;
        add_user(&identity, "u1").await;

        let record = ledger.append("u1", 1, 10, None).await.unwrap();
        assert_eq!(record.completion_date, Utc::now().date_naive().to_string());

        let fixed = NaiveDate::from_ymd_opt(2024, 11, 14).unwrap();
        let record = ledger.append("u1", 1, 10, Some(fixed)).await.unwrap();
        assert_eq!(record.completion_date, "2024-11-14");
    }

    #[tokio::test]
    async fn append_rejects_unknown_user() {
        let (ledger, _identity) = setup().await;
        let err = ledger.append("ghost", 1, 10, None).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownUser(ref id) if id == "ghost"));
        // Nothing was written.
        assert!(ledger.query_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_rejects_negative_score() {
        let (ledger, identity) = setup().await;
        add_user(&identity, "u1").await;

        let err = ledger.append("u1", 1, -5, None).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidScore(-5)));
        assert!(ledger.query_all().await.unwrap().is_empty());

        // Zero is a valid score.
        ledger.append("u1", 1, 0, None).await.unwrap();
    }

    #[tokio::test]
    async fn appended_record_stays_visible_unchanged() {
        let (ledger, identity) = setup().await;
        add_user(&identity, "u1").await;

        let record = ledger.append("u1", 3, 42, None).await.unwrap();

        let all = ledger.query_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].record_id, record.record_id);
        assert_eq!(all[0].score, 42);
        assert_eq!(all[0].level_id, 3);

        let by_user = ledger
            .query_by_users(&["u1".to_string()])
            .await
            .unwrap();
        assert_eq!(by_user.len(), 1);
        assert_eq!(by_user[0].record_id, record.record_id);
    }

    #[tokio::test]
    async fn replays_each_get_their_own_row() {
        let (ledger, identity) = setup().await;
        add_user(&identity, "u1").await;

        ledger.append("u1", 1, 10, None).await.unwrap();
        ledger.append("u1", 1, 15, None).await.unwrap();
        ledger.append("u1", 1, 5, None).await.unwrap();

        let all = ledger.query_all().await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn query_by_users_filters_membership() {
        let (ledger, identity) = setup().await;
        add_user(&identity, "u1").await;
        add_user(&identity, "u2").await;
        add_user(&identity, "u3").await;

        ledger.append("u1", 1, 10, None).await.unwrap();
        ledger.append("u2", 1, 20, None).await.unwrap();
        ledger.append("u3", 1, 30, None).await.unwrap();

        let subset = ledger
            .query_by_users(&["u1".to_string(), "u3".to_string()])
            .await
            .unwrap();
        assert_eq!(subset.len(), 2);
        assert!(subset.iter().all(|r| r.user_id != "u2"));

        // Empty population: empty result, no SQL round-trip.
        assert!(ledger.query_by_users(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_by_users_spans_bind_parameter_chunks() {
        let (ledger, identity) = setup().await;

        // More ids than one IN (...) chunk can bind.
        let mut ids = Vec::new();
        for i in 0..(MAX_BIND_PARAMS + 100) {
            ids.push(format!("u{i:04}"));
        }
        // Records for one user in the first chunk and one in the second.
        let first = ids.first().unwrap().clone();
        let last = ids.last().unwrap().clone();
        add_user(&identity, &first).await;
        add_user(&identity, &last).await;
        ledger.append(&last, 1, 20, None).await.unwrap();
        ledger.append(&first, 1, 10, None).await.unwrap();

        let records = ledger.query_by_users(&ids).await.unwrap();
        assert_eq!(records.len(), 2);
        // Merged back into insertion order across chunks.
        assert_eq!(records[0].user_id, last);
        assert!(records[0].record_id < records[1].record_id);
    }
}
