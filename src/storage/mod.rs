// SPDX-License-Identifier: MIT
//! SQLite storage bootstrap.
//!
//! Owns the connection pool shared by the identity projection, the catalog,
//! and the progress ledger. The schema is created with idempotent
//! `CREATE TABLE IF NOT EXISTS` statements at pool creation, so opening a
//! fresh data directory always yields a usable database.

use anyhow::{Context as _, Result};
use sqlx::{sqlite::SqliteConnectOptions, ConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Create storage with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding it
    /// are logged at WARN level. Set to 0 to disable slow-query logging.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("quizledger.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::bootstrap(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    /// The ledger, catalog, and identity projection all share this pool.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn bootstrap(pool: &SqlitePool) -> Result<()> {
        // Reference data: immutable region catalog.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS regions (
                region_id INTEGER PRIMARY KEY,
                name      TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await
        .context("create regions table")?;

        // Read-only projection of the external identity collaborator.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                user_id      TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                region_id    INTEGER NOT NULL,
                is_deleted   INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(pool)
        .await
        .context("create users table")?;

        // Static level/question catalog.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS game_levels (
                level_id INTEGER PRIMARY KEY,
                name     TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await
        .context("create game_levels table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS questions (
                question_id    INTEGER PRIMARY KEY,
                level_id       INTEGER NOT NULL,
                content        TEXT NOT NULL,
                answer_a       TEXT NOT NULL,
                answer_b       TEXT NOT NULL,
                answer_c       TEXT NOT NULL,
                answer_d       TEXT NOT NULL,
                correct_answer TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await
        .context("create questions table")?;

        // The progress ledger. AUTOINCREMENT guarantees globally unique,
        // monotonically increasing record ids under concurrent writers.
        // Rows are never updated or deleted once inserted.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS level_results (
                record_id       INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         TEXT NOT NULL,
                level_id        INTEGER NOT NULL,
                score           INTEGER NOT NULL,
                completion_date TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await
        .context("create level_results table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_level_results_user_id
             ON level_results (user_id)",
        )
        .execute(pool)
        .await
        .context("create level_results user_id index")?;

        Ok(())
    }
}
