// SPDX-License-Identifier: MIT
//! quizledger — progress ledger and leaderboard aggregation engine for a
//! quiz-style learning game.
//!
//! Completions are appended to an immutable ledger; leaderboards are computed
//! on demand as a pure fold over that ledger plus read-only identity and
//! region snapshots. The engine is a library: account management, credential
//! handling, and the HTTP surface live in the host application.

pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod leaderboard;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;

use catalog::Catalog;
use config::EngineConfig;
use error::EngineError;
use identity::SqliteIdentity;
use leaderboard::{Aggregator, RegionSummary};
use ledger::{Ledger, ProgressRecord};
use storage::Storage;

/// The wired-up engine, shared by every concurrent caller.
///
/// All components hang off one SQLite pool; the struct itself holds no
/// mutable request state, so a single instance can serve any number of
/// concurrent submissions and leaderboard reads.
#[derive(Clone)]
pub struct Engine {
    pub config: Arc<EngineConfig>,
    pub storage: Arc<Storage>,
    pub identity: Arc<SqliteIdentity>,
    pub catalog: Catalog,
    pub ledger: Ledger,
    aggregator: Aggregator,
}

impl Engine {
    /// Open (or create) the database under `config.data_dir` and wire up
    /// every component.
    pub async fn new(config: EngineConfig) -> Result<Self> {
        let storage = Arc::new(
            Storage::new_with_slow_query(
                &config.data_dir,
                config.observability.slow_query_threshold_ms,
            )
            .await?,
        );
        let identity = Arc::new(SqliteIdentity::new(storage.pool()));
        let catalog = Catalog::new(storage.pool());
        let ledger = Ledger::new(storage.pool(), identity.clone());
        let aggregator = Aggregator::new(
            identity.clone(),
            catalog.clone(),
            ledger.clone(),
            config.leaderboard.include_deleted,
        );
        Ok(Self {
            config: Arc::new(config),
            storage,
            identity,
            catalog,
            ledger,
            aggregator,
        })
    }

    /// Record one completion. 1:1 with `Ledger::append`, with the completion
    /// date defaulted to today.
    pub async fn submit(
        &self,
        user_id: &str,
        level_id: i64,
        score: i64,
    ) -> Result<ProgressRecord, EngineError> {
        self.ledger.append(user_id, level_id, score, None).await
    }

    /// Record one completion with an explicit completion date.
    pub async fn submit_dated(
        &self,
        user_id: &str,
        level_id: i64,
        score: i64,
        completion_date: NaiveDate,
    ) -> Result<ProgressRecord, EngineError> {
        self.ledger
            .append(user_id, level_id, score, Some(completion_date))
            .await
    }

    /// Compute a leaderboard. 1:1 with `Aggregator::compute`.
    pub async fn leaderboard(
        &self,
        region_id: Option<i64>,
    ) -> Result<RegionSummary, EngineError> {
        self.aggregator.compute(region_id).await
    }
}

/// Initialise the global tracing subscriber.
///
/// `filter` is an env-filter string (e.g. `"info"`, `"info,quizledger=debug"`);
/// `format` selects `"pretty"` (compact human output) or `"json"` (structured,
/// for log aggregators). Call at most once per process; hosts with their own
/// subscriber should skip this entirely.
pub fn init_tracing(filter: &str, format: &str) {
    if format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
