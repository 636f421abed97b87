// SPDX-License-Identifier: MIT
//! Leaderboard aggregation — a stateless fold over the ledger.
//!
//! The aggregator owns no persisted state. Each computation reads the user
//! population from the identity projection, the matching records from the
//! ledger, and folds them into per-user totals. Running it twice against an
//! unchanged ledger yields identical output, ordering included.

pub mod model;

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::EngineError;
use crate::identity::{IdentityProvider, UserRef};
use crate::ledger::Ledger;

pub use model::{RegionSummary, UserSummary};

/// Label for the global (unfiltered) leaderboard.
const GLOBAL_LABEL: &str = "All";

#[derive(Clone)]
pub struct Aggregator {
    identity: Arc<dyn IdentityProvider>,
    catalog: Catalog,
    ledger: Ledger,
    /// Whether soft-deleted accounts stay in the population
    /// (`leaderboard.include_deleted` in config, default true).
    include_deleted: bool,
}

impl Aggregator {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        catalog: Catalog,
        ledger: Ledger,
        include_deleted: bool,
    ) -> Self {
        Self {
            identity,
            catalog,
            ledger,
            include_deleted,
        }
    }

    /// Compute the leaderboard for a region, or globally.
    ///
    /// A `None` or non-positive filter selects every known user and labels
    /// the result `"All"`. A positive filter resolves the region by id —
    /// `RegionNotFound` if it does not exist — and selects only its members.
    /// Users with zero records appear with `(0, 0)` totals; they are never
    /// silently dropped.
    pub async fn compute(
        &self,
        region_filter: Option<i64>,
    ) -> Result<RegionSummary, EngineError> {
        let (region_name, mut population) = match region_filter {
            Some(region_id) if region_id > 0 => {
                let name = self
                    .catalog
                    .region_name(region_id)
                    .await?
                    .ok_or(EngineError::RegionNotFound(region_id))?;
                (name, self.identity.users_in_region(region_id).await?)
            }
            _ => (GLOBAL_LABEL.to_string(), self.identity.list_users().await?),
        };

        if !self.include_deleted {
            population.retain(|u| !u.is_deleted);
        }

        let user_ids: Vec<String> = population.iter().map(|u| u.user_id.clone()).collect();
        let records = self.ledger.query_by_users(&user_ids).await?;

        // Fold records into per-user (total, attempts).
        let mut totals: HashMap<&str, (i64, i64)> = HashMap::new();
        for record in &records {
            let entry = totals.entry(record.user_id.as_str()).or_insert((0, 0));
            entry.0 += record.score;
            entry.1 += 1;
        }

        let mut entries: Vec<UserSummary> = population
            .iter()
            .map(|user: &UserRef| {
                let (total_score, attempt_count) =
                    totals.get(user.user_id.as_str()).copied().unwrap_or((0, 0));
                UserSummary {
                    display_name: user.display_name.clone(),
                    total_score,
                    attempt_count,
                }
            })
            .collect();

        // Deterministic ordering: score desc, attempts desc, name asc.
        entries.sort_by(|a, b| {
            (Reverse(a.total_score), Reverse(a.attempt_count), &a.display_name)
                .cmp(&(Reverse(b.total_score), Reverse(b.attempt_count), &b.display_name))
        });

        debug!(
            region = %region_name,
            users = entries.len(),
            records = records.len(),
            "leaderboard computed"
        );

        Ok(RegionSummary {
            region_name,
            entries,
        })
    }
}
