// SPDX-License-Identifier: MIT
//! Leaderboard data models — derived, never persisted.

use serde::{Deserialize, Serialize};

/// One user's aggregated standing within a population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub display_name: String,
    /// Sum of `score` over every matching ledger record.
    pub total_score: i64,
    /// Number of matching ledger records. Replays count individually.
    pub attempt_count: i64,
}

/// An ordered ranking of users within a population.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    /// Name of the resolved region, or `"All"` for the global board.
    pub region_name: String,
    /// Ranked entries: `total_score` desc, then `attempt_count` desc, then
    /// `display_name` asc.
    pub entries: Vec<UserSummary>,
}
