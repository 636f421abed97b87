// SPDX-License-Identifier: MIT
//! Engine error taxonomy.
//!
//! Every fallible operation in the crate returns one of these four variants.
//! Callers always see a structured failure — no operation swallows an error
//! or degrades into an empty-but-successful result. Retry policy, if any,
//! belongs to the caller.

/// Errors returned by the ledger and the leaderboard aggregator.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An append referenced a user id that does not resolve in the
    /// identity projection.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// An append carried a negative score. Validation lives at the ledger
    /// boundary, so the aggregator never sees a negative value.
    #[error("invalid score: {0} (scores must be non-negative)")]
    InvalidScore(i64),

    /// A leaderboard request filtered on a positive region id that does not
    /// exist in the region catalog.
    #[error("region not found: {0}")]
    RegionNotFound(i64),

    /// Transient failure of the underlying SQLite store, not otherwise
    /// classified.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}
