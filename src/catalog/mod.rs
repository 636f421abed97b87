// SPDX-License-Identifier: MIT
//! Region / level / question reference data.
//!
//! Everything here is a read against static catalog tables; the engine never
//! mutates catalog rows outside the host-sync helpers. The per-level question
//! read shares this path because it is the same kind of pass-through query.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::EngineError;

/// A named geographic grouping. Immutable reference data.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub region_id: i64,
    pub name: String,
}

/// One playable level.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLevel {
    pub level_id: i64,
    pub name: String,
}

/// One quiz question, four answers, one correct.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: i64,
    pub level_id: i64,
    pub content: String,
    pub answer_a: String,
    pub answer_b: String,
    pub answer_c: String,
    pub answer_d: String,
    pub correct_answer: String,
}

/// Read layer over the catalog tables.
#[derive(Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ─── Reads ───────────────────────────────────────────────────────────────

    pub async fn list_regions(&self) -> Result<Vec<Region>, EngineError> {
        Ok(
            sqlx::query_as("SELECT region_id, name FROM regions ORDER BY region_id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Resolve a region id to its name, or `None` if unknown.
    pub async fn region_name(&self, region_id: i64) -> Result<Option<String>, EngineError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT name FROM regions WHERE region_id = ?")
                .bind(region_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| r.0))
    }

    pub async fn list_levels(&self) -> Result<Vec<GameLevel>, EngineError> {
        Ok(
            sqlx::query_as("SELECT level_id, name FROM game_levels ORDER BY level_id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn list_questions(&self) -> Result<Vec<Question>, EngineError> {
        Ok(sqlx::query_as(
            "SELECT question_id, level_id, content, answer_a, answer_b, answer_c, answer_d, correct_answer
             FROM questions ORDER BY question_id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// All questions belonging to one level. Pass-through read — no
    /// aggregation, no existence check on the level id: an unknown level
    /// simply has no questions.
    pub async fn questions_for_level(&self, level_id: i64) -> Result<Vec<Question>, EngineError> {
        Ok(sqlx::query_as(
            "SELECT question_id, level_id, content, answer_a, answer_b, answer_c, answer_d, correct_answer
             FROM questions WHERE level_id = ? ORDER BY question_id",
        )
        .bind(level_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // ─── Host sync ───────────────────────────────────────────────────────────

    pub async fn put_region(&self, region_id: i64, name: &str) -> Result<(), EngineError> {
        sqlx::query("INSERT OR REPLACE INTO regions (region_id, name) VALUES (?, ?)")
            .bind(region_id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn put_level(&self, level_id: i64, name: &str) -> Result<(), EngineError> {
        sqlx::query("INSERT OR REPLACE INTO game_levels (level_id, name) VALUES (?, ?)")
            .bind(level_id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn put_question(&self, question: &Question) -> Result<(), EngineError> {
        sqlx::query(
            "INSERT OR REPLACE INTO questions
             (question_id, level_id, content, answer_a, answer_b, answer_c, answer_d, correct_answer)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(question.question_id)
        .bind(question.level_id)
        .bind(&question.content)
        .bind(&question.answer_a)
        .bind(&question.answer_b)
        .bind(&question.answer_c)
        .bind(&question.answer_d)
        .bind(&question.correct_answer)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
