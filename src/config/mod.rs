use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::error;

// ─── ObservabilityConfig ─────────────────────────────────────────────────────

/// Engine observability configuration (`[observability]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log SQLite queries that exceed this threshold (milliseconds). Default: 100.
    /// Set to 0 to disable slow query logging.
    pub slow_query_threshold_ms: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 100,
        }
    }
}

// ─── LeaderboardConfig ───────────────────────────────────────────────────────

/// Leaderboard population configuration (`[leaderboard]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Include soft-deleted accounts in leaderboard populations.
    /// Default: true — matches the behavior the game has always shown, where
    /// a deleted account keeps its place in the rankings. Set to false to
    /// drop deleted accounts from every population.
    pub include_deleted: bool,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            include_deleted: true,
        }
    }
}

// ─── TOML config file ────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// Log level filter string, e.g. "debug", "info,quizledger=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured).
    log_format: Option<String>,
    /// Observability configuration (`[observability]`).
    observability: Option<ObservabilityConfig>,
    /// Leaderboard configuration (`[leaderboard]`).
    leaderboard: Option<LeaderboardConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── EngineConfig ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub log: String,
    /// Log output format: "pretty" (default) | "json".
    pub log_format: String,
    /// Observability: slow query threshold.
    pub observability: ObservabilityConfig,
    /// Leaderboard population rules.
    pub leaderboard: LeaderboardConfig,
}

impl EngineConfig {
    /// Build config from caller-supplied overrides + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. Caller / env — passed as `Some(value)` or `QUIZLEDGER_*` vars
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(data_dir: Option<PathBuf>, log: Option<String>) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let log = log
            .or(std::env::var("QUIZLEDGER_LOG").ok().filter(|s| !s.is_empty()))
            .or(toml.log)
            .unwrap_or_else(|| "info".to_string());

        let log_format = std::env::var("QUIZLEDGER_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let observability = toml.observability.unwrap_or_default();
        let leaderboard = toml.leaderboard.unwrap_or_default();

        Self {
            data_dir,
            log,
            log_format,
            observability,
            leaderboard,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(None, None)
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/quizledger
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("quizledger");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/quizledger or ~/.local/share/quizledger
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("quizledger");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("quizledger");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\quizledger
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("quizledger");
        }
    }
    // Fallback
    PathBuf::from(".quizledger")
}
