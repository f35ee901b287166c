//! Configuration model.
//!
//! Every section falls back to its defaults, so an empty or partial
//! `config.toml` is valid.

use crate::session::{NewSession, SESSIONS_BLOB_KEY};
use crate::voting::{EvaluationMethod, RankScoring, ScoreStep, VotingEngine};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Shortest reconciliation interval accepted from configuration.
pub const MIN_SYNC_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub voting: VotingConfig,
    pub defaults: SessionDefaults,
    pub invitation: InvitationConfig,
}

/// Where sessions are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// One directory per origin-scoped substrate. Empty means "use the
    /// default origin".
    pub origins: Vec<PathBuf>,
    pub blob_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            origins: Vec::new(),
            blob_key: SESSIONS_BLOB_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { interval_ms: 1500 }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_SYNC_INTERVAL_MS))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    pub direct_step: ScoreStep,
    pub rank_scoring: RankScoring,
}

impl VotingConfig {
    pub fn engine(&self) -> VotingEngine {
        VotingEngine::new(self.direct_step, self.rank_scoring)
    }
}

/// Values used when the organizer leaves a create field empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub name: String,
    pub capacity: i64,
    pub object_count: i64,
    pub method: EvaluationMethod,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        let spec = NewSession::default();
        Self {
            name: crate::session::DEFAULT_SESSION_NAME.to_string(),
            capacity: spec.capacity,
            object_count: spec.object_count,
            method: spec.method,
        }
    }
}

impl SessionDefaults {
    /// Fills the unset parts of a create request.
    pub fn apply(
        &self,
        name: Option<String>,
        capacity: Option<i64>,
        object_count: Option<i64>,
        method: Option<EvaluationMethod>,
    ) -> NewSession {
        NewSession {
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| self.name.clone()),
            capacity: capacity.unwrap_or(self.capacity),
            object_count: object_count.unwrap_or(self.object_count),
            method: method.unwrap_or(self.method),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvitationConfig {
    pub base_url: String,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config: TallyConfig = toml::from_str("").unwrap();
        assert_eq!(config, TallyConfig::default());
        assert_eq!(config.storage.blob_key, SESSIONS_BLOB_KEY);
        assert_eq!(config.sync.interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_partial_toml() {
        let config: TallyConfig = toml::from_str(
            r#"
            [sync]
            interval_ms = 10

            [voting]
            direct_step = "half"
            rank_scoring = "position"

            [defaults]
            method = "pairwise"
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.interval(), Duration::from_millis(MIN_SYNC_INTERVAL_MS));
        assert_eq!(config.voting.engine().direct_step, ScoreStep::Half);
        assert_eq!(config.voting.rank_scoring, RankScoring::Position);
        assert_eq!(config.defaults.method, EvaluationMethod::Pairwise);
        assert_eq!(config.defaults.object_count, 4);
    }

    #[test]
    fn test_defaults_apply() {
        let defaults = SessionDefaults::default();
        let spec = defaults.apply(Some(" ".to_string()), Some(8), None, None);
        assert_eq!(spec.name, crate::session::DEFAULT_SESSION_NAME);
        assert_eq!(spec.capacity, 8);
        assert_eq!(spec.object_count, 4);
        assert_eq!(spec.method, EvaluationMethod::Direct);
    }
}
