//! Configuration snapshots for build reproducibility.
//!
//! A snapshot captures the model configuration a build was run with, so
//! an exported model can be traced back to the exact settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::ModelConfig;
use crate::resolve::{ConfigPath, ConfigSource};

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path where the configuration was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub config_source: String,

    /// SHA-256 hash of the canonical configuration JSON.
    pub config_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub objective: String,
    #[serde(default)]
    pub alpha: Option<f64>,
    pub probability_cut: String,
    pub probability_scale_factor: f64,
    pub active_paths_cut: bool,
    pub utility_shift: String,
    pub forbidden_path_rules: usize,
    pub fixed_states: usize,
}

impl ConfigSnapshot {
    /// Create a snapshot of a resolved configuration.
    ///
    /// The hash is taken over the re-serialized config, so two files that
    /// differ only in whitespace or omitted defaults produce the same hash.
    pub fn new(config: &ModelConfig, path: &ConfigPath) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            config_path: path.path.as_ref().map(|p| p.display().to_string()),
            config_source: path.source.to_string(),
            config_hash: hash_config(config),
            summary: ConfigSummary::from_config(config),
        }
    }

    /// Create a snapshot with only defaults (no config file loaded).
    pub fn defaults_only() -> Self {
        let path = ConfigPath {
            path: None,
            source: ConfigSource::BuiltinDefault,
        };
        Self::new(&ModelConfig::default(), &path)
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot matches another (same config).
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.config_hash == other.config_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.config_hash[..12.min(self.config_hash.len())]
    }
}

impl ConfigSummary {
    pub fn from_config(config: &ModelConfig) -> Self {
        ConfigSummary {
            objective: config.objective.name().to_string(),
            alpha: config.objective.alpha(),
            probability_cut: config.probability_cut.to_string(),
            probability_scale_factor: config.probability_scale_factor,
            active_paths_cut: config.active_paths_cut.is_some(),
            utility_shift: config.utility_shift.to_string(),
            forbidden_path_rules: config.forbidden_paths.len(),
            fixed_states: config.fixed_states.len(),
        }
    }
}

fn hash_config(config: &ModelConfig) -> String {
    // Serializing a plain struct of maps and scalars cannot fail.
    let canonical = serde_json::to_string(config).unwrap_or_default();
    hash_content(&canonical)
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
