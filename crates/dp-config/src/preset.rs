//! Model configuration presets.
//!
//! - Default: eager probability cut, expected-value objective
//! - Lazy: probability cut submitted through the solver callback
//! - RiskAverse: CVaR objective on a positively shifted utility scale

use crate::model::{ModelConfig, ObjectiveConfig, ProbabilityCut, UtilityShift};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetName {
    /// Eager probability cut, expected value
    Default,
    /// Lazy probability cut, expected value
    Lazy,
    /// CVaR at the 10% tail with shifted utilities
    RiskAverse,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] =
        &[PresetName::Default, PresetName::Lazy, PresetName::RiskAverse];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Default => "default",
            PresetName::Lazy => "lazy",
            PresetName::RiskAverse => "risk-averse",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "default" | "eager" => Some(PresetName::Default),
            "lazy" | "lazy-cut" => Some(PresetName::Lazy),
            "risk-averse" | "risk_averse" | "cvar" => Some(PresetName::RiskAverse),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Default => "Probability cut added at build time, maximize expected utility",
            PresetName::Lazy => {
                "Probability cut submitted lazily by the solver callback, maximize expected utility"
            }
            PresetName::RiskAverse => {
                "Maximize CVaR of the worst 10% of outcomes on a positive utility scale"
            }
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone)]
pub enum PresetError {
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => write!(
                f,
                "Unknown preset '{}'. Available: {}",
                name,
                PresetName::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl std::error::Error for PresetError {}

/// Get the configuration for a preset.
pub fn get_preset(name: PresetName) -> ModelConfig {
    match name {
        PresetName::Default => ModelConfig::default(),
        PresetName::Lazy => ModelConfig {
            probability_cut: ProbabilityCut::Lazy,
            ..ModelConfig::default()
        },
        PresetName::RiskAverse => ModelConfig {
            objective: ObjectiveConfig::Cvar { alpha: 0.1 },
            utility_shift: UtilityShift::Positive,
            ..ModelConfig::default()
        },
    }
}

/// Information about a preset for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
    pub probability_cut: String,
    pub objective: String,
}

impl PresetInfo {
    pub fn from_preset(name: PresetName) -> Self {
        let config = get_preset(name);
        Self {
            name: name.as_str().to_string(),
            description: name.description().to_string(),
            probability_cut: config.probability_cut.to_string(),
            objective: config.objective.name().to_string(),
        }
    }
}

/// List all available presets with summary information.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo::from_preset(name))
        .collect()
}
