//! Model compilation settings.
//!
//! A `ModelConfig` describes how an influence diagram is compiled into a
//! mixed-integer program: how probability conservation is enforced, which
//! objective is built, and which paths are filtered out.

use dp_common::{FixedStates, ForbiddenPath};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validate::ValidationError;

/// How the probability conservation constraint is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbabilityCut {
    /// Added to the model at build time.
    #[default]
    Eager,
    /// Submitted by a solver callback the first time a candidate violates it.
    Lazy,
}

impl fmt::Display for ProbabilityCut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbabilityCut::Eager => write!(f, "eager"),
            ProbabilityCut::Lazy => write!(f, "lazy"),
        }
    }
}

/// Lazy cut on the number of active path variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivePathsCut {
    /// Allowed absolute drift of the active-path count from its target.
    #[serde(default = "default_active_paths_tolerance")]
    pub tolerance: f64,
}

fn default_active_paths_tolerance() -> f64 {
    0.9
}

impl Default for ActivePathsCut {
    fn default() -> Self {
        Self {
            tolerance: default_active_paths_tolerance(),
        }
    }
}

/// Objective to build on top of the path variables.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectiveConfig {
    /// Maximize expected utility.
    #[default]
    ExpectedValue,
    /// Maximize conditional value-at-risk at level `alpha`.
    Cvar { alpha: f64 },
    /// Maximize `weight * EV + (1 - weight) * CVaR_alpha`.
    Weighted { alpha: f64, weight: f64 },
}

impl ObjectiveConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectiveConfig::ExpectedValue => "expected_value",
            ObjectiveConfig::Cvar { .. } => "cvar",
            ObjectiveConfig::Weighted { .. } => "weighted",
        }
    }

    /// Risk level used by the objective, if any.
    pub fn alpha(&self) -> Option<f64> {
        match self {
            ObjectiveConfig::ExpectedValue => None,
            ObjectiveConfig::Cvar { alpha } | ObjectiveConfig::Weighted { alpha, .. } => {
                Some(*alpha)
            }
        }
    }
}

/// Affine shift applied to path utilities before building objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilityShift {
    /// Utilities are used as given.
    #[default]
    None,
    /// Shift so the smallest utility becomes 1.
    Positive,
    /// Shift so the largest utility becomes -1.
    Negative,
}

impl fmt::Display for UtilityShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtilityShift::None => write!(f, "none"),
            UtilityShift::Positive => write!(f, "positive"),
            UtilityShift::Negative => write!(f, "negative"),
        }
    }
}

/// Complete model compilation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub schema_version: String,

    #[serde(default)]
    pub probability_cut: ProbabilityCut,

    #[serde(default = "default_scale_factor")]
    pub probability_scale_factor: f64,

    #[serde(default)]
    pub active_paths_cut: Option<ActivePathsCut>,

    #[serde(default)]
    pub objective: ObjectiveConfig,

    #[serde(default)]
    pub utility_shift: UtilityShift,

    /// Whether variables get descriptive names (`z1[0,1]`, `x[0,1,0]`).
    #[serde(default = "default_true")]
    pub variable_names: bool,

    #[serde(default)]
    pub forbidden_paths: Vec<ForbiddenPath>,

    #[serde(default)]
    pub fixed_states: FixedStates,
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            probability_cut: ProbabilityCut::Eager,
            probability_scale_factor: default_scale_factor(),
            active_paths_cut: None,
            objective: ObjectiveConfig::ExpectedValue,
            utility_shift: UtilityShift::None,
            variable_names: true,
            forbidden_paths: Vec::new(),
            fixed_states: FixedStates::new(),
        }
    }
}

impl ModelConfig {
    /// Load a model configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    /// Parse a model configuration from a JSON string.
    pub fn parse_json(content: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))
    }
}
