//! Decision programming model configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for model.json
//! - Config resolution (CLI → env → XDG → defaults)
//! - Named presets
//! - Semantic validation
//! - Config snapshots for build reproducibility

pub mod model;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use model::{ActivePathsCut, ModelConfig, ObjectiveConfig, ProbabilityCut, UtilityShift};
pub use preset::{get_preset, list_presets, PresetInfo, PresetName};
pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_model_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
