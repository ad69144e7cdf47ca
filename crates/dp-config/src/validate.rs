//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::model::{ModelConfig, ObjectiveConfig};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 31,
            ValidationError::VersionMismatch { .. } => 32,
        }
    }
}

impl From<ValidationError> for dp_common::Error {
    fn from(err: ValidationError) -> Self {
        dp_common::Error::Config(err.to_string())
    }
}

/// Validate a model configuration semantically.
pub fn validate_model_config(config: &ModelConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    let scale = config.probability_scale_factor;
    if !(scale.is_finite() && scale > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: "probability_scale_factor".to_string(),
            message: format!("Must be a finite value greater than 0, got {}", scale),
        });
    }

    if let Some(cut) = &config.active_paths_cut {
        if !(cut.tolerance.is_finite() && cut.tolerance >= 0.0) {
            return Err(ValidationError::InvalidValue {
                field: "active_paths_cut.tolerance".to_string(),
                message: format!("Must be non-negative, got {}", cut.tolerance),
            });
        }
    }

    match config.objective {
        ObjectiveConfig::ExpectedValue => {}
        ObjectiveConfig::Cvar { alpha } => validate_alpha("objective.alpha", alpha)?,
        ObjectiveConfig::Weighted { alpha, weight } => {
            validate_alpha("objective.alpha", alpha)?;
            if !(0.0..=1.0).contains(&weight) {
                return Err(ValidationError::InvalidValue {
                    field: "objective.weight".to_string(),
                    message: format!("Must be in [0, 1], got {}", weight),
                });
            }
        }
    }

    for (i, rule) in config.forbidden_paths.iter().enumerate() {
        if rule.states.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("forbidden_paths[{}].states", i),
                message: "Must list at least one state".to_string(),
            });
        }
    }

    Ok(())
}

fn validate_alpha(field: &str, alpha: f64) -> ValidationResult<()> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be in (0, 1], got {}", alpha),
        })
    }
}
