//! Error types for decision programming.
//!
//! Every error carries:
//! - a stable code for machine parsing
//! - a category for grouping
//! - a headline and remediation hint for humans
//!
//! Errors raised while building or interpreting a model describe a malformed
//! request, not a transient fault, and are never retried. Solver failures are
//! not represented here; they are returned unmodified by the solver seam.
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 12,
//!   "category": "request",
//!   "message": "invalid risk level: alpha must be in (0, 1], got 1.5",
//!   "recoverable": false,
//!   "suggested_action": "fix_input",
//!   "context": { "alpha": 1.5 }
//! }
//! ```

use crate::node::{NodeIndex, NodeRole, State};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Result type alias for decision programming operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The caller supplied an argument outside its domain.
    Request,
    /// A solved or supplied strategy violates a structural invariant.
    Consistency,
    /// Model configuration errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Request => write!(f, "request"),
            ErrorCategory::Consistency => write!(f, "consistency"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for agents to take in response to errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Correct the offending argument or input file.
    FixInput,
    /// Inspect the solver status and solution.
    CheckSolver,
    /// Reset configuration to a preset.
    ResetConfig,
    /// Retry the operation.
    Retry,
    /// No action possible.
    Abort,
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::CheckSolver => write!(f, "check_solver"),
            SuggestedAction::ResetConfig => write!(f, "reset_config"),
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::Abort => write!(f, "abort"),
        }
    }
}

/// Unified error type.
#[derive(Error, Debug)]
pub enum Error {
    // Request errors (10-19)
    #[error("invalid fixed state: node {node} is a {role} node and cannot be fixed here")]
    InvalidFixedState { node: NodeIndex, role: NodeRole },

    #[error("invalid probability scale factor: must be greater than 0, got {value}")]
    InvalidScaleFactor { value: f64 },

    #[error("invalid risk level: alpha must be in {expected}, got {alpha}")]
    InvalidRiskLevel { alpha: f64, expected: &'static str },

    #[error("unknown node class: {0}")]
    UnknownNodeClass(String),

    #[error("state {state} out of range for node {node} with {count} states")]
    InvalidState {
        node: NodeIndex,
        state: State,
        count: usize,
    },

    #[error("active paths cut unavailable: chance node {node} has structural zero probabilities")]
    ActivePathsCutUnavailable { node: NodeIndex },

    #[error("cannot condition on node {node} = {state}: event has zero probability")]
    ImpossibleCondition { node: NodeIndex, state: State },

    #[error("invalid diagram: {0}")]
    InvalidDiagram(String),

    // Consistency errors (20-29)
    #[error("malformed strategy at decision node {node}, row {row}: expected exactly one selected state, got {selected}")]
    MalformedStrategy {
        node: NodeIndex,
        row: usize,
        selected: usize,
    },

    #[error("invalid local decision strategy for node {node}: {message}")]
    InvalidStrategy { node: NodeIndex, message: String },

    // Configuration errors (30-39)
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code.
    ///
    /// - 10-19: request errors
    /// - 20-29: consistency errors
    /// - 30-39: configuration errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidFixedState { .. } => 10,
            Error::InvalidScaleFactor { .. } => 11,
            Error::InvalidRiskLevel { .. } => 12,
            Error::UnknownNodeClass(_) => 13,
            Error::InvalidState { .. } => 14,
            Error::ActivePathsCutUnavailable { .. } => 15,
            Error::ImpossibleCondition { .. } => 16,
            Error::InvalidDiagram(_) => 17,
            Error::MalformedStrategy { .. } => 20,
            Error::InvalidStrategy { .. } => 21,
            Error::Config(_) => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidFixedState { .. }
            | Error::InvalidScaleFactor { .. }
            | Error::InvalidRiskLevel { .. }
            | Error::UnknownNodeClass(_)
            | Error::InvalidState { .. }
            | Error::ActivePathsCutUnavailable { .. }
            | Error::ImpossibleCondition { .. }
            | Error::InvalidDiagram(_) => ErrorCategory::Request,

            Error::MalformedStrategy { .. } | Error::InvalidStrategy { .. } => {
                ErrorCategory::Consistency
            }

            Error::Config(_) => ErrorCategory::Config,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether retrying with the same inputs can succeed.
    ///
    /// Only I/O errors qualify; everything else is deterministic in its inputs.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Returns the suggested action for agents.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self.category() {
            ErrorCategory::Request => SuggestedAction::FixInput,
            ErrorCategory::Consistency => match self {
                Error::MalformedStrategy { .. } => SuggestedAction::CheckSolver,
                _ => SuggestedAction::FixInput,
            },
            ErrorCategory::Config => SuggestedAction::ResetConfig,
            ErrorCategory::Io => match self {
                Error::Io(_) => SuggestedAction::Retry,
                _ => SuggestedAction::FixInput,
            },
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::InvalidFixedState { .. } => {
                "Compatible paths fix chance nodes only; model building fixes decision nodes only."
            }
            Error::InvalidScaleFactor { .. } => "Use a probability scale factor greater than 0.",
            Error::InvalidRiskLevel { .. } => {
                "Use a risk level in (0, 1] for CVaR objectives and [0, 1] for statistics."
            }
            Error::UnknownNodeClass(_) => "Node roles must be one of: chance, decision, value.",
            Error::InvalidState { .. } => "State indices are 0-based and must be below the node's state count.",
            Error::ActivePathsCutUnavailable { .. } => {
                "Disable the active paths cut or remove zero entries from the probability tables."
            }
            Error::ImpossibleCondition { .. } => {
                "Condition only on states with positive probability under the strategy."
            }
            Error::InvalidDiagram(_) => "Check node parents, state labels and table sizes.",
            Error::MalformedStrategy { .. } => {
                "The solver returned a fractional or empty decision row. Check the solve status and integrality tolerance."
            }
            Error::InvalidStrategy { .. } => {
                "Each information state must select exactly one decision state."
            }
            Error::Config(_) => "Run 'dp-core config show' to inspect the resolved configuration.",
            Error::Io(_) => "Check that the file exists and is readable.",
            Error::Json(_) => "Check the JSON syntax of the input file.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::InvalidFixedState { .. } => "Invalid Fixed State",
            Error::InvalidScaleFactor { .. } => "Invalid Scale Factor",
            Error::InvalidRiskLevel { .. } => "Invalid Risk Level",
            Error::UnknownNodeClass(_) => "Unknown Node Class",
            Error::InvalidState { .. } => "State Out Of Range",
            Error::ActivePathsCutUnavailable { .. } => "Active Paths Cut Unavailable",
            Error::ImpossibleCondition { .. } => "Impossible Condition",
            Error::InvalidDiagram(_) => "Invalid Diagram",
            Error::MalformedStrategy { .. } => "Malformed Strategy",
            Error::InvalidStrategy { .. } => "Invalid Strategy",
            Error::Config(_) => "Configuration Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Experimental features that raise a non-fatal warning when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentalFeature {
    /// Filtering of forbidden paths.
    ForbiddenPaths,
    /// Lazy cut on the number of active paths.
    ActivePathsCut,
}

impl fmt::Display for ExperimentalFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentalFeature::ForbiddenPaths => {
                write!(f, "forbidden paths is still an experimental feature")
            }
            ExperimentalFeature::ActivePathsCut => {
                write!(f, "active paths cut is still an experimental feature")
            }
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    pub suggested_action: SuggestedAction,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidFixedState { node, role } => {
                context.insert("node".to_string(), serde_json::json!(node));
                context.insert("role".to_string(), serde_json::json!(role));
            }
            Error::InvalidScaleFactor { value } => {
                context.insert("scale_factor".to_string(), serde_json::json!(value));
            }
            Error::InvalidRiskLevel { alpha, .. } => {
                context.insert("alpha".to_string(), serde_json::json!(alpha));
            }
            Error::InvalidState { node, state, count } => {
                context.insert("node".to_string(), serde_json::json!(node));
                context.insert("state".to_string(), serde_json::json!(state));
                context.insert("count".to_string(), serde_json::json!(count));
            }
            Error::MalformedStrategy { node, row, .. } => {
                context.insert("node".to_string(), serde_json::json!(node));
                context.insert("row".to_string(), serde_json::json!(row));
            }
            Error::ImpossibleCondition { node, state } => {
                context.insert("node".to_string(), serde_json::json!(node));
                context.insert("state".to_string(), serde_json::json!(state));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_follow_categories() {
        let cases = [
            Error::InvalidFixedState {
                node: 1,
                role: NodeRole::Decision,
            },
            Error::InvalidScaleFactor { value: 0.0 },
            Error::InvalidRiskLevel {
                alpha: 2.0,
                expected: "(0, 1]",
            },
            Error::UnknownNodeClass("x".to_string()),
            Error::MalformedStrategy {
                node: 2,
                row: 0,
                selected: 0,
            },
            Error::Config("bad".to_string()),
        ];
        for err in &cases {
            let code = err.code();
            match err.category() {
                ErrorCategory::Request => assert!((10..20).contains(&code)),
                ErrorCategory::Consistency => assert!((20..30).contains(&code)),
                ErrorCategory::Config => assert!((30..40).contains(&code)),
                ErrorCategory::Io => assert!((60..70).contains(&code)),
            }
            assert!(!err.is_recoverable());
        }
    }

    #[test]
    fn malformed_strategy_points_at_solver() {
        let err = Error::MalformedStrategy {
            node: 2,
            row: 1,
            selected: 2,
        };
        assert_eq!(err.suggested_action(), SuggestedAction::CheckSolver);
        assert_eq!(err.headline(), "Malformed Strategy");
    }

    #[test]
    fn structured_error_carries_context() {
        let err = Error::InvalidRiskLevel {
            alpha: 1.5,
            expected: "(0, 1]",
        };
        let structured = StructuredError::from(&err);
        assert_eq!(structured.code, 12);
        assert_eq!(structured.category, ErrorCategory::Request);
        assert_eq!(structured.context["alpha"], serde_json::json!(1.5));

        let json = structured.to_json();
        assert!(json.contains("\"suggested_action\":\"fix_input\""));
    }

    #[test]
    fn experimental_feature_messages() {
        assert!(ExperimentalFeature::ForbiddenPaths
            .to_string()
            .contains("experimental"));
    }
}
