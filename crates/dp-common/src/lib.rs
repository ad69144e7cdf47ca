//! Decision programming common types and errors.
//!
//! Foundational types shared across the workspace:
//! - Node roles and decision-node information sets
//! - State spaces, paths and path filters
//! - The unified error type with stable codes
//! - Output format specifications

pub mod error;
pub mod node;
pub mod output;
pub mod path;

pub use error::{Error, ErrorCategory, ExperimentalFeature, Result, StructuredError};
pub use node::{DecisionNode, NodeIndex, NodeRole, State};
pub use output::OutputFormat;
pub use path::{is_forbidden, FixedStates, ForbiddenPath, MixedRadix, Path, StateSpace};
