//! Decision Programming Core Library
//!
//! Compiles an influence diagram into a mixed-integer program and analyzes
//! the decision strategies a solver returns:
//! - Compatible-path enumeration
//! - Model building with eager or lazy probability cuts
//! - Expected-value and CVaR objectives
//! - Strategy extraction from solved decision variables
//! - Utility distributions, state probabilities and risk measures
//!
//! Solving is delegated to an external [`solver::Solver`]. The binary entry
//! point is in `main.rs`.

pub mod analysis;
pub mod diagram;
pub mod exit_codes;
pub mod export;
pub mod logging;
pub mod model;
pub mod objective;
pub mod paths;
pub mod solver;
pub mod strategy;
pub mod tabular;

pub use diagram::InfluenceDiagram;
pub use paths::{paths, CompatiblePaths};
pub use strategy::{extract_strategy, DecisionStrategy, LocalDecisionStrategy};
