//! Statistics of a fixed decision strategy.
//!
//! Everything here enumerates the strategy's compatible paths; no model or
//! solver is involved.

pub mod distribution;
pub mod risk;
pub mod state_probs;

pub use distribution::UtilityDistribution;
pub use risk::{conditional_value_at_risk, value_at_risk, RiskSummary};
pub use state_probs::StateProbabilities;
