//! Value-at-risk and conditional value-at-risk of a utility distribution.
//!
//! Both read the left tail: low utilities are the bad outcomes.

use super::UtilityDistribution;
use dp_common::{Error, Result};
use dp_math::{approx_eq, neumaier_sum};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn check_alpha(alpha: f64) -> Result<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(Error::InvalidRiskLevel {
            alpha,
            expected: "[0, 1]",
        })
    }
}

fn check_non_empty(dist: &UtilityDistribution) -> Result<()> {
    if dist.is_empty() {
        Err(Error::InvalidDiagram(
            "utility distribution has no positive-probability outcome".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Smallest utility whose cumulative probability reaches `alpha`, or the
/// largest utility when rounding keeps the total below it.
pub fn value_at_risk(dist: &UtilityDistribution, alpha: f64) -> Result<f64> {
    check_alpha(alpha)?;
    check_non_empty(dist)?;

    let mut cumulative = 0.0;
    for (u, p) in dist.iter() {
        cumulative += p;
        if cumulative >= alpha || approx_eq(cumulative, alpha) {
            return Ok(u);
        }
    }
    Ok(dist.utilities()[dist.len() - 1])
}

/// Expected utility over the worst `alpha` share of outcomes.
///
/// At `alpha = 0` this is the value-at-risk at 0, the smallest utility.
pub fn conditional_value_at_risk(dist: &UtilityDistribution, alpha: f64) -> Result<f64> {
    let var = value_at_risk(dist, alpha)?;
    if alpha == 0.0 {
        return Ok(var);
    }

    let tail = || dist.iter().filter(|&(u, _)| u <= var);
    let mass = neumaier_sum(tail().map(|(_, p)| p));
    let weighted = neumaier_sum(tail().map(|(u, p)| u * p));
    Ok((weighted - (mass - alpha) * var) / alpha)
}

/// VaR and CVaR at one risk level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RiskSummary {
    pub alpha: f64,
    pub value_at_risk: f64,
    pub conditional_value_at_risk: f64,
}

impl RiskSummary {
    pub fn compute(dist: &UtilityDistribution, alpha: f64) -> Result<Self> {
        Ok(Self {
            alpha,
            value_at_risk: value_at_risk(dist, alpha)?,
            conditional_value_at_risk: conditional_value_at_risk(dist, alpha)?,
        })
    }
}
