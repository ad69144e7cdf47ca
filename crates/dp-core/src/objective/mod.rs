//! Objective builders over the path variables.
//!
//! Each builder returns a [`LinearExpr`](crate::model::LinearExpr); the
//! caller decides the sense via [`Model::set_objective`](crate::model::Model::set_objective).

pub mod cvar;
pub mod expected;
pub mod transform;

pub use cvar::{conditional_value_at_risk, CvarObjective, TailVariables};
pub use expected::{expected_value, weighted_objective};
pub use transform::ShiftedUtility;

use dp_common::{Error, Result};

pub(crate) fn check_scale(scale: f64) -> Result<()> {
    if scale > 0.0 && scale.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidScaleFactor { value: scale })
    }
}
