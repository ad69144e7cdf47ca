//! Entry points that assemble a complete decision model.

use super::decision::validate_fixed_states;
use super::path::validate_forbidden_paths;
use super::{
    add_decision_variables, add_path_variables, ActivePathsCutGenerator, CutGenerator,
    DecisionVariables, LazyCut, Model, PathOptions, PathVariables, ProbabilityCutGenerator, Sense,
    VarId,
};
use crate::diagram::InfluenceDiagram;
use crate::objective::{
    conditional_value_at_risk, expected_value, weighted_objective, CvarObjective, ShiftedUtility,
};
use dp_common::{Error, ExperimentalFeature, FixedStates, ForbiddenPath, Result};
use dp_config::{ActivePathsCut, ModelConfig, ObjectiveConfig, ProbabilityCut};
use tracing::{debug, warn};

/// How to build a model from a diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    pub probability_cut: ProbabilityCut,
    pub probability_scale_factor: f64,
    pub active_paths_cut: Option<ActivePathsCut>,
    pub forbidden_paths: Vec<ForbiddenPath>,
    /// Decision nodes held at one state.
    pub fixed_states: FixedStates,
    pub variable_names: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            probability_cut: ProbabilityCut::Eager,
            probability_scale_factor: 1.0,
            active_paths_cut: None,
            forbidden_paths: Vec::new(),
            fixed_states: FixedStates::new(),
            variable_names: true,
        }
    }
}

impl From<&ModelConfig> for BuildOptions {
    fn from(config: &ModelConfig) -> Self {
        Self {
            probability_cut: config.probability_cut,
            probability_scale_factor: config.probability_scale_factor,
            active_paths_cut: config.active_paths_cut,
            forbidden_paths: config.forbidden_paths.clone(),
            fixed_states: config.fixed_states.clone(),
            variable_names: config.variable_names,
        }
    }
}

/// A model with its decision and path variables.
#[derive(Debug)]
pub struct BuiltModel {
    pub model: Model,
    pub z: DecisionVariables,
    pub x: PathVariables,
    /// Experimental features used while building.
    pub warnings: Vec<ExperimentalFeature>,
}

/// Build decision variables, path variables, linking constraints and the
/// probability conservation constraint (eager or lazy), plus the optional
/// active-paths cut.
///
/// No objective is set.
pub fn build_model<D: InfluenceDiagram + ?Sized>(
    diagram: &D,
    options: &BuildOptions,
) -> Result<BuiltModel> {
    let scale = options.probability_scale_factor;
    if !(scale > 0.0 && scale.is_finite()) {
        return Err(Error::InvalidScaleFactor { value: scale });
    }
    validate_fixed_states(diagram, &options.fixed_states)?;
    validate_forbidden_paths(diagram, &options.forbidden_paths)?;

    let active_paths = match options.active_paths_cut {
        Some(cut) => {
            if let Some(node) = diagram.chance_node_with_zero() {
                return Err(Error::ActivePathsCutUnavailable { node });
            }
            // Without chance nodes every path variable is 0 or 1.
            let epsilon = diagram.min_positive_table_probability().unwrap_or(0.0);
            let target = dp_math::checked_product(
                diagram
                    .chance_nodes()
                    .iter()
                    .map(|&c| diagram.states().count(c)),
            )
            .ok_or_else(|| Error::InvalidDiagram("path space size overflows".to_string()))?;
            Some((cut.tolerance, epsilon, target))
        }
        None => None,
    };

    let mut warnings = Vec::new();
    if !options.forbidden_paths.is_empty() {
        warnings.push(ExperimentalFeature::ForbiddenPaths);
    }
    if active_paths.is_some() {
        warnings.push(ExperimentalFeature::ActivePathsCut);
    }
    for feature in &warnings {
        warn!(feature = ?feature, "{}", feature);
    }

    let mut model = Model::with_names(options.variable_names);
    let z = add_decision_variables(&mut model, diagram, &options.fixed_states)?;
    let x = add_path_variables(
        &mut model,
        diagram,
        &z,
        &PathOptions {
            forbidden: &options.forbidden_paths,
            fixed: &options.fixed_states,
        },
    )?;

    let terms: Vec<(VarId, f64)> = x
        .iter()
        .map(|(path, var)| (var, diagram.path_probability(path)))
        .collect();
    let probability_cut = ProbabilityCutGenerator::new(terms, scale);
    match options.probability_cut {
        ProbabilityCut::Eager => {
            model.add_constraint(probability_cut.constraint());
        }
        ProbabilityCut::Lazy => model.add_lazy_cut(LazyCut::new(probability_cut)),
    }

    if let Some((tolerance, epsilon, target)) = active_paths {
        model.add_lazy_cut(LazyCut::new(ActivePathsCutGenerator::new(
            x.vars().collect(),
            epsilon,
            target,
            tolerance,
        )));
    }

    let stats = model.stats();
    debug!(
        variables = stats.variables,
        binaries = stats.binaries,
        constraints = stats.constraints,
        lazy_cuts = stats.lazy_cuts,
        probability_cut = %options.probability_cut,
        "decision model built"
    );

    Ok(BuiltModel {
        model,
        z,
        x,
        warnings,
    })
}

/// A built model with its objective set.
#[derive(Debug)]
pub struct CompiledModel {
    pub built: BuiltModel,
    /// CVaR variables, when the objective uses CVaR.
    pub cvar: Option<CvarObjective>,
    /// Amount subtracted from every utility before building the objective.
    pub utility_offset: f64,
}

/// Build a model from a validated configuration and set a maximizing
/// objective.
pub fn compile<D: InfluenceDiagram + ?Sized>(
    diagram: &D,
    config: &ModelConfig,
) -> Result<CompiledModel> {
    dp_config::validate_model_config(config)?;

    let shifted = ShiftedUtility::new(diagram, config.utility_shift);
    let mut built = build_model(&shifted, &BuildOptions::from(config))?;
    let scale = config.probability_scale_factor;

    let (expr, cvar) = match config.objective {
        ObjectiveConfig::ExpectedValue => (expected_value(&shifted, &built.x, scale)?, None),
        ObjectiveConfig::Cvar { alpha } => {
            let cvar =
                conditional_value_at_risk(&mut built.model, &shifted, &built.x, alpha, scale)?;
            (cvar.expr.clone(), Some(cvar))
        }
        ObjectiveConfig::Weighted { alpha, weight } => {
            let ev = expected_value(&shifted, &built.x, scale)?;
            let cvar =
                conditional_value_at_risk(&mut built.model, &shifted, &built.x, alpha, scale)?;
            let expr = weighted_objective(&[(weight, &ev), (1.0 - weight, &cvar.expr)]);
            (expr, Some(cvar))
        }
    };
    built.model.set_objective(Sense::Maximize, expr);

    debug!(
        objective = config.objective.name(),
        utility_shift = %config.utility_shift,
        "objective set"
    );

    Ok(CompiledModel {
        built,
        cvar,
        utility_offset: shifted.offset(),
    })
}
