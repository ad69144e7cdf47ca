//! Decision programming CLI.
//!
//! Compiles tabular influence diagrams into mixed-integer programs and
//! analyzes decision strategies. Payloads go to stdout, logs and errors to
//! stderr.

use clap::{Args, Parser, Subcommand};
use dp_common::{Error, OutputFormat, StructuredError};
use dp_config::{
    get_preset, list_presets, resolve_config, ConfigPath, ConfigSnapshot, ConfigSource,
    ModelConfig, PresetName,
};
use dp_core::analysis::{RiskSummary, StateProbabilities, UtilityDistribution};
use dp_core::exit_codes::ExitCode;
use dp_core::export::write_lp;
use dp_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use dp_core::model::compile;
use dp_core::tabular::{StrategySpec, TabularDiagram};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Schema version of JSON payloads printed on stdout.
const SCHEMA_VERSION: &str = "1.0.0";

/// Decision programming: influence diagrams to mixed-integer programs
#[derive(Parser)]
#[command(name = "dp-core")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (overrides DP_LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a decision strategy: utility distribution, risk and state probabilities
    Analyze(AnalyzeArgs),

    /// Compile a diagram into a model and report its size
    Build(BuildArgs),

    /// Show and inspect model configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Diagram JSON file
    #[arg(long)]
    diagram: PathBuf,

    /// Strategy JSON file (decision node name to chosen state per row)
    #[arg(long)]
    strategy: PathBuf,

    /// Risk level for VaR and CVaR; repeatable
    #[arg(long = "alpha")]
    alphas: Vec<f64>,

    /// Condition state probabilities on NODE=STATE; repeatable, applied in order
    #[arg(long = "condition", value_name = "NODE=STATE")]
    conditions: Vec<String>,
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Diagram JSON file
    #[arg(long)]
    diagram: PathBuf,

    /// Model configuration file (falls back to DP_MODEL_CONFIG, then XDG)
    #[arg(long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Use a named preset instead of a configuration file
    #[arg(long)]
    preset: Option<PresetName>,

    /// Write the model in CPLEX LP format to this file
    #[arg(long)]
    lp: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved model configuration
    Show {
        /// Model configuration file
        #[arg(long, conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Show a named preset
        #[arg(long)]
        preset: Option<PresetName>,
    },
    /// List available presets
    Presets,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) {
                err.exit();
            }
            let _ = err.print();
            std::process::exit(ExitCode::ArgsError.as_i32());
        }
    };

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let run_id = generate_run_id();
    debug!(run_id = %run_id, "starting");

    let result = match &cli.command {
        Commands::Analyze(args) => run_analyze(&cli.global, &run_id, args),
        Commands::Build(args) => run_build(&cli.global, &run_id, args),
        Commands::Config(args) => run_config(&cli.global, &run_id, args),
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Ok,
        Err(err) => output_error(&cli.global, &err),
    };
    std::process::exit(exit_code.as_i32());
}

fn output_error(global: &GlobalOpts, err: &Error) -> ExitCode {
    let code = ExitCode::from(err);
    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(err);
            let response = serde_json::json!({
                "exit_code": code.as_i32(),
                "exit_code_name": code.code_name(),
                "error": structured,
            });
            eprintln!("{}", response);
        }
        OutputFormat::Human => {
            eprintln!("error[{}]: {}", err.code(), err.headline());
            eprintln!("  {}", err);
            eprintln!("  hint: {}", err.remediation());
        }
    }
    code
}

fn print_json(value: &serde_json::Value) -> Result<(), Error> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{}", text);
    Ok(())
}

// ============================================================================
// analyze
// ============================================================================

fn run_analyze(global: &GlobalOpts, run_id: &str, args: &AnalyzeArgs) -> Result<(), Error> {
    let diagram = TabularDiagram::from_file(&args.diagram)?;
    let strategy_spec: StrategySpec =
        serde_json::from_str(&std::fs::read_to_string(&args.strategy)?)?;
    let strategy = diagram.strategy_from_spec(&strategy_spec)?;

    let distribution = UtilityDistribution::new(&diagram, &strategy)?;
    let risk = args
        .alphas
        .iter()
        .map(|&alpha| RiskSummary::compute(&distribution, alpha))
        .collect::<Result<Vec<_>, _>>()?;

    let mut probabilities = StateProbabilities::new(&diagram, &strategy)?;
    for condition in &args.conditions {
        let (name, label) = parse_condition(condition)?;
        let (node, state) = diagram.lookup(name, label)?;
        probabilities = probabilities.condition(&diagram, &strategy, node, state)?;
    }

    info!(
        outcomes = distribution.len(),
        conditions = args.conditions.len(),
        "strategy analyzed"
    );

    match global.format {
        OutputFormat::Json => {
            let outcomes: Vec<_> = distribution
                .iter()
                .map(|(u, p)| serde_json::json!({ "utility": u, "probability": p }))
                .collect();
            let states: serde_json::Map<String, serde_json::Value> = probabilities
                .iter()
                .map(|(node, probs)| {
                    let by_label: serde_json::Map<String, serde_json::Value> = diagram
                        .state_labels(node)
                        .iter()
                        .zip(probs)
                        .map(|(label, p)| (label.clone(), serde_json::json!(p)))
                        .collect();
                    (diagram.node_name(node).to_string(), by_label.into())
                })
                .collect();
            let conditioned_on: serde_json::Map<String, serde_json::Value> = probabilities
                .fixed()
                .iter()
                .map(|(&node, &state)| {
                    (
                        diagram.node_name(node).to_string(),
                        serde_json::json!(diagram.state_labels(node)[state]),
                    )
                })
                .collect();
            print_json(&serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "strategy": diagram.strategy_to_spec(&strategy),
                "expected_value": distribution.expected_value(),
                "utility_distribution": outcomes,
                "risk": risk,
                "state_probabilities": {
                    "conditioned_on": conditioned_on,
                    "nodes": states,
                },
            }))
        }
        OutputFormat::Human => {
            println!("expected value: {}", distribution.expected_value());
            println!("utility distribution:");
            for (u, p) in distribution.iter() {
                println!("  {:>12}  {:.6}", u, p);
            }
            for summary in &risk {
                println!(
                    "alpha {}: VaR {}  CVaR {}",
                    summary.alpha, summary.value_at_risk, summary.conditional_value_at_risk
                );
            }
            if args.conditions.is_empty() {
                println!("state probabilities:");
            } else {
                println!("state probabilities given {}:", args.conditions.join(", "));
            }
            for (node, probs) in probabilities.iter() {
                let cells: Vec<String> = diagram
                    .state_labels(node)
                    .iter()
                    .zip(probs)
                    .map(|(label, p)| format!("{}={:.4}", label, p))
                    .collect();
                println!("  {}: {}", diagram.node_name(node), cells.join(" "));
            }
            Ok(())
        }
    }
}

fn parse_condition(raw: &str) -> Result<(&str, &str), Error> {
    raw.split_once('=')
        .map(|(name, label)| (name.trim(), label.trim()))
        .filter(|(name, label)| !name.is_empty() && !label.is_empty())
        .ok_or_else(|| Error::InvalidDiagram(format!("condition '{}' is not NODE=STATE", raw)))
}

// ============================================================================
// build
// ============================================================================

fn run_build(global: &GlobalOpts, run_id: &str, args: &BuildArgs) -> Result<(), Error> {
    let diagram = TabularDiagram::from_file(&args.diagram)?;
    let (config, config_path) = load_model_config(args.config.as_deref(), args.preset)?;
    let snapshot = ConfigSnapshot::new(&config, &config_path);

    let compiled = compile(&diagram, &config)?;
    let stats = compiled.built.model.stats();
    info!(
        variables = stats.variables,
        constraints = stats.constraints,
        lazy_cuts = stats.lazy_cuts,
        config = snapshot.short_id(),
        "model compiled"
    );

    if let Some(path) = &args.lp {
        let file = std::fs::File::create(path)?;
        let mut out = BufWriter::new(file);
        write_lp(&compiled.built.model, &mut out)?;
        out.flush()?;
        info!(path = %path.display(), "LP file written");
    }

    let warnings: Vec<String> = compiled
        .built
        .warnings
        .iter()
        .map(ToString::to_string)
        .collect();

    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "run_id": run_id,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "objective": config.objective.name(),
            "utility_offset": compiled.utility_offset,
            "stats": stats,
            "decision_nodes": compiled.built.z.len(),
            "paths": compiled.built.x.len(),
            "cvar": compiled.cvar.as_ref().map(|c| serde_json::json!({
                "alpha": c.alpha,
                "big_m": c.big_m,
                "epsilon": c.epsilon,
            })),
            "warnings": warnings,
            "lp_path": args.lp.as_ref().map(|p| p.display().to_string()),
            "config": snapshot,
        })),
        OutputFormat::Human => {
            println!(
                "objective: {} (config {}, {})",
                config.objective.name(),
                snapshot.short_id(),
                snapshot.config_source
            );
            println!(
                "variables: {} ({} binary, {} continuous)",
                stats.variables, stats.binaries, stats.continuous
            );
            println!("constraints: {}", stats.constraints);
            println!("lazy cuts: {}", stats.lazy_cuts);
            println!("paths: {}", compiled.built.x.len());
            if compiled.utility_offset != 0.0 {
                println!("utility offset: {}", compiled.utility_offset);
            }
            for warning in &warnings {
                println!("warning: {}", warning);
            }
            if let Some(path) = &args.lp {
                println!("LP written to {}", path.display());
            }
            Ok(())
        }
    }
}

/// Load the model configuration from a preset, an explicit file or the
/// resolution chain, falling back to defaults.
fn load_model_config(
    cli_path: Option<&Path>,
    preset: Option<PresetName>,
) -> Result<(ModelConfig, ConfigPath), Error> {
    if let Some(name) = preset {
        let path = ConfigPath {
            path: None,
            source: ConfigSource::Preset,
        };
        return Ok((get_preset(name), path));
    }

    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(Error::Config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
    }

    let resolved = resolve_config(cli_path);
    let config = match &resolved.path {
        Some(path) => ModelConfig::from_file(path)?,
        None => ModelConfig::default(),
    };
    debug!(
        source = %resolved.source,
        path = ?resolved.path,
        "model configuration resolved"
    );
    Ok((config, resolved))
}

// ============================================================================
// config
// ============================================================================

fn run_config(global: &GlobalOpts, run_id: &str, args: &ConfigArgs) -> Result<(), Error> {
    match &args.command {
        ConfigCommands::Show { config, preset } => {
            run_config_show(global, run_id, config.as_deref(), *preset)
        }
        ConfigCommands::Presets => run_config_presets(global, run_id),
    }
}

fn run_config_show(
    global: &GlobalOpts,
    run_id: &str,
    cli_path: Option<&Path>,
    preset: Option<PresetName>,
) -> Result<(), Error> {
    let (config, path) = load_model_config(cli_path, preset)?;
    dp_config::validate_model_config(&config)?;
    let snapshot = ConfigSnapshot::new(&config, &path);

    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "run_id": run_id,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "source": {
                "path": snapshot.config_path,
                "kind": snapshot.config_source,
                "hash": snapshot.config_hash,
                "using_defaults": path.path.is_none() && preset.is_none(),
            },
            "config": config,
        })),
        OutputFormat::Human => {
            println!(
                "source: {}{}",
                snapshot.config_source,
                snapshot
                    .config_path
                    .as_ref()
                    .map(|p| format!(" ({})", p))
                    .unwrap_or_default()
            );
            println!("hash: {}", snapshot.short_id());
            println!("objective: {}", snapshot.summary.objective);
            if let Some(alpha) = snapshot.summary.alpha {
                println!("alpha: {}", alpha);
            }
            println!("probability cut: {}", snapshot.summary.probability_cut);
            println!("scale factor: {}", snapshot.summary.probability_scale_factor);
            println!("active paths cut: {}", snapshot.summary.active_paths_cut);
            println!("utility shift: {}", snapshot.summary.utility_shift);
            println!("forbidden path rules: {}", snapshot.summary.forbidden_path_rules);
            println!("fixed states: {}", snapshot.summary.fixed_states);
            Ok(())
        }
    }
}

fn run_config_presets(global: &GlobalOpts, run_id: &str) -> Result<(), Error> {
    let presets = list_presets();
    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "run_id": run_id,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "presets": presets,
        })),
        OutputFormat::Human => {
            for preset in &presets {
                println!(
                    "{:<12} {:<6} {:<14} {}",
                    preset.name, preset.probability_cut, preset.objective, preset.description
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn conditions_split_on_equals() {
        assert_eq!(parse_condition("R1=ill").unwrap(), ("R1", "ill"));
        assert_eq!(parse_condition(" H2 = 1 ").unwrap(), ("H2", "1"));
        assert!(parse_condition("R1").is_err());
        assert!(parse_condition("=ill").is_err());
    }
}
