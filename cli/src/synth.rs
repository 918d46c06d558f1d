#![deny(missing_docs)]

//! # Synth Command
//!
//! Synthesizes one conversion and prints it, either as Rust source (the
//! `let` statement plus every helper it calls) or as the JSON plan.

use crate::error::CliResult;
use crate::inputs::PairArgs;
use cdd_bridge_core::{render_unit, synthesize, Binding, HelperRegistry, Options};
use tracing::info;

/// Output format of the synth command.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthFormat {
    /// Rust source.
    Rust,
    /// The plan and its helpers as JSON.
    Json,
}

/// Arguments for the synth command.
#[derive(clap::Args, Debug, Clone)]
pub struct SynthArgs {
    /// Source and target types.
    #[clap(flatten)]
    pub pair: PairArgs,

    /// Variable holding the source value.
    #[clap(long, default_value = "src")]
    pub source_var: String,

    /// Variable receiving the target value.
    #[clap(long, default_value = "dst")]
    pub target_var: String,

    /// Module qualifying the source types (e.g. `models`).
    #[clap(long)]
    pub source_module: Option<String>,

    /// Module qualifying the target types (e.g. `pb`).
    #[clap(long)]
    pub target_module: Option<String>,

    /// The source variable is an `Option`.
    #[clap(long)]
    pub source_optional: bool,

    /// The target variable is an `Option`.
    #[clap(long)]
    pub target_optional: bool,

    /// Output format.
    #[clap(long, value_enum, default_value = "rust")]
    pub format: SynthFormat,
}

fn binding(var: &str, module: &Option<String>, optional: bool) -> Binding {
    let mut binding = Binding::new(var);
    if let Some(module) = module {
        binding = binding.with_module(module);
    }
    if optional {
        binding = binding.optional();
    }
    binding
}

/// Synthesizes the conversion and returns the rendered output.
pub fn run(args: &SynthArgs) -> CliResult<String> {
    let pair = args.pair.load()?;
    let mut registry = HelperRegistry::new();
    let plan = synthesize(
        pair.source_graph.shape(&pair.source),
        pair.target_graph().shape(&pair.target),
        &binding(&args.source_var, &args.source_module, args.source_optional),
        &binding(&args.target_var, &args.target_module, args.target_optional),
        &Options::new(args.pair.direction.into()),
        &mut registry,
    )?;
    info!(helpers = registry.len(), "synthesized conversion");
    match args.format {
        SynthFormat::Rust => Ok(render_unit(&plan, &registry)?),
        SynthFormat::Json => {
            let doc = serde_json::json!({
                "plan": plan,
                "helpers": plan.helpers(&registry),
            });
            serde_json::to_string_pretty(&doc).map_err(|e| {
                crate::error::CliError::General(format!("JSON serialization failed: {}", e))
            })
        }
    }
}

/// Executes the synth command.
///
/// # Arguments
///
/// * `args` - Command arguments.
pub fn execute(args: &SynthArgs) -> CliResult<()> {
    print!("{}", run(args)?);
    Ok(())
}
