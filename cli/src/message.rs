#![deny(missing_docs)]

//! # Message Command
//!
//! Lifts a design type into a protocol message shape and prints every
//! message it needs with field tags and wire types.

use crate::error::{CliError, CliResult};
use crate::inputs::load_graph;
use cdd_bridge_core::{lift_message, parse_type};
use std::path::PathBuf;

/// Output format of the message command.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// Pretty printed JSON.
    Json,
    /// YAML.
    Yaml,
}

/// Arguments for the message command.
#[derive(clap::Args, Debug, Clone)]
pub struct MessageArgs {
    /// Type document declaring the design types.
    #[clap(long, env = "CDD_BRIDGE_DESIGN")]
    pub design: PathBuf,

    /// Design type expression to lift.
    #[clap(long)]
    pub source: String,

    /// Name of the root message.
    #[clap(long)]
    pub name: String,

    /// Output format.
    #[clap(long, value_enum, default_value = "yaml")]
    pub format: SchemaFormat,
}

/// Lifts the message and returns the serialized schema.
pub fn run(args: &MessageArgs) -> CliResult<String> {
    let graph = load_graph(&args.design)?;
    let root = parse_type(&args.source)?;
    graph.validate_root(&root)?;
    let schema = lift_message(graph.shape(&root), &args.name)?.schema()?;
    match args.format {
        SchemaFormat::Json => serde_json::to_string_pretty(&schema)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e))),
        SchemaFormat::Yaml => serde_yaml::to_string(&schema)
            .map_err(|e| CliError::General(format!("YAML serialization failed: {}", e))),
    }
}

/// Executes the message command.
///
/// # Arguments
///
/// * `args` - Command arguments.
pub fn execute(args: &MessageArgs) -> CliResult<()> {
    println!("{}", run(args)?);
    Ok(())
}
