#![deny(missing_docs)]

//! # CDD Bridge CLI
//!
//! Command Line Interface for the structural type-transformation engine.
//!
//! Supported Commands:
//! - `check`: Compatibility of two type expressions.
//! - `synth`: Rust code (or the JSON plan) for one conversion.
//! - `message`: Message shape lifted from a design type.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

mod check;
mod error;
mod inputs;
mod message;
mod synth;

#[derive(Parser, Debug)]
#[clap(author, version, about = "CDD Bridge CLI")]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset (e.g. `debug`).
    #[clap(long, global = true, env = "CDD_BRIDGE_LOG", default_value = "warn")]
    log_level: String,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Checks that the source type converts into the target type.
    Check(check::CheckArgs),
    /// Prints the synthesized conversion.
    Synth(synth::SynthArgs),
    /// Prints the message shape of a design type.
    Message(message::MessageArgs),
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match &cli.command {
        Commands::Check(args) => check::execute(args)?,
        Commands::Synth(args) => synth::execute(args)?,
        Commands::Message(args) => message::execute(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_synth_flags() {
        let cli = Cli::try_parse_from([
            "cdd-bridge",
            "synth",
            "--design",
            "design.yaml",
            "--source",
            "User",
            "--target",
            "User",
            "--direction",
            "from-message",
            "--target-module",
            "pb",
        ])
        .unwrap();
        let Commands::Synth(args) = cli.command else {
            panic!("expected synth");
        };
        assert_eq!(args.pair.direction, inputs::DirectionArg::FromMessage);
        assert_eq!(args.target_module.as_deref(), Some("pb"));
        assert_eq!(args.source_var, "src");
    }
}
