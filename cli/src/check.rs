#![deny(missing_docs)]

//! # Check Command
//!
//! Decides whether values of the source type convert into the target type,
//! the way synthesis for the given direction would pair them.

use crate::error::CliResult;
use crate::inputs::PairArgs;
use cdd_bridge_core::transform::check_with;
use cdd_bridge_core::Options;

/// Arguments for the check command.
#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    /// Source and target types.
    #[clap(flatten)]
    pub pair: PairArgs,
}

/// Runs the check and returns the report line.
pub fn run(args: &CheckArgs) -> CliResult<String> {
    let pair = args.pair.load()?;
    let source = pair.source_graph.shape(&pair.source);
    let target = pair.target_graph().shape(&pair.target);
    check_with(source, target, &Options::new(args.pair.direction.into()))?;
    Ok(format!(
        "{} -> {}: compatible",
        args.pair.source, args.pair.target
    ))
}

/// Executes the check command.
///
/// # Arguments
///
/// * `args` - Command arguments.
pub fn execute(args: &CheckArgs) -> CliResult<()> {
    println!("{}", run(args)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::DirectionArg;
    use std::fs;
    use tempfile::tempdir;

    const DOC: &str = r#"
types:
  - name: User
    type: { object: [ { name: id, type: int64 }, { name: name, type: string } ] }
  - name: UserRow
    type: { object: [ { name: id, type: int32 }, { name: name, type: string } ] }
"#;

    fn args(design: std::path::PathBuf, source: &str, target: &str) -> CheckArgs {
        CheckArgs {
            pair: PairArgs {
                design,
                target_doc: None,
                source: source.to_string(),
                target: target.to_string(),
                direction: DirectionArg::ToNative,
            },
        }
    }

    #[test]
    fn test_compatible_pair() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("design.yaml");
        fs::write(&path, DOC).unwrap();
        let report = run(&args(path, "{array: User}", "{array: User}")).unwrap();
        assert_eq!(report, "{array: User} -> {array: User}: compatible");
    }

    #[test]
    fn test_incompatible_pair() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("design.yaml");
        fs::write(&path, DOC).unwrap();
        let err = run(&args(path, "User", "UserRow")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "types don't match: type of <value>.id is int64 but type of corresponding attribute is int32"
        );
    }

    #[test]
    fn test_missing_document() {
        let dir = tempdir().unwrap();
        let err = run(&args(dir.path().join("nope.yaml"), "User", "User")).unwrap_err();
        assert!(err.to_string().starts_with("IO Error:"));
    }
}
