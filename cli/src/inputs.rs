//! Arguments and document loading shared by the commands.

use crate::error::CliResult;
use cdd_bridge_core::{parse_document, parse_type, Direction, Type, TypeGraph};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Conversion direction as given on the command line.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    /// Design value to native struct.
    ToNative,
    /// Native struct to design value.
    FromNative,
    /// Design value to protocol message.
    ToMessage,
    /// Protocol message to design value.
    FromMessage,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::ToNative => Direction::ToNative,
            DirectionArg::FromNative => Direction::FromNative,
            DirectionArg::ToMessage => Direction::ToMessage,
            DirectionArg::FromMessage => Direction::FromMessage,
        }
    }
}

/// A source and a target type, each looked up in a type document.
#[derive(clap::Args, Debug, Clone)]
pub struct PairArgs {
    /// Type document declaring the source types.
    #[clap(long, env = "CDD_BRIDGE_DESIGN")]
    pub design: PathBuf,

    /// Type document declaring the target types.
    /// Defaults to the design document.
    #[clap(long, env = "CDD_BRIDGE_TARGET")]
    pub target_doc: Option<PathBuf>,

    /// Source type expression, e.g. `User` or `"{array: User}"`.
    #[clap(long)]
    pub source: String,

    /// Target type expression.
    #[clap(long)]
    pub target: String,

    /// Conversion direction.
    #[clap(long, value_enum, default_value = "to-native")]
    pub direction: DirectionArg,
}

/// Loaded graphs and parsed root types of a [`PairArgs`].
pub struct LoadedPair {
    /// Graph holding the source type.
    pub source_graph: TypeGraph,
    /// Graph holding the target type.
    pub target_graph: Option<TypeGraph>,
    /// Source root.
    pub source: Type,
    /// Target root.
    pub target: Type,
}

impl LoadedPair {
    /// Graph the target type lives in.
    pub fn target_graph(&self) -> &TypeGraph {
        self.target_graph.as_ref().unwrap_or(&self.source_graph)
    }
}

impl PairArgs {
    /// Reads the documents and validates both root expressions.
    pub fn load(&self) -> CliResult<LoadedPair> {
        let source_graph = load_graph(&self.design)?;
        let target_graph = match &self.target_doc {
            Some(path) => Some(load_graph(path)?),
            None => None,
        };
        let pair = LoadedPair {
            source: parse_type(&self.source)?,
            target: parse_type(&self.target)?,
            source_graph,
            target_graph,
        };
        pair.source_graph.validate_root(&pair.source)?;
        pair.target_graph().validate_root(&pair.target)?;
        Ok(pair)
    }
}

/// Reads and finalizes a type document.
pub fn load_graph(path: &Path) -> CliResult<TypeGraph> {
    let content = fs::read_to_string(path)?;
    let graph = parse_document(&content)?;
    debug!(path = %path.display(), types = graph.len(), "loaded type document");
    Ok(graph)
}
