//! # Error Handling
//!
//! Provides the unified `EngineError` enum returned by every checker,
//! synthesizer, lifter and interpreter entry point.

use derive_more::{Display, From};

/// The Engine Error Enum.
///
/// Every diagnosable mismatch is returned as one of these variants; the caller
/// decides whether to skip a single binding or abort the whole run.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Two primitive (or collection) kinds disagree at `path`.
    #[from(ignore)]
    #[display(
        "types don't match: type of {path} is {source_kind} but type of corresponding attribute is {target_kind}"
    )]
    Incompatible {
        /// Path of the offending value, e.g. `<value>.items[0]`.
        path: String,
        /// Kind found on the source side.
        source_kind: String,
        /// Kind required by the target side.
        target_kind: String,
    },

    /// The source is a non-composite value where the target expects an object.
    #[from(ignore)]
    #[display("types don't match: {path} is a {kind}, expected a struct")]
    NotAStruct {
        /// Path of the offending value.
        path: String,
        /// Kind found on the source side.
        kind: String,
    },

    /// The source is an object where the target expects a non-composite value.
    #[from(ignore)]
    #[display("types don't match: {path} is a struct, expected a {kind}")]
    UnexpectedStruct {
        /// Path of the offending value.
        path: String,
        /// Kind required by the target side.
        kind: String,
    },

    /// A target attribute has no source counterpart and is not marked skipped.
    #[from(ignore)]
    #[display(
        "types don't match: could not find field \"{field}\" of external type \"{source_type}\" matching attribute \"{attribute}\" of type \"{target_type}\""
    )]
    UnresolvedField {
        /// Field name that was looked up on the source side.
        field: String,
        /// Name of the source type.
        source_type: String,
        /// Name of the target attribute.
        attribute: String,
        /// Name of the target type.
        target_type: String,
    },

    /// A native shape cannot be lifted into the type vocabulary.
    #[from(ignore)]
    #[display("{path}: {reason}")]
    UnsupportedShape {
        /// Path of the offending native value (already decorated, e.g. `*(<value>)`).
        path: String,
        /// Why the shape was rejected.
        reason: String,
    },

    /// The type graph violates a finalization invariant.
    #[from(ignore)]
    #[display("invalid type graph: {_0}")]
    InvalidGraph(String),

    /// A required value was nil while executing a plan.
    #[from(ignore)]
    #[display("{path} is nil but the target requires a value")]
    NilValue {
        /// Path of the nil value.
        path: String,
    },

    /// A sample value does not have the shape the plan expects.
    #[from(ignore)]
    #[display("{path}: expected {expected}")]
    ValueShape {
        /// Path of the offending value.
        path: String,
        /// Description of the expected value.
        expected: String,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Coarse classification of an `EngineError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structural mismatch found by the compatibility checker.
    Incompatibility,
    /// Target attribute without a source counterpart.
    UnresolvedField,
    /// Native shape that cannot be lifted.
    UnsupportedShape,
    /// Upstream finalization defect.
    InvalidGraph,
    /// Failure while executing a plan against a sample value.
    Evaluation,
    /// Anything else.
    General,
}

impl EngineError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Incompatible { .. }
            | EngineError::NotAStruct { .. }
            | EngineError::UnexpectedStruct { .. } => ErrorKind::Incompatibility,
            EngineError::UnresolvedField { .. } => ErrorKind::UnresolvedField,
            EngineError::UnsupportedShape { .. } => ErrorKind::UnsupportedShape,
            EngineError::InvalidGraph(_) => ErrorKind::InvalidGraph,
            EngineError::NilValue { .. } | EngineError::ValueShape { .. } => ErrorKind::Evaluation,
            EngineError::General(_) => ErrorKind::General,
        }
    }
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for EngineError {}

/// Helper type alias for Result using EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
