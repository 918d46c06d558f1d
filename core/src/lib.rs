#![deny(missing_docs)]

//! # CDD Bridge Core
//!
//! Structural type-transformation engine.
//!
//! Given two value shapes described in a [`TypeGraph`], the engine decides
//! whether values of one can be converted into the other
//! ([`compat::check`]) and synthesizes a [`Plan`] performing the conversion
//! ([`transform::synthesize`]), delegating nested named objects to helpers
//! collected in a caller-owned [`HelperRegistry`].
//!
//! Two specializations sit on top:
//! - [`native`]: native composites described through [`native::Reflect`].
//! - [`message`]: protocol messages derived from design shapes.

/// Shared error types.
pub mod error;

/// Type graph, metadata and shapes.
pub mod types;

/// Field resolution shared by checker and synthesizer.
pub mod matching;

/// Compatibility checker.
pub mod compat;

/// Sample values for plan execution.
pub mod value;

/// Transform synthesizer, interpreter and Rust backend.
pub mod transform;

/// Native composite binding.
pub mod native;

/// Protocol message binding.
pub mod message;

/// Parallel synthesis of independent requests.
pub mod batch;

/// YAML/JSON type graph documents.
pub mod document;

pub use batch::{synthesize_batch, BatchOutcome, BatchRequest};
pub use compat::{check, compatible};
pub use document::{parse_document, parse_type};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use message::{lift_message, MessageBinding, MessageShape};
pub use native::{NativeBinding, NativeRegistry, NativeType, Reflect};
pub use transform::helpers::HelperRegistry;
pub use transform::{
    apply, render_unit, synthesize, Binding, Direction, Options, Plan, WRAP_FIELD,
};
pub use types::{Attribute, AttributeMeta, NamedType, PrimitiveKind, Shape, Type, TypeGraph};
pub use value::Value;
