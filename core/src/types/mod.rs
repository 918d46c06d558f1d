#![deny(missing_docs)]

//! # Type Graph
//!
//! The read-only description of value shapes every other stage operates on.
//!
//! - `model`: the tagged `Type` vocabulary, attributes, named types, views.
//! - `meta`: typed attribute metadata (`origin:attribute`, `struct.field.external`,
//!   `rpc:tag`, `view`).
//! - `graph`: the builder, finalization, and the borrowed `Shape` view.

/// Type vocabulary.
pub mod model;

/// Attribute metadata.
pub mod meta;

/// Graph table, finalization and shapes.
pub mod graph;

pub use graph::{Identity, ObjectShape, Resolved, Shape, TypeGraph, TypeGraphBuilder};
pub use meta::{AttributeMeta, ExternalField, RawMetadata};
pub use model::{Attribute, NamedType, PrimitiveKind, Type, View};
