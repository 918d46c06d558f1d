#![deny(missing_docs)]

//! # Message Binding
//!
//! Bridges design types and protocol message shapes.
//!
//! A message shape is derived from a design shape by `lift_message`: every
//! reachable named object becomes a message, each attribute gets a wire
//! field number (`rpc:tag`) and a bare root value is wrapped into a message
//! with the single attribute `field` (tag 1). The tags are opaque to the
//! checker and synthesizer; they only feed schema emission.

/// Deriving message shapes from design shapes.
pub mod lift;

/// Checks and synthesis between design and message shapes.
pub mod binding;

use crate::error::EngineResult;
use crate::types::{PrimitiveKind, Resolved, Shape, Type, TypeGraph};
use serde::Serialize;
use std::collections::HashSet;

pub use binding::MessageBinding;
pub use lift::lift_message;

/// A message shape and the graph of messages it reaches.
#[derive(Debug, Clone)]
pub struct MessageShape {
    graph: TypeGraph,
    root: Type,
    name: String,
    wrapped: bool,
}

/// One field of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageField {
    /// Field name.
    pub name: String,
    /// Wire field number.
    pub tag: u32,
    /// Protocol buffer type, e.g. `repeated sint32`.
    pub wire_type: String,
    /// Whether the field has no presence tracking.
    pub required: bool,
}

/// One message with its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageDef {
    /// Message name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<MessageField>,
}

/// Every message a root message needs, root first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSchema {
    /// Root message name.
    pub name: String,
    /// Whether the root wraps a bare design value.
    pub wrapped: bool,
    /// Messages in discovery order.
    pub messages: Vec<MessageDef>,
}

impl MessageShape {
    /// The root message shape.
    pub fn shape(&self) -> Shape<'_> {
        self.graph.shape(&self.root)
    }

    /// The graph of messages.
    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    /// Root message name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the root wraps a bare design value into `field`.
    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }

    /// Fields of the root message.
    pub fn fields(&self) -> EngineResult<Vec<MessageField>> {
        message_fields(self.shape())
    }

    /// Every message the root needs, with fields.
    pub fn schema(&self) -> EngineResult<MessageSchema> {
        let mut messages = Vec::new();
        for name in collect_messages(self.shape())? {
            messages.push(MessageDef {
                fields: message_fields(self.graph.named_shape(&name)?)?,
                name,
            });
        }
        Ok(MessageSchema {
            name: self.name.clone(),
            wrapped: self.wrapped,
            messages,
        })
    }
}

fn message_fields(shape: Shape<'_>) -> EngineResult<Vec<MessageField>> {
    let Resolved::Object(obj) = shape.resolve()? else {
        return Ok(Vec::new());
    };
    let mut fields = Vec::with_capacity(obj.attributes.len());
    for &attr in &obj.attributes {
        fields.push(MessageField {
            name: attr.name.clone(),
            tag: attr.meta.rpc_tag.unwrap_or_default(),
            wire_type: wire_type_name(obj.attribute_shape(attr))?,
            required: attr.required,
        });
    }
    Ok(fields)
}

/// The protocol buffer type name of a shape.
pub fn wire_type_name(shape: Shape<'_>) -> EngineResult<String> {
    Ok(match shape.resolve()? {
        Resolved::Primitive(kind) => match kind {
            PrimitiveKind::Boolean => "bool",
            PrimitiveKind::Int | PrimitiveKind::Int32 => "sint32",
            PrimitiveKind::Int64 => "sint64",
            PrimitiveKind::UInt | PrimitiveKind::UInt32 => "uint32",
            PrimitiveKind::UInt64 => "uint64",
            PrimitiveKind::Float32 => "float",
            PrimitiveKind::Float64 => "double",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bytes => "bytes",
        }
        .to_string(),
        Resolved::Array(elem) => format!("repeated {}", wire_type_name(elem)?),
        Resolved::Map(key, value) => {
            format!("map<{}, {}>", wire_type_name(key)?, wire_type_name(value)?)
        }
        Resolved::Object(obj) => obj.type_name(),
    })
}

/// Names of the messages reachable from `shape`, deduplicated, in
/// discovery order.
pub fn collect_messages(shape: Shape<'_>) -> EngineResult<Vec<String>> {
    fn walk(
        shape: Shape<'_>,
        seen: &mut HashSet<String>,
        out: &mut Vec<String>,
    ) -> EngineResult<()> {
        match shape.resolve()? {
            Resolved::Primitive(_) => Ok(()),
            Resolved::Array(elem) => walk(elem, seen, out),
            Resolved::Map(key, value) => {
                walk(key, seen, out)?;
                walk(value, seen, out)
            }
            Resolved::Object(obj) => {
                if let Some(identity) = &obj.identity {
                    if !seen.insert(identity.name.clone()) {
                        return Ok(());
                    }
                    out.push(identity.name.clone());
                }
                for &attr in &obj.attributes {
                    walk(obj.attribute_shape(attr), seen, out)?;
                }
                Ok(())
            }
        }
    }
    let mut out = Vec::new();
    walk(shape, &mut HashSet::new(), &mut out)?;
    Ok(out)
}
