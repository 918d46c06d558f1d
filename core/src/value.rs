#![deny(missing_docs)]

//! # Sample Values
//!
//! Dynamic values used to execute synthesized plans, e.g. to verify that a
//! pair of plans round-trips a sample value.
//!
//! Optional (pointer-shaped) slots hold either `Null` or `Present`; required
//! slots hold the bare value.

use crate::error::EngineResult;
use crate::types::{Identity, PrimitiveKind, Resolved, Shape};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

/// A dynamic value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// A nil optional.
    Null,
    /// A populated optional.
    Present(Box<Value>),
    /// A boolean.
    Bool(bool),
    /// A signed integer of any width.
    Int(i64),
    /// An unsigned integer of any width.
    UInt(u64),
    /// A float of any width.
    Float(f64),
    /// A string.
    String(String),
    /// A byte sequence.
    Bytes(Vec<u8>),
    /// An ordered sequence.
    Array(Vec<Value>),
    /// Ordered key/value entries.
    Map(Vec<(Value, Value)>),
    /// Named fields.
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Wraps a value into a populated optional.
    pub fn present(value: impl Into<Value>) -> Self {
        Value::Present(Box::new(value.into()))
    }

    /// Builds an object from `(name, value)` pairs.
    pub fn object<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Whether the value is a scalar fitting the primitive kind.
    pub fn fits(&self, kind: PrimitiveKind) -> bool {
        matches!(
            (self, kind),
            (Value::Bool(_), PrimitiveKind::Boolean)
                | (
                    Value::Int(_),
                    PrimitiveKind::Int | PrimitiveKind::Int32 | PrimitiveKind::Int64
                )
                | (
                    Value::UInt(_),
                    PrimitiveKind::UInt | PrimitiveKind::UInt32 | PrimitiveKind::UInt64
                )
                | (Value::Float(_), PrimitiveKind::Float32 | PrimitiveKind::Float64)
                | (Value::String(_), PrimitiveKind::String)
                | (Value::Bytes(_), PrimitiveKind::Bytes)
        )
    }

    /// The zero value of a primitive kind.
    pub fn zero(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Boolean => Value::Bool(false),
            PrimitiveKind::Int | PrimitiveKind::Int32 | PrimitiveKind::Int64 => Value::Int(0),
            PrimitiveKind::UInt | PrimitiveKind::UInt32 | PrimitiveKind::UInt64 => Value::UInt(0),
            PrimitiveKind::Float32 | PrimitiveKind::Float64 => Value::Float(0.0),
            PrimitiveKind::String => Value::String(String::new()),
            PrimitiveKind::Bytes => Value::Bytes(Vec::new()),
        }
    }

    /// The default value of a slot of the given shape.
    ///
    /// Optional slots default to `Null`; required objects are filled
    /// recursively, and a required object already being filled (a cycle)
    /// defaults to `Null`.
    pub fn default_for(shape: Shape<'_>, required: bool) -> EngineResult<Value> {
        fn fill(
            shape: Shape<'_>,
            required: bool,
            seen: &mut HashSet<Identity>,
        ) -> EngineResult<Value> {
            if !required {
                return Ok(Value::Null);
            }
            Ok(match shape.resolve()? {
                Resolved::Primitive(kind) => Value::zero(kind),
                Resolved::Array(_) => Value::Array(Vec::new()),
                Resolved::Map(_, _) => Value::Map(Vec::new()),
                Resolved::Object(obj) => {
                    if let Some(identity) = &obj.identity {
                        if !seen.insert(identity.clone()) {
                            return Ok(Value::Null);
                        }
                    }
                    let mut fields = IndexMap::new();
                    for &attr in &obj.attributes {
                        let value = fill(obj.attribute_shape(attr), attr.required, seen)?;
                        fields.insert(attr.name.clone(), value);
                    }
                    if let Some(identity) = &obj.identity {
                        seen.remove(identity);
                    }
                    Value::Object(fields)
                }
            })
        }
        fill(shape, required, &mut HashSet::new())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attribute, NamedType, Type, TypeGraphBuilder};

    #[test]
    fn test_fits() {
        assert!(Value::Int(1).fits(PrimitiveKind::Int64));
        assert!(!Value::Int(1).fits(PrimitiveKind::UInt));
        assert!(Value::from("x").fits(PrimitiveKind::String));
        assert!(!Value::Null.fits(PrimitiveKind::String));
    }

    #[test]
    fn test_default_for_cycle() {
        let mut b = TypeGraphBuilder::new();
        b.declare(NamedType::new(
            "Node",
            Type::Object(vec![
                Attribute::required("value", Type::Primitive(PrimitiveKind::Int)),
                Attribute::required("tags", Type::array(Type::Primitive(PrimitiveKind::String))),
                Attribute::optional("next", Type::named("Node")),
                Attribute::required("self_", Type::named("Node")),
            ]),
        ))
        .unwrap();
        let graph = b.finalize().unwrap();
        let value = Value::default_for(graph.named_shape("Node").unwrap(), true).unwrap();
        assert_eq!(
            value,
            Value::object([
                ("value", Value::Int(0)),
                ("tags", Value::Array(vec![])),
                ("next", Value::Null),
                ("self_", Value::Null),
            ])
        );
    }

    #[test]
    fn test_default_optional_is_null() {
        let ty = Type::Primitive(PrimitiveKind::Boolean);
        let graph = crate::types::TypeGraph::empty();
        assert_eq!(Value::default_for(graph.shape(&ty), false).unwrap(), Value::Null);
        assert_eq!(
            Value::default_for(graph.shape(&ty), true).unwrap(),
            Value::Bool(false)
        );
    }
}
