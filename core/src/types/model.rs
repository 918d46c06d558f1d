//! # Data Models
//!
//! Definition of the tagged type vocabulary shared by design types, lifted
//! native shapes and message shapes.

use crate::types::meta::AttributeMeta;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The primitive kinds of the type vocabulary.
///
/// Kinds are compared exactly; there is no numeric widening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// `true` / `false`.
    Boolean,
    /// Signed integer of unspecified width.
    Int,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Unsigned integer of unspecified width.
    UInt,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// UTF-8 string.
    String,
    /// Byte sequence.
    Bytes,
}

impl PrimitiveKind {
    /// All kinds, in declaration order.
    pub const ALL: [PrimitiveKind; 11] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Int,
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::UInt,
        PrimitiveKind::UInt32,
        PrimitiveKind::UInt64,
        PrimitiveKind::Float32,
        PrimitiveKind::Float64,
        PrimitiveKind::String,
        PrimitiveKind::Bytes,
    ];

    /// The name used in diagnostics and documents.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::UInt => "uint",
            PrimitiveKind::UInt32 => "uint32",
            PrimitiveKind::UInt64 => "uint64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bytes => "bytes",
        }
    }

    /// Parses a kind from its document name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Whether the Rust representation of this kind is `Copy`.
    pub fn is_copy(self) -> bool {
        !matches!(self, PrimitiveKind::String | PrimitiveKind::Bytes)
    }
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A value shape.
///
/// `Named` is a reference by name into a `TypeGraph`; named nodes are shared
/// by identity and may refer back to themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// A primitive value.
    Primitive(PrimitiveKind),
    /// A sequence of elements of one type.
    Array(Box<Type>),
    /// A mapping from keys to values.
    Map(Box<Type>, Box<Type>),
    /// An ordered list of named attributes.
    Object(Vec<Attribute>),
    /// A reference to a named type.
    Named(String),
}

impl Type {
    /// Shorthand for a primitive type.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Type::Primitive(kind)
    }

    /// Shorthand for an array type.
    pub fn array(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }

    /// Shorthand for a map type.
    pub fn map(key: Type, value: Type) -> Self {
        Type::Map(Box::new(key), Box::new(value))
    }

    /// Shorthand for a named reference.
    pub fn named(name: impl Into<String>) -> Self {
        Type::Named(name.into())
    }
}

/// A named attribute of an object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Attribute name, unique within its object.
    pub name: String,
    /// Value type.
    #[serde(rename = "type")]
    pub ty: Type,
    /// Whether a produced value must carry this attribute.
    pub required: bool,
    /// Engine directives attached to the attribute.
    #[serde(skip_serializing_if = "AttributeMeta::is_empty")]
    pub meta: AttributeMeta,
}

impl Attribute {
    /// Creates a required attribute without metadata.
    pub fn required(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            meta: AttributeMeta::default(),
        }
    }

    /// Creates an optional attribute without metadata.
    pub fn optional(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            meta: AttributeMeta::default(),
        }
    }

    /// Replaces the metadata of the attribute.
    pub fn with_meta(mut self, meta: AttributeMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// A named, restricted attribute subset of a named type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    /// View name (e.g. `tiny`).
    pub name: String,
    /// Names of the attributes presented by this view.
    pub attributes: Vec<String>,
}

/// A node of the type graph's global-by-name table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedType {
    /// Identity of the type.
    pub name: String,
    /// Underlying shape; may reference this type again.
    pub underlying: Type,
    /// Optional external identifier (e.g. a media type).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Alternate presentations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<View>,
}

impl NamedType {
    /// Creates a named type without identifier or views.
    pub fn new(name: impl Into<String>, underlying: Type) -> Self {
        Self {
            name: name.into(),
            underlying,
            identifier: None,
            views: Vec::new(),
        }
    }

    /// Adds a view.
    pub fn with_view(mut self, name: impl Into<String>, attributes: &[&str]) -> Self {
        self.views.push(View {
            name: name.into(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    /// Sets the identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Looks up a view by name.
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_name("User"), None);
    }

    #[test]
    fn test_kind_serde_names() {
        let kind: PrimitiveKind = serde_json::from_str("\"uint32\"").unwrap();
        assert_eq!(kind, PrimitiveKind::UInt32);
        assert_eq!(serde_json::to_string(&PrimitiveKind::Float64).unwrap(), "\"float64\"");
    }

    #[test]
    fn test_copy_kinds() {
        assert!(PrimitiveKind::Int64.is_copy());
        assert!(!PrimitiveKind::String.is_copy());
        assert!(!PrimitiveKind::Bytes.is_copy());
    }

    #[test]
    fn test_view_lookup() {
        let ty = NamedType::new("User", Type::Object(vec![]))
            .with_view("tiny", &["id"])
            .with_identifier("application/vnd.user");
        assert_eq!(ty.view("tiny").unwrap().attributes, vec!["id"]);
        assert!(ty.view("full").is_none());
        assert_eq!(ty.identifier.as_deref(), Some("application/vnd.user"));
    }
}
