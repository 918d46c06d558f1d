#![deny(missing_docs)]

//! # Type Graph Documents
//!
//! YAML (or JSON) interchange form of a type graph.
//!
//! ```yaml
//! types:
//!   - name: User
//!     type:
//!       object:
//!         - { name: id, type: string }
//!         - { name: tags, type: { array: string }, required: false }
//!         - name: home
//!           type: Address
//!           meta: { "struct.field.external": [Home] }
//!     views:
//!       - { name: tiny, attributes: [id] }
//!   - name: Address
//!     type: { object: [ { name: city, type: string } ] }
//! ```
//!
//! A type expression is a primitive name, the name of a declared type,
//! `{array: T}`, `{map: {key: K, value: V}}` or `{object: [attributes]}`.
//! Attributes are required unless `required: false` is given.

use crate::error::{EngineError, EngineResult};
use crate::types::{
    Attribute, AttributeMeta, NamedType, PrimitiveKind, RawMetadata, Type, TypeGraph,
    TypeGraphBuilder, View,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShimDocument {
    #[serde(default)]
    types: Vec<ShimNamedType>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShimNamedType {
    name: String,
    #[serde(rename = "type")]
    ty: ShimType,
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    views: Vec<ShimView>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShimView {
    name: String,
    attributes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ShimType {
    Name(String),
    Array { array: Box<ShimType> },
    Map { map: Box<ShimMap> },
    Object { object: Vec<ShimAttribute> },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShimMap {
    key: ShimType,
    value: ShimType,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShimAttribute {
    name: String,
    #[serde(rename = "type")]
    ty: ShimType,
    #[serde(default = "default_required")]
    required: bool,
    #[serde(default)]
    meta: RawMetadata,
}

/// Parses a document and finalizes the graph it declares.
pub fn parse_document(content: &str) -> EngineResult<TypeGraph> {
    let shim: ShimDocument = serde_yaml::from_str(content)
        .map_err(|e| EngineError::General(format!("Failed to parse type document: {}", e)))?;
    let mut builder = TypeGraphBuilder::new();
    for named in shim.types {
        let mut declared = NamedType::new(named.name, convert_type(named.ty)?);
        declared.identifier = named.identifier;
        declared.views = named
            .views
            .into_iter()
            .map(|v| View {
                name: v.name,
                attributes: v.attributes,
            })
            .collect();
        builder.declare(declared)?;
    }
    builder.finalize()
}

/// Parses a single type expression, e.g. `User` or `{array: int}`.
pub fn parse_type(expr: &str) -> EngineResult<Type> {
    let shim: ShimType = serde_yaml::from_str(expr).map_err(|e| {
        EngineError::General(format!("Failed to parse type expression {:?}: {}", expr, e))
    })?;
    convert_type(shim)
}

fn convert_type(shim: ShimType) -> EngineResult<Type> {
    Ok(match shim {
        ShimType::Name(name) => match PrimitiveKind::from_name(&name) {
            Some(kind) => Type::Primitive(kind),
            None => Type::Named(name),
        },
        ShimType::Array { array } => Type::array(convert_type(*array)?),
        ShimType::Map { map } => {
            let ShimMap { key, value } = *map;
            Type::map(convert_type(key)?, convert_type(value)?)
        }
        ShimType::Object { object } => {
            let mut attributes = Vec::with_capacity(object.len());
            for attr in object {
                let meta = AttributeMeta::from_raw(&attr.name, &attr.meta)?;
                attributes.push(Attribute {
                    ty: convert_type(attr.ty)?,
                    name: attr.name,
                    required: attr.required,
                    meta,
                });
            }
            Type::Object(attributes)
        }
    })
}
