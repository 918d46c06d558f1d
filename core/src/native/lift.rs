//! # Shape Lifting
//!
//! Turns a native description into a type graph: every reachable struct
//! becomes a named object type, `Option` fields become optional attributes.
//!
//! A pointer is liftable as a struct field or as the root, and only when it
//! points to a struct. Sequence elements and map entries cannot be optional.

use crate::compat::ROOT_PATH;
use crate::error::{EngineError, EngineResult};
use crate::native::{NativeRegistry, NativeType};
use crate::types::{Attribute, NamedType, Shape, Type, TypeGraph, TypeGraphBuilder};
use std::collections::HashSet;

/// A native type lifted into the type vocabulary.
#[derive(Debug, Clone)]
pub struct LiftedNative {
    graph: TypeGraph,
    root: Type,
    optional: bool,
}

impl LiftedNative {
    /// The lifted shape of the root type.
    pub fn shape(&self) -> Shape<'_> {
        self.graph.shape(&self.root)
    }

    /// The graph holding one named type per reachable struct.
    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    /// The lifted root type.
    pub fn root(&self) -> &Type {
        &self.root
    }

    /// Whether the root is a pointer to a struct.
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Lifts `root`, whose structs are described in `registry`.
pub fn lift(registry: &NativeRegistry, root: &NativeType) -> EngineResult<LiftedNative> {
    let mut lifter = Lifter {
        registry,
        builder: TypeGraphBuilder::new(),
        done: HashSet::new(),
    };
    let (root, optional) = match root {
        NativeType::Pointer(inner) => (lifter.pointee(inner, ROOT_PATH)?, true),
        other => (lifter.lift(other, ROOT_PATH)?, false),
    };
    Ok(LiftedNative {
        graph: lifter.builder.finalize()?,
        root,
        optional,
    })
}

struct Lifter<'r> {
    registry: &'r NativeRegistry,
    builder: TypeGraphBuilder,
    done: HashSet<String>,
}

impl Lifter<'_> {
    fn lift(&mut self, ty: &NativeType, path: &str) -> EngineResult<Type> {
        match ty {
            NativeType::Primitive(kind) => Ok(Type::Primitive(*kind)),
            NativeType::Sequence(elem) => {
                Ok(Type::array(self.lift(elem, &format!("{}[0]", path))?))
            }
            NativeType::Map(key, value) => Ok(Type::map(
                self.lift(key, &format!("{}.key", path))?,
                self.lift(value, &format!("{}.value", path))?,
            )),
            NativeType::Struct(name) => self.lift_struct(name, path),
            NativeType::Pointer(inner) => match &**inner {
                NativeType::Struct(name) => Err(EngineError::UnsupportedShape {
                    path: format!("*({})", path),
                    reason: format!("optional {} can only be converted as a struct field", name),
                }),
                _ => self.pointee(inner, path),
            },
            NativeType::Opaque(name) => Err(EngineError::UnsupportedShape {
                path: path.to_string(),
                reason: format!("type {} cannot be converted", name),
            }),
        }
    }

    fn pointee(&mut self, inner: &NativeType, path: &str) -> EngineResult<Type> {
        match inner {
            NativeType::Struct(name) => self.lift_struct(name, path),
            _ => Err(EngineError::UnsupportedShape {
                path: format!("*({})", path),
                reason: "only pointer to struct can be converted".to_string(),
            }),
        }
    }

    fn lift_struct(&mut self, name: &str, path: &str) -> EngineResult<Type> {
        if self.done.insert(name.to_string()) {
            let fields = self.registry.fields(name).ok_or_else(|| {
                EngineError::InvalidGraph(format!("native struct {:?} was never described", name))
            })?;
            let mut attributes = Vec::with_capacity(fields.len());
            for field in fields {
                let path = format!("{}.{}", path, field.name);
                let attr = match &field.ty {
                    NativeType::Pointer(inner) => {
                        Attribute::optional(&field.name, self.lift(inner, &path)?)
                    }
                    ty => Attribute::required(&field.name, self.lift(ty, &path)?),
                };
                attributes.push(attr);
            }
            self.builder
                .declare(NamedType::new(name, Type::Object(attributes)))?;
        }
        Ok(Type::named(name))
    }
}
