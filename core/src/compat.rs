#![deny(missing_docs)]

//! # Compatibility Checker
//!
//! Decides whether values of a source shape can be mapped onto a target shape,
//! reporting a path-qualified diagnostic on the first mismatch.
//!
//! The check is a pure decision procedure: it never mutates either graph and
//! is always run to completion before any synthesis starts.

use crate::error::{EngineError, EngineResult};
use crate::matching::{resolve_field, unresolved_error, Externals, FieldMatch};
use crate::types::{Identity, Resolved, Shape};
use std::collections::HashSet;

/// Root path used in diagnostics.
pub const ROOT_PATH: &str = "<value>";

/// Checks `source` against `target`, starting at the `<value>` path.
pub fn check(source: Shape<'_>, target: Shape<'_>) -> EngineResult<()> {
    compatible(source, target, ROOT_PATH)
}

/// Checks `source` against `target` with diagnostics rooted at `path`.
pub fn compatible(source: Shape<'_>, target: Shape<'_>, path: &str) -> EngineResult<()> {
    compatible_with(source, target, path, Externals::Honor)
}

/// Like [`compatible`], choosing whether native field mappings apply.
pub fn compatible_with(
    source: Shape<'_>,
    target: Shape<'_>,
    path: &str,
    externals: Externals,
) -> EngineResult<()> {
    Checker {
        visited: HashSet::new(),
        externals,
    }
    .walk(source, target, path)
}

/// Walk state: named pairs already entered.
struct Checker {
    visited: HashSet<(Identity, Identity)>,
    externals: Externals,
}

impl Checker {
    fn walk(&mut self, source: Shape<'_>, target: Shape<'_>, path: &str) -> EngineResult<()> {
        match (source.resolve()?, target.resolve()?) {
            (Resolved::Primitive(s), Resolved::Primitive(t)) => {
                if s == t {
                    Ok(())
                } else {
                    Err(EngineError::Incompatible {
                        path: path.to_string(),
                        source_kind: s.to_string(),
                        target_kind: t.to_string(),
                    })
                }
            }
            (Resolved::Array(s), Resolved::Array(t)) => self.walk(s, t, &format!("{}[0]", path)),
            (Resolved::Map(sk, sv), Resolved::Map(tk, tv)) => {
                self.walk(sk, tk, &format!("{}.key", path))?;
                self.walk(sv, tv, &format!("{}.value", path))
            }
            (Resolved::Object(s), Resolved::Object(t)) => {
                // Pairs are entered once; a revisit is a cycle that already holds.
                if let (Some(si), Some(ti)) = (&s.identity, &t.identity) {
                    if !self.visited.insert((si.clone(), ti.clone())) {
                        return Ok(());
                    }
                }
                for &attr in &t.attributes {
                    match resolve_field(&s.attributes, attr, self.externals) {
                        FieldMatch::Matched(src) => self.walk(
                            s.attribute_shape(src),
                            t.attribute_shape(attr),
                            &format!("{}.{}", path, attr.name),
                        )?,
                        FieldMatch::Skipped => {}
                        FieldMatch::Unresolved => {
                            return Err(unresolved_error(
                                attr,
                                &s.type_name(),
                                &t.type_name(),
                                self.externals,
                            ))
                        }
                    }
                }
                Ok(())
            }
            (_, Resolved::Object(_)) => Err(EngineError::NotAStruct {
                path: path.to_string(),
                kind: source.kind_name()?,
            }),
            (Resolved::Object(_), _) => Err(EngineError::UnexpectedStruct {
                path: path.to_string(),
                kind: target.kind_name()?,
            }),
            _ => Err(EngineError::Incompatible {
                path: path.to_string(),
                source_kind: source.kind_name()?,
                target_kind: target.kind_name()?,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Attribute, AttributeMeta, NamedType, PrimitiveKind, Type, TypeGraph, TypeGraphBuilder,
    };

    fn p(kind: PrimitiveKind) -> Type {
        Type::Primitive(kind)
    }

    fn graph(types: Vec<NamedType>) -> TypeGraph {
        let mut b = TypeGraphBuilder::new();
        for t in types {
            b.declare(t).unwrap();
        }
        b.finalize().unwrap()
    }

    fn check_types(source: &Type, target: &Type) -> EngineResult<()> {
        let g = TypeGraph::empty();
        check(g.shape(source), g.shape(target))
    }

    #[test]
    fn test_primitives() {
        assert!(check_types(&p(PrimitiveKind::Int), &p(PrimitiveKind::Int)).is_ok());
        let err = check_types(&p(PrimitiveKind::Int), &p(PrimitiveKind::String)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "types don't match: type of <value> is int but type of corresponding attribute is string"
        );
        // no widening
        assert!(check_types(&p(PrimitiveKind::Int32), &p(PrimitiveKind::Int64)).is_err());
    }

    #[test]
    fn test_array_path() {
        let err = check_types(
            &Type::array(p(PrimitiveKind::Int)),
            &Type::array(p(PrimitiveKind::String)),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "types don't match: type of <value>[0] is int but type of corresponding attribute is string"
        );
    }

    #[test]
    fn test_map_paths() {
        let string = p(PrimitiveKind::String);
        let int = p(PrimitiveKind::Int);
        let err = check_types(
            &Type::map(int.clone(), string.clone()),
            &Type::map(string.clone(), string.clone()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("type of <value>.key is int"));
        let err = check_types(
            &Type::map(string.clone(), int),
            &Type::map(string.clone(), string),
        )
        .unwrap_err();
        assert!(err.to_string().contains("type of <value>.value is int"));
    }

    #[test]
    fn test_scalar_against_object() {
        let g = graph(vec![NamedType::new(
            "objT",
            Type::Object(vec![Attribute::required("Foo", p(PrimitiveKind::String))]),
        )]);
        let string = p(PrimitiveKind::String);
        let err = check(g.shape(&string), g.named_shape("objT").unwrap()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "types don't match: <value> is a string, expected a struct"
        );
        let err = check(g.named_shape("objT").unwrap(), g.shape(&string)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "types don't match: <value> is a struct, expected a string"
        );
    }

    #[test]
    fn test_array_against_map() {
        let err = check_types(
            &Type::array(p(PrimitiveKind::String)),
            &Type::map(p(PrimitiveKind::String), p(PrimitiveKind::String)),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "types don't match: type of <value> is array but type of corresponding attribute is map"
        );
    }

    #[test]
    fn test_nested_attribute_path() {
        let g = graph(vec![
            NamedType::new(
                "Inner",
                Type::Object(vec![Attribute::required("n", p(PrimitiveKind::Int))]),
            ),
            NamedType::new(
                "InnerWire",
                Type::Object(vec![Attribute::required("n", p(PrimitiveKind::Int64))]),
            ),
            NamedType::new(
                "Outer",
                Type::Object(vec![Attribute::required(
                    "items",
                    Type::array(Type::named("Inner")),
                )]),
            ),
            NamedType::new(
                "OuterWire",
                Type::Object(vec![Attribute::required(
                    "items",
                    Type::array(Type::named("InnerWire")),
                )]),
            ),
        ]);
        let err = check(
            g.named_shape("Outer").unwrap(),
            g.named_shape("OuterWire").unwrap(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "types don't match: type of <value>.items[0].n is int but type of corresponding attribute is int64"
        );
    }

    #[test]
    fn test_skipped_target_attribute() {
        let g = graph(vec![
            NamedType::new(
                "Src",
                Type::Object(vec![Attribute::required("a", p(PrimitiveKind::String))]),
            ),
            NamedType::new(
                "Dst",
                Type::Object(vec![
                    Attribute::required("a", p(PrimitiveKind::String)),
                    Attribute::optional("ignored", p(PrimitiveKind::Boolean))
                        .with_meta(AttributeMeta::default().skip()),
                ]),
            ),
        ]);
        assert!(check(g.named_shape("Src").unwrap(), g.named_shape("Dst").unwrap()).is_ok());
    }

    #[test]
    fn test_self_reference_terminates() {
        let node = NamedType::new(
            "Node",
            Type::Object(vec![
                Attribute::required("value", p(PrimitiveKind::Int)),
                Attribute::optional("next", Type::named("Node")),
            ]),
        );
        let g = graph(vec![node]);
        let shape = g.named_shape("Node").unwrap();
        assert!(check(shape, shape).is_ok());
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let g = graph(vec![
            NamedType::new(
                "A",
                Type::Object(vec![Attribute::optional("b", Type::named("B"))]),
            ),
            NamedType::new(
                "B",
                Type::Object(vec![Attribute::optional("a", Type::named("A"))]),
            ),
        ]);
        let a = g.named_shape("A").unwrap();
        assert!(check(a, a).is_ok());
    }

    #[test]
    fn test_ignored_externals() {
        let g = graph(vec![
            NamedType::new(
                "Design",
                Type::Object(vec![Attribute::required("name", p(PrimitiveKind::String))
                    .with_meta(AttributeMeta::default().external("Name"))]),
            ),
            NamedType::new(
                "Wire",
                Type::Object(vec![Attribute::required("name", p(PrimitiveKind::String))]),
            ),
        ]);
        let design = g.named_shape("Design").unwrap();
        let wire = g.named_shape("Wire").unwrap();
        assert!(check(design, wire).is_err());
        assert!(compatible_with(design, wire, ROOT_PATH, Externals::Ignore).is_ok());
    }

    #[test]
    fn test_custom_root_path() {
        let err = compatible(
            TypeGraph::empty().shape(&p(PrimitiveKind::Boolean)),
            TypeGraph::empty().shape(&p(PrimitiveKind::String)),
            "payload",
        )
        .unwrap_err();
        assert!(err.to_string().contains("type of payload is boolean"));
    }
}
