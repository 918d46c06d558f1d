#![deny(missing_docs)]

//! # Type Graph
//!
//! The global-by-name table of named types, its finalization pass, and the
//! borrowed `Shape` view every other stage walks.
//!
//! Named types are stored once and referenced by name, so self-referential
//! types are a graph with back-references rather than an infinite tree.

use crate::error::{EngineError, EngineResult};
use crate::types::model::{Attribute, NamedType, PrimitiveKind, Type};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Display;

/// Incremental builder used by the authoring phase.
#[derive(Debug, Default)]
pub struct TypeGraphBuilder {
    types: IndexMap<String, NamedType>,
}

impl TypeGraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a named type. Each name may be declared once.
    pub fn declare(&mut self, named: NamedType) -> EngineResult<()> {
        if self.types.contains_key(&named.name) {
            return Err(EngineError::InvalidGraph(format!(
                "type {:?} declared twice",
                named.name
            )));
        }
        self.types.insert(named.name.clone(), named);
        Ok(())
    }

    /// Validates the declarations and freezes them into a `TypeGraph`.
    pub fn finalize(self) -> EngineResult<TypeGraph> {
        let refs = self
            .types
            .keys()
            .map(|name| (name.clone(), Type::Named(name.clone())))
            .collect();
        let graph = TypeGraph {
            types: self.types,
            refs,
        };

        for named in graph.types.values() {
            graph.check_alias_chain(&named.name)?;
        }
        for named in graph.types.values() {
            graph.validate_type(&named.underlying, &named.name)?;
            if !named.views.is_empty() {
                let attributes = match graph.underlying_object(&named.name)? {
                    Some(attrs) => attrs,
                    None => {
                        return Err(EngineError::InvalidGraph(format!(
                            "type {:?} has views but is not an object",
                            named.name
                        )))
                    }
                };
                for view in &named.views {
                    for attr in &view.attributes {
                        if !attributes.iter().any(|a| &a.name == attr) {
                            return Err(EngineError::InvalidGraph(format!(
                                "view {:?} of type {:?} names unknown attribute {:?}",
                                view.name, named.name, attr
                            )));
                        }
                    }
                }
            }
        }
        Ok(graph)
    }
}

/// A finalized, read-only type graph.
#[derive(Debug, Default, Clone)]
pub struct TypeGraph {
    types: IndexMap<String, NamedType>,
    refs: IndexMap<String, Type>,
}

impl TypeGraph {
    /// A graph without named types, for shapes made only of primitives and collections.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Looks up a named type.
    pub fn get(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    /// Looks up a named type, reporting a missing one as a graph defect.
    pub fn lookup(&self, name: &str) -> EngineResult<&NamedType> {
        self.get(name)
            .ok_or_else(|| EngineError::InvalidGraph(format!("unknown type {:?}", name)))
    }

    /// Iterates the named types in declaration order.
    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.types.values()
    }

    /// Number of named types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the graph has no named types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// A shape over a type owned by the caller (or by this graph).
    pub fn shape<'g>(&'g self, ty: &'g Type) -> Shape<'g> {
        Shape {
            graph: self,
            ty,
            view: None,
        }
    }

    /// The shape of a named type of this graph.
    pub fn named_shape(&self, name: &str) -> EngineResult<Shape<'_>> {
        let ty = self
            .refs
            .get(name)
            .ok_or_else(|| EngineError::InvalidGraph(format!("unknown type {:?}", name)))?;
        Ok(self.shape(ty))
    }

    /// Validates a type that is not part of the table (e.g. an anonymous root)
    /// against the finalized graph.
    pub fn validate_root(&self, ty: &Type) -> EngineResult<()> {
        self.validate_type(ty, "<root>")
    }

    fn validate_type(&self, ty: &Type, context: &str) -> EngineResult<()> {
        match ty {
            Type::Primitive(_) => Ok(()),
            Type::Array(elem) => self.validate_type(elem, context),
            Type::Map(key, value) => {
                self.validate_type(key, context)?;
                self.validate_type(value, context)
            }
            Type::Named(name) => {
                if self.types.contains_key(name) {
                    Ok(())
                } else {
                    Err(EngineError::InvalidGraph(format!(
                        "{} references unknown type {:?}",
                        context, name
                    )))
                }
            }
            Type::Object(attributes) => {
                let mut names = HashSet::new();
                let mut tags = HashSet::new();
                for attr in attributes {
                    if !names.insert(attr.name.as_str()) {
                        return Err(EngineError::InvalidGraph(format!(
                            "{} declares attribute {:?} twice",
                            context, attr.name
                        )));
                    }
                    if let Some(tag) = attr.meta.rpc_tag {
                        if !tags.insert(tag) {
                            return Err(EngineError::InvalidGraph(format!(
                                "{} uses rpc:tag {} twice",
                                context, tag
                            )));
                        }
                    }
                    self.validate_type(&attr.ty, context)?;
                    if let Some(view) = &attr.meta.view {
                        self.validate_view_reference(attr, view, context)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn validate_view_reference(
        &self,
        attr: &Attribute,
        view: &str,
        context: &str,
    ) -> EngineResult<()> {
        let target = view_target(&attr.ty).ok_or_else(|| {
            EngineError::InvalidGraph(format!(
                "{}: attribute {:?} selects view {:?} but is not a named type",
                context, attr.name, view
            ))
        })?;
        if self.lookup(target)?.view(view).is_none() {
            return Err(EngineError::InvalidGraph(format!(
                "{}: attribute {:?} selects unknown view {:?} of type {:?}",
                context, attr.name, view, target
            )));
        }
        Ok(())
    }

    fn check_alias_chain(&self, start: &str) -> EngineResult<()> {
        let mut seen = HashSet::new();
        let mut current = start;
        while let Some(named) = self.types.get(current) {
            if !seen.insert(current) {
                return Err(EngineError::InvalidGraph(format!(
                    "type {:?} is an alias cycle",
                    start
                )));
            }
            match &named.underlying {
                Type::Named(next) => current = next,
                _ => break,
            }
        }
        Ok(())
    }

    fn underlying_object(&self, name: &str) -> EngineResult<Option<&[Attribute]>> {
        let mut current = self.lookup(name)?;
        loop {
            match &current.underlying {
                Type::Named(next) => current = self.lookup(next)?,
                Type::Object(attrs) => return Ok(Some(attrs)),
                _ => return Ok(None),
            }
        }
    }
}

/// The named type a `view` directive applies to: the first named type
/// reached through array elements and map values.
fn view_target(ty: &Type) -> Option<&str> {
    match ty {
        Type::Named(name) => Some(name),
        Type::Array(elem) => view_target(elem),
        Type::Map(_, value) => view_target(value),
        _ => None,
    }
}

/// Identity of a named shape: the type name plus the selected view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Identity {
    /// Named type name.
    pub name: String,
    /// Selected view, if any.
    pub view: Option<String>,
}

impl Identity {
    /// Identity of a plain named type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            view: None,
        }
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.view {
            Some(view) => write!(f, "{}({})", self.name, view),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A borrowed view over a type of a graph.
#[derive(Debug, Clone, Copy)]
pub struct Shape<'g> {
    graph: &'g TypeGraph,
    ty: &'g Type,
    view: Option<&'g str>,
}

/// One level of a shape with named references followed.
#[derive(Debug, Clone)]
pub enum Resolved<'g> {
    /// A primitive.
    Primitive(PrimitiveKind),
    /// An array with its element shape.
    Array(Shape<'g>),
    /// A map with its key and value shapes.
    Map(Shape<'g>, Shape<'g>),
    /// An object, restricted to the selected view.
    Object(ObjectShape<'g>),
}

/// The attributes of a resolved object shape.
#[derive(Debug, Clone)]
pub struct ObjectShape<'g> {
    graph: &'g TypeGraph,
    /// Identity when the object was reached through a named type.
    pub identity: Option<Identity>,
    /// Attributes in declaration order.
    pub attributes: Vec<&'g Attribute>,
}

impl<'g> ObjectShape<'g> {
    /// Name used in diagnostics.
    pub fn type_name(&self) -> String {
        match &self.identity {
            Some(identity) => identity.name.clone(),
            None => "object".to_string(),
        }
    }

    /// The shape of one of the attributes, honoring its `view` directive.
    pub fn attribute_shape(&self, attr: &'g Attribute) -> Shape<'g> {
        Shape {
            graph: self.graph,
            ty: &attr.ty,
            view: attr.meta.view.as_deref(),
        }
    }

    /// Finds an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&'g Attribute> {
        self.attributes.iter().copied().find(|a| a.name == name)
    }
}

impl<'g> Shape<'g> {
    /// The graph the shape belongs to.
    pub fn graph(&self) -> &'g TypeGraph {
        self.graph
    }

    /// The unresolved type.
    pub fn ty(&self) -> &'g Type {
        self.ty
    }

    /// The selected view, if any.
    pub fn view(&self) -> Option<&'g str> {
        self.view
    }

    /// Selects a view of the named type.
    pub fn with_view(mut self, view: &'g str) -> Self {
        self.view = Some(view);
        self
    }

    /// Identity of the shape when it is a named reference.
    pub fn identity(&self) -> Option<Identity> {
        match self.ty {
            Type::Named(name) => Some(Identity {
                name: name.clone(),
                view: self.view.map(str::to_string),
            }),
            _ => None,
        }
    }

    /// Follows named references down to the first structural level.
    pub fn resolve(&self) -> EngineResult<Resolved<'g>> {
        let mut ty = self.ty;
        let mut identity = None;
        let mut view_owner: Option<&'g NamedType> = None;
        let mut hops = 0;
        loop {
            match ty {
                Type::Named(name) => {
                    let named = self.graph.lookup(name)?;
                    if identity.is_none() {
                        identity = self.identity();
                        view_owner = Some(named);
                    }
                    hops += 1;
                    if hops > self.graph.len() {
                        return Err(EngineError::InvalidGraph(format!(
                            "type {:?} is an alias cycle",
                            name
                        )));
                    }
                    ty = &named.underlying;
                }
                Type::Primitive(kind) => return Ok(Resolved::Primitive(*kind)),
                Type::Array(elem) => return Ok(Resolved::Array(self.nested(elem, self.view))),
                Type::Map(key, value) => {
                    return Ok(Resolved::Map(
                        self.nested(key, None),
                        self.nested(value, self.view),
                    ))
                }
                Type::Object(attributes) => {
                    let attributes = match (self.view, view_owner) {
                        (Some(view), Some(owner)) => {
                            let selected = owner.view(view).ok_or_else(|| {
                                EngineError::InvalidGraph(format!(
                                    "type {:?} has no view {:?}",
                                    owner.name, view
                                ))
                            })?;
                            attributes
                                .iter()
                                .filter(|a| selected.attributes.contains(&a.name))
                                .collect()
                        }
                        _ => attributes.iter().collect(),
                    };
                    return Ok(Resolved::Object(ObjectShape {
                        graph: self.graph,
                        identity,
                        attributes,
                    }));
                }
            }
        }
    }

    fn nested(&self, ty: &'g Type, view: Option<&'g str>) -> Shape<'g> {
        Shape {
            graph: self.graph,
            ty,
            view,
        }
    }

    /// Whether the shape resolves to an object.
    pub fn is_object(&self) -> EngineResult<bool> {
        Ok(matches!(self.resolve()?, Resolved::Object(_)))
    }

    /// Kind name used in diagnostics (`string`, `array`, `map`, `struct`, ...).
    pub fn kind_name(&self) -> EngineResult<String> {
        Ok(match self.resolve()? {
            Resolved::Primitive(kind) => kind.name().to_string(),
            Resolved::Array(_) => "array".to_string(),
            Resolved::Map(_, _) => "map".to_string(),
            Resolved::Object(_) => "struct".to_string(),
        })
    }

    /// Type name used in diagnostics: the named type's name or the kind name.
    pub fn type_name(&self) -> EngineResult<String> {
        match self.ty {
            Type::Named(name) => Ok(name.clone()),
            Type::Object(_) => Ok("object".to_string()),
            _ => self.kind_name(),
        }
    }

    /// Whether the shape is, or makes use of, a named type.
    ///
    /// Shapes that use none need no helper functions to be converted.
    pub fn uses_named_types(&self) -> bool {
        fn walk(ty: &Type) -> bool {
            match ty {
                Type::Primitive(_) => false,
                Type::Named(_) => true,
                Type::Array(elem) => walk(elem),
                Type::Map(key, value) => walk(key) || walk(value),
                Type::Object(attrs) => attrs.iter().any(|a| walk(&a.ty)),
            }
        }
        walk(self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::meta::AttributeMeta;

    fn string() -> Type {
        Type::Primitive(PrimitiveKind::String)
    }

    fn user_graph() -> TypeGraph {
        let mut b = TypeGraphBuilder::new();
        b.declare(
            NamedType::new(
                "User",
                Type::Object(vec![
                    Attribute::required("id", string()),
                    Attribute::optional("name", string()),
                    Attribute::optional("friend", Type::named("User")),
                ]),
            )
            .with_view("tiny", &["id"]),
        )
        .unwrap();
        b.finalize().unwrap()
    }

    #[test]
    fn test_duplicate_declaration() {
        let mut b = TypeGraphBuilder::new();
        b.declare(NamedType::new("A", string())).unwrap();
        let err = b.declare(NamedType::new("A", string())).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_unknown_reference() {
        let mut b = TypeGraphBuilder::new();
        b.declare(NamedType::new("A", Type::array(Type::named("Missing"))))
            .unwrap();
        let err = b.finalize().unwrap_err();
        assert!(err.to_string().contains("unknown type \"Missing\""));
    }

    #[test]
    fn test_duplicate_attribute() {
        let mut b = TypeGraphBuilder::new();
        b.declare(NamedType::new(
            "A",
            Type::Object(vec![
                Attribute::required("x", string()),
                Attribute::optional("x", string()),
            ]),
        ))
        .unwrap();
        assert!(b.finalize().is_err());
    }

    #[test]
    fn test_alias_cycle() {
        let mut b = TypeGraphBuilder::new();
        b.declare(NamedType::new("A", Type::named("B"))).unwrap();
        b.declare(NamedType::new("B", Type::named("A"))).unwrap();
        let err = b.finalize().unwrap_err();
        assert!(err.to_string().contains("alias cycle"));
    }

    #[test]
    fn test_view_on_unknown_attribute() {
        let mut b = TypeGraphBuilder::new();
        b.declare(
            NamedType::new("A", Type::Object(vec![Attribute::required("x", string())]))
                .with_view("v", &["y"]),
        )
        .unwrap();
        assert!(b.finalize().is_err());
    }

    #[test]
    fn test_view_reference_validated() {
        let mut b = TypeGraphBuilder::new();
        b.declare(NamedType::new("A", Type::Object(vec![Attribute::required("x", string())])))
            .unwrap();
        b.declare(NamedType::new(
            "B",
            Type::Object(vec![Attribute::required("a", Type::named("A"))
                .with_meta(AttributeMeta::default().view("tiny"))]),
        ))
        .unwrap();
        let err = b.finalize().unwrap_err();
        assert!(err.to_string().contains("unknown view"));
    }

    #[test]
    fn test_resolve_self_reference() {
        let graph = user_graph();
        let shape = graph.named_shape("User").unwrap();
        let Resolved::Object(obj) = shape.resolve().unwrap() else {
            panic!("expected object");
        };
        assert_eq!(obj.identity, Some(Identity::new("User")));
        assert_eq!(obj.attributes.len(), 3);
        let friend = obj.attribute_shape(obj.attribute("friend").unwrap());
        assert_eq!(friend.identity(), Some(Identity::new("User")));
    }

    #[test]
    fn test_resolve_view() {
        let graph = user_graph();
        let shape = graph.named_shape("User").unwrap().with_view("tiny");
        let Resolved::Object(obj) = shape.resolve().unwrap() else {
            panic!("expected object");
        };
        assert_eq!(obj.attributes.len(), 1);
        assert_eq!(obj.attributes[0].name, "id");
        assert_eq!(obj.identity.unwrap().to_string(), "User(tiny)");
    }

    #[test]
    fn test_kind_and_type_names() {
        let graph = user_graph();
        let arr = Type::array(string());
        assert_eq!(graph.shape(&arr).kind_name().unwrap(), "array");
        assert_eq!(graph.named_shape("User").unwrap().kind_name().unwrap(), "struct");
        assert_eq!(graph.named_shape("User").unwrap().type_name().unwrap(), "User");
    }

    #[test]
    fn test_uses_named_types() {
        let graph = user_graph();
        let plain = Type::map(string(), Type::array(string()));
        assert!(!graph.shape(&plain).uses_named_types());
        let nested = Type::array(Type::named("User"));
        assert!(graph.shape(&nested).uses_named_types());
    }
}
