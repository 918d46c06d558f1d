//! # Message Lifting
//!
//! Derives the message shape of a design shape.

use crate::error::EngineResult;
use crate::message::MessageShape;
use crate::transform::WRAP_FIELD;
use crate::types::{
    Attribute, AttributeMeta, Identity, NamedType, ObjectShape, Resolved, Shape, Type,
    TypeGraphBuilder,
};
use heck::ToUpperCamelCase;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

/// Derives the message named `name` from `design`.
///
/// - named objects become messages; a view `v` of `T` becomes message `TV`.
/// - anonymous objects become messages named after their position.
/// - aliases of non-objects are inlined.
/// - composite fields are optional, other fields keep their requiredness.
/// - explicit `rpc:tag`s are kept, the others are numbered from 1 in
///   declaration order, skipping the tags in use.
/// - a root that is not an object is wrapped into `{ field }` with tag 1.
pub fn lift_message(design: Shape<'_>, name: &str) -> EngineResult<MessageShape> {
    let mut lifter = MessageLifter::default();
    lifter.taken.insert(name.to_string());

    let wrapped = match design.resolve()? {
        Resolved::Object(obj) => {
            if let Some(identity) = &obj.identity {
                lifter.names.insert(identity.clone(), name.to_string());
            }
            lifter.declare_object(name, &obj)?;
            false
        }
        _ => {
            let ty = lifter.lift_type(design, &format!("{}Field", name))?;
            let field =
                Attribute::required(WRAP_FIELD, ty).with_meta(AttributeMeta::default().tag(1));
            debug!(message = name, "wrapped bare value into field");
            lifter
                .builder
                .declare(NamedType::new(name, Type::Object(vec![field])))?;
            true
        }
    };

    Ok(MessageShape {
        graph: lifter.builder.finalize()?,
        root: Type::named(name),
        name: name.to_string(),
        wrapped,
    })
}

#[derive(Default)]
struct MessageLifter {
    builder: TypeGraphBuilder,
    /// Message name per design identity, reserved before the message is built.
    names: IndexMap<Identity, String>,
    taken: HashSet<String>,
}

impl MessageLifter {
    fn lift_type(&mut self, shape: Shape<'_>, context: &str) -> EngineResult<Type> {
        Ok(match shape.resolve()? {
            Resolved::Primitive(kind) => Type::Primitive(kind),
            Resolved::Array(elem) => Type::array(self.lift_type(elem, context)?),
            Resolved::Map(key, value) => {
                Type::map(self.lift_type(key, context)?, self.lift_type(value, context)?)
            }
            Resolved::Object(obj) => match obj.identity.clone() {
                Some(identity) => Type::named(self.named_message(identity, &obj)?),
                None => {
                    let name = self.unique(context);
                    self.declare_object(&name, &obj)?;
                    Type::named(name)
                }
            },
        })
    }

    fn named_message(&mut self, identity: Identity, obj: &ObjectShape<'_>) -> EngineResult<String> {
        if let Some(name) = self.names.get(&identity) {
            return Ok(name.clone());
        }
        let base = match &identity.view {
            Some(view) => format!("{}{}", identity.name, view.to_upper_camel_case()),
            None => identity.name.clone(),
        };
        let name = self.unique(&base);
        self.names.insert(identity, name.clone());
        self.declare_object(&name, obj)?;
        Ok(name)
    }

    fn declare_object(&mut self, name: &str, obj: &ObjectShape<'_>) -> EngineResult<()> {
        let mut attributes = Vec::with_capacity(obj.attributes.len());
        for &attr in &obj.attributes {
            let shape = obj.attribute_shape(attr);
            let context = format!("{}{}", name, attr.name.to_upper_camel_case());
            let ty = self.lift_type(shape, &context)?;
            let meta = AttributeMeta {
                rpc_tag: attr.meta.rpc_tag,
                ..AttributeMeta::default()
            };
            let lifted = if attr.required && !shape.is_object()? {
                Attribute::required(&attr.name, ty)
            } else {
                Attribute::optional(&attr.name, ty)
            };
            attributes.push(lifted.with_meta(meta));
        }
        assign_tags(name, &mut attributes);
        self.builder
            .declare(NamedType::new(name, Type::Object(attributes)))
    }

    fn unique(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 2;
        while !self.taken.insert(name.clone()) {
            name = format!("{}{}", base, n);
            n += 1;
        }
        name
    }
}

fn assign_tags(message: &str, attributes: &mut [Attribute]) {
    let used: HashSet<u32> = attributes.iter().filter_map(|a| a.meta.rpc_tag).collect();
    let mut next = 1;
    for attr in attributes.iter_mut().filter(|a| a.meta.rpc_tag.is_none()) {
        while used.contains(&next) {
            next += 1;
        }
        debug!(message, field = %attr.name, tag = next, "assigned rpc:tag");
        attr.meta.rpc_tag = Some(next);
        next += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, TypeGraph};
    use pretty_assertions::assert_eq;

    fn p(kind: PrimitiveKind) -> Type {
        Type::Primitive(kind)
    }

    fn design() -> TypeGraph {
        let mut b = TypeGraphBuilder::new();
        b.declare(
            NamedType::new(
                "User",
                Type::Object(vec![
                    Attribute::required("id", p(PrimitiveKind::String)),
                    Attribute::optional("age", p(PrimitiveKind::Int))
                        .with_meta(AttributeMeta::default().tag(1)),
                    Attribute::required("friend", Type::named("User"))
                        .with_meta(AttributeMeta::default().external("Buddy")),
                    Attribute::required(
                        "address",
                        Type::Object(vec![Attribute::required("city", p(PrimitiveKind::String))]),
                    ),
                ]),
            )
            .with_view("tiny", &["id"]),
        )
        .unwrap();
        b.finalize().unwrap()
    }

    #[test]
    fn test_tags_and_optionality() {
        let g = design();
        let msg = lift_message(g.named_shape("User").unwrap(), "GetUserResponse").unwrap();
        assert!(!msg.is_wrapped());
        let fields = msg.fields().unwrap();
        let summary: Vec<(&str, u32, bool)> = fields
            .iter()
            .map(|f| (f.name.as_str(), f.tag, f.required))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("id", 2, true),
                ("age", 1, false),
                ("friend", 3, false),
                ("address", 4, false),
            ]
        );
        // self reference maps back to the root message, external mapping is gone
        assert_eq!(fields[2].wire_type, "GetUserResponse");
        let friend = msg.graph().get("GetUserResponse").unwrap();
        let Type::Object(attrs) = &friend.underlying else {
            panic!("expected object");
        };
        assert!(attrs[2].meta.external.is_none());
        assert_eq!(fields[3].wire_type, "GetUserResponseAddress");
    }

    #[test]
    fn test_wrap_scalar_root() {
        let g = TypeGraph::empty();
        let ty = Type::array(p(PrimitiveKind::Int64));
        let msg = lift_message(g.shape(&ty), "ListRequest").unwrap();
        assert!(msg.is_wrapped());
        let fields = msg.fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "field");
        assert_eq!(fields[0].tag, 1);
        assert_eq!(fields[0].wire_type, "repeated sint64");
    }

    #[test]
    fn test_view_message_name() {
        let g = design();
        let ty = Type::array(Type::named("User"));
        let list = g.shape(&ty).with_view("tiny");
        let msg = lift_message(list, "ListResponse").unwrap();
        let schema = msg.schema().unwrap();
        let names: Vec<&str> = schema.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["ListResponse", "UserTiny"]);
        assert_eq!(schema.messages[1].fields.len(), 1);
    }
}
