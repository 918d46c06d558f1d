//! Pairs a design shape with the message shape lifted from it.

use crate::error::EngineResult;
use crate::message::{lift_message, MessageShape};
use crate::transform::helpers::HelperRegistry;
use crate::transform::{check_with, synthesize, Binding, Direction, Options, Plan};
use crate::types::Shape;

/// A design shape bound to a protocol message shape.
#[derive(Debug, Clone)]
pub struct MessageBinding<'d> {
    design: Shape<'d>,
    message: MessageShape,
}

impl<'d> MessageBinding<'d> {
    /// Binds `design` to the message `name` lifted from it.
    pub fn new(design: Shape<'d>, name: &str) -> EngineResult<Self> {
        Ok(Self {
            design,
            message: lift_message(design, name)?,
        })
    }

    /// The design side.
    pub fn design(&self) -> Shape<'d> {
        self.design
    }

    /// The message side.
    pub fn message(&self) -> &MessageShape {
        &self.message
    }

    /// Checks that design values marshal into the message.
    pub fn check_to_message(&self) -> EngineResult<()> {
        check_with(
            self.design,
            self.message.shape(),
            &Options::new(Direction::ToMessage),
        )
    }

    /// Checks that messages unmarshal into design values.
    pub fn check_from_message(&self) -> EngineResult<()> {
        check_with(
            self.message.shape(),
            self.design,
            &Options::new(Direction::FromMessage),
        )
    }

    /// Synthesizes the design to message conversion.
    pub fn to_message(
        &self,
        design: &Binding,
        message: &Binding,
        registry: &mut HelperRegistry,
    ) -> EngineResult<Plan> {
        synthesize(
            self.design,
            self.message.shape(),
            design,
            message,
            &Options::new(Direction::ToMessage),
            registry,
        )
    }

    /// Synthesizes the message to design conversion.
    pub fn from_message(
        &self,
        message: &Binding,
        design: &Binding,
        registry: &mut HelperRegistry,
    ) -> EngineResult<Plan> {
        synthesize(
            self.message.shape(),
            self.design,
            message,
            design,
            &Options::new(Direction::FromMessage),
            registry,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::apply;
    use crate::transform::plan::Transform;
    use crate::types::{
        Attribute, AttributeMeta, NamedType, PrimitiveKind, Type, TypeGraph, TypeGraphBuilder,
    };
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn p(kind: PrimitiveKind) -> Type {
        Type::Primitive(kind)
    }

    #[test]
    fn test_scalar_round_trip() {
        let g = TypeGraph::empty();
        let string = p(PrimitiveKind::String);
        let binding = MessageBinding::new(g.shape(&string), "EchoRequest").unwrap();
        binding.check_to_message().unwrap();
        binding.check_from_message().unwrap();
        assert_eq!(binding.message().fields().unwrap()[0].tag, 1);

        let mut registry = HelperRegistry::new();
        let out = binding
            .to_message(&Binding::new("p"), &Binding::new("msg").with_module("pb"), &mut registry)
            .unwrap();
        let back = binding
            .from_message(&Binding::new("msg"), &Binding::new("p"), &mut registry)
            .unwrap();
        assert!(matches!(out.transform, Transform::Wrap { .. }));
        assert!(registry.is_empty());

        let sample = Value::from("hello");
        let msg = apply(&out, &registry, &sample).unwrap();
        assert_eq!(msg, Value::object([("field", Value::from("hello"))]));
        assert_eq!(apply(&back, &registry, &msg).unwrap(), sample);
    }

    #[test]
    fn test_object_round_trip() {
        let mut b = TypeGraphBuilder::new();
        b.declare(NamedType::new(
            "Address",
            Type::Object(vec![Attribute::required("city", p(PrimitiveKind::String))]),
        ))
        .unwrap();
        b.declare(NamedType::new(
            "User",
            Type::Object(vec![
                Attribute::required("name", p(PrimitiveKind::String)),
                Attribute::required("address", Type::named("Address"))
                    .with_meta(AttributeMeta::default().external("Home")),
            ]),
        ))
        .unwrap();
        let g = b.finalize().unwrap();
        let binding = MessageBinding::new(g.named_shape("User").unwrap(), "User").unwrap();

        let mut registry = HelperRegistry::new();
        let out = binding
            .to_message(&Binding::new("u"), &Binding::new("msg"), &mut registry)
            .unwrap();
        let back = binding
            .from_message(&Binding::new("msg"), &Binding::new("u"), &mut registry)
            .unwrap();
        let names: Vec<&str> = registry.helpers().map(|h| h.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["marshal_address_to_address", "unmarshal_address_to_address"]
        );

        let sample = Value::object([
            ("name", Value::from("ada")),
            ("address", Value::object([("city", Value::from("london"))])),
        ]);
        let msg = apply(&out, &registry, &sample).unwrap();
        assert_eq!(
            msg,
            Value::object([
                ("name", Value::from("ada")),
                ("address", Value::present(Value::object([("city", Value::from("london"))]))),
            ])
        );
        assert_eq!(apply(&back, &registry, &msg).unwrap(), sample);
    }

    #[test]
    fn test_reshaped_attribute_round_trip() {
        let mut b = TypeGraphBuilder::new();
        b.declare(NamedType::new(
            "Reshaped",
            Type::Object(vec![
                Attribute::required("id", p(PrimitiveKind::Int64)),
                Attribute::required("b", p(PrimitiveKind::String))
                    .with_meta(AttributeMeta::default().origin("a")),
            ]),
        ))
        .unwrap();
        let g = b.finalize().unwrap();
        let binding = MessageBinding::new(g.named_shape("Reshaped").unwrap(), "ReshapedMsg")
            .unwrap();
        let fields = binding.message().fields().unwrap();
        assert_eq!(fields[1].name, "b");
        binding.check_to_message().unwrap();
        binding.check_from_message().unwrap();

        let mut registry = HelperRegistry::new();
        let out = binding
            .to_message(&Binding::new("r"), &Binding::new("msg"), &mut registry)
            .unwrap();
        let back = binding
            .from_message(&Binding::new("msg"), &Binding::new("r"), &mut registry)
            .unwrap();
        let sample = Value::object([("id", Value::Int(7)), ("b", Value::from("bee"))]);
        let msg = apply(&out, &registry, &sample).unwrap();
        assert_eq!(apply(&back, &registry, &msg).unwrap(), sample);
    }
}
