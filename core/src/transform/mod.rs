#![deny(missing_docs)]

//! # Transform Synthesizer
//!
//! Builds the operation plan converting a value of a source shape into a
//! value of a target shape.
//!
//! - `plan`: the plan vocabulary (`Transform`, `ObjectPlan`, `Optionality`).
//! - `helpers`: the caller-owned helper registry.
//! - `apply`: executes a plan against a sample `Value`.
//! - `render`: renders a plan and its helpers as Rust source.
//!
//! Synthesis always runs the compatibility check first. Nested named objects
//! are delegated to helpers keyed by `(source, target, direction)`; every
//! other shape is inlined.

/// Plan vocabulary.
pub mod plan;

/// Helper registry.
pub mod helpers;

/// Plan interpreter.
pub mod apply;

/// Rust text backend.
pub mod render;

use crate::compat::{compatible_with, ROOT_PATH};
use crate::error::{EngineError, EngineResult};
use crate::matching::{resolve_field, unresolved_error, Externals, FieldMatch};
use crate::types::{ObjectShape, Resolved, Shape};
use crate::value::Value;
use helpers::{HelperKey, HelperRegistry};
use plan::{Assignment, ObjectPlan, Optionality, SkippedField, Transform, TypeRef};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

pub use apply::apply;
pub use helpers::HelperDef;
pub use render::{render_helper, render_plan, render_unit};

/// Name of the single attribute of a message wrapping a bare value.
pub const WRAP_FIELD: &str = "field";

/// Direction of a conversion relative to the design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Design value to external native composite.
    ToNative,
    /// External native composite to design value.
    FromNative,
    /// Design value to protocol message.
    ToMessage,
    /// Protocol message to design value.
    FromMessage,
}

impl Direction {
    /// Verb prefixed to helper names.
    pub fn verb(self) -> &'static str {
        match self {
            Direction::ToNative => "convert",
            Direction::FromNative => "create",
            Direction::ToMessage => "marshal",
            Direction::FromMessage => "unmarshal",
        }
    }

    /// Whether the direction converts to or from a protocol message.
    pub fn is_message(self) -> bool {
        matches!(self, Direction::ToMessage | Direction::FromMessage)
    }
}

/// Synthesis options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Conversion direction.
    pub direction: Direction,
    /// Wrap bare values into the single `field` attribute of a message.
    pub wrap_scalars: bool,
}

impl Options {
    /// Options for a direction, with wrapping enabled for message directions.
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            wrap_scalars: direction.is_message(),
        }
    }

    /// Native field mappings apply to native directions only.
    pub fn externals(&self) -> Externals {
        if self.direction.is_message() {
            Externals::Ignore
        } else {
            Externals::Honor
        }
    }
}

/// A variable holding one side of a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    /// Variable name.
    pub var: String,
    /// Module qualifying the side's named types.
    pub module: Option<String>,
    /// Whether the variable holds an optional value.
    pub optional: bool,
}

impl Binding {
    /// A required binding without module.
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            module: None,
            optional: false,
        }
    }

    /// Qualifies the side's named types with `module`.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Marks the binding optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// A synthesized conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    /// Source variable.
    pub source: Binding,
    /// Target variable.
    pub target: Binding,
    /// Presence conversion between the two variables.
    pub optionality: Optionality,
    /// Value conversion.
    pub transform: Transform,
}

impl Plan {
    /// Helpers the plan calls, directly or through other helpers, in
    /// registration order.
    pub fn helpers<'r>(&self, registry: &'r HelperRegistry) -> Vec<&'r HelperDef> {
        let mut reached: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = self.transform.calls();
        while let Some(name) = stack.pop() {
            if let Some(def) = registry.get(name) {
                if reached.insert(def.name.as_str()) {
                    for a in &def.body.assignments {
                        stack.extend(a.transform.calls());
                    }
                }
            }
        }
        registry
            .helpers()
            .filter(|def| reached.contains(def.name.as_str()))
            .collect()
    }
}

/// Synthesizes the conversion of `source` into `target`.
///
/// Helpers are registered into `registry`; on failure every helper
/// registered by this call is dropped again.
pub fn synthesize(
    source: Shape<'_>,
    target: Shape<'_>,
    source_binding: &Binding,
    target_binding: &Binding,
    options: &Options,
    registry: &mut HelperRegistry,
) -> EngineResult<Plan> {
    let mark = registry.len();
    let result = build_plan(source, target, source_binding, target_binding, options, registry);
    if result.is_err() {
        registry.truncate(mark);
    }
    result
}

fn build_plan(
    source: Shape<'_>,
    target: Shape<'_>,
    source_binding: &Binding,
    target_binding: &Binding,
    options: &Options,
    registry: &mut HelperRegistry,
) -> EngineResult<Plan> {
    let externals = options.externals();
    let mut synth = Synthesizer {
        registry,
        direction: options.direction,
        externals,
        source_module: source_binding.module.clone(),
        target_module: target_binding.module.clone(),
    };

    let transform = match pairing(source, target, options)? {
        Pairing::Wrap(field, required) => {
            compatible_with(source, field, ROOT_PATH, externals)?;
            Transform::Wrap {
                target: target.identity().map(|identity| TypeRef {
                    identity,
                    module: target_binding.module.clone(),
                }),
                field: WRAP_FIELD.to_string(),
                optionality: Optionality::between(true, required),
                inner: Box::new(synth.value(source, field, ROOT_PATH)?),
            }
        }
        Pairing::Unwrap(field, required) => {
            compatible_with(field, target, ROOT_PATH, externals)?;
            Transform::Unwrap {
                field: WRAP_FIELD.to_string(),
                optionality: Optionality::between(required, true),
                inner: Box::new(synth.value(field, target, ROOT_PATH)?),
            }
        }
        Pairing::Direct => {
            compatible_with(source, target, ROOT_PATH, externals)?;
            synth.value(source, target, ROOT_PATH)?
        }
    };

    Ok(Plan {
        source: source_binding.clone(),
        target: target_binding.clone(),
        optionality: Optionality::between(!source_binding.optional, !target_binding.optional),
        transform,
    })
}

/// Checks `source` against `target` the way [`synthesize`] pairs them,
/// i.e. against the `field` attribute when a bare value is wrapped.
pub fn check_with(source: Shape<'_>, target: Shape<'_>, options: &Options) -> EngineResult<()> {
    let externals = options.externals();
    match pairing(source, target, options)? {
        Pairing::Wrap(field, _) => compatible_with(source, field, ROOT_PATH, externals),
        Pairing::Unwrap(field, _) => compatible_with(field, target, ROOT_PATH, externals),
        Pairing::Direct => compatible_with(source, target, ROOT_PATH, externals),
    }
}

/// How the two roots of a request are paired.
enum Pairing<'s, 't> {
    /// Root to root.
    Direct,
    /// Bare source into the wrapper `field` of the target.
    Wrap(Shape<'t>, bool),
    /// Wrapper `field` of the source into the bare target.
    Unwrap(Shape<'s>, bool),
}

fn pairing<'s, 't>(
    source: Shape<'s>,
    target: Shape<'t>,
    options: &Options,
) -> EngineResult<Pairing<'s, 't>> {
    if !options.wrap_scalars {
        return Ok(Pairing::Direct);
    }
    match options.direction {
        Direction::ToMessage if !source.is_object()? => Ok(wrapper_field(target)?
            .map_or(Pairing::Direct, |(field, required)| Pairing::Wrap(field, required))),
        Direction::FromMessage if !target.is_object()? => Ok(wrapper_field(source)?
            .map_or(Pairing::Direct, |(field, required)| Pairing::Unwrap(field, required))),
        _ => Ok(Pairing::Direct),
    }
}

/// The `field` attribute of a wrapper message and its requiredness.
fn wrapper_field<'g>(shape: Shape<'g>) -> EngineResult<Option<(Shape<'g>, bool)>> {
    match shape.resolve()? {
        Resolved::Object(obj) => match obj.attributes.as_slice() {
            [only] if only.name == WRAP_FIELD => {
                Ok(Some((obj.attribute_shape(*only), only.required)))
            }
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

struct Synthesizer<'r> {
    registry: &'r mut HelperRegistry,
    direction: Direction,
    externals: Externals,
    source_module: Option<String>,
    target_module: Option<String>,
}

impl Synthesizer<'_> {
    /// Inline conversion of one level; nested named objects become calls.
    fn value(
        &mut self,
        source: Shape<'_>,
        target: Shape<'_>,
        path: &str,
    ) -> EngineResult<Transform> {
        match (source.resolve()?, target.resolve()?) {
            (Resolved::Primitive(kind), Resolved::Primitive(_)) => Ok(Transform::Copy(kind)),
            (Resolved::Array(s), Resolved::Array(t)) => Ok(Transform::Array(Box::new(
                self.nested(s, t, &format!("{}[0]", path))?,
            ))),
            (Resolved::Map(sk, sv), Resolved::Map(tk, tv)) => Ok(Transform::Map {
                key: Box::new(self.nested(sk, tk, &format!("{}.key", path))?),
                value: Box::new(self.nested(sv, tv, &format!("{}.value", path))?),
            }),
            (Resolved::Object(s), Resolved::Object(t)) => {
                Ok(Transform::Object(self.object(&s, &t, path)?))
            }
            _ => Err(compatible_with(source, target, path, self.externals)
                .err()
                .unwrap_or_else(|| {
                    EngineError::General(format!("cannot convert {}: shapes diverge", path))
                })),
        }
    }

    fn nested(
        &mut self,
        source: Shape<'_>,
        target: Shape<'_>,
        path: &str,
    ) -> EngineResult<Transform> {
        if let (Resolved::Object(s), Resolved::Object(t)) = (source.resolve()?, target.resolve()?) {
            if let (Some(si), Some(ti)) = (s.identity.clone(), t.identity.clone()) {
                let key = HelperKey {
                    source: si,
                    target: ti,
                    direction: self.direction,
                };
                return Ok(Transform::Call(self.helper(key, &s, &t, path)?));
            }
        }
        self.value(source, target, path)
    }

    fn helper(
        &mut self,
        key: HelperKey,
        source: &ObjectShape<'_>,
        target: &ObjectShape<'_>,
        path: &str,
    ) -> EngineResult<String> {
        if let Some(name) = self.registry.lookup(&key) {
            debug!(helper = name, "reusing helper");
            return Ok(name.to_string());
        }
        let source_type = TypeRef {
            identity: key.source.clone(),
            module: self.source_module.clone(),
        };
        let target_type = TypeRef {
            identity: key.target.clone(),
            module: self.target_module.clone(),
        };
        // Reserved before the body is built so cycles resolve to a call.
        let name = self.registry.reserve(key.clone(), source_type, target_type);
        debug!(helper = %name, source = %key.source, target = %key.target, "registered helper");
        let body = self.object(source, target, path)?;
        self.registry.define(&key, body);
        Ok(name)
    }

    fn object(
        &mut self,
        source: &ObjectShape<'_>,
        target: &ObjectShape<'_>,
        path: &str,
    ) -> EngineResult<ObjectPlan> {
        let mut plan = ObjectPlan {
            target: target.identity.clone().map(|identity| TypeRef {
                identity,
                module: self.target_module.clone(),
            }),
            ..ObjectPlan::default()
        };
        for &attr in &target.attributes {
            match resolve_field(&source.attributes, attr, self.externals) {
                FieldMatch::Matched(src) => {
                    let transform = self.nested(
                        source.attribute_shape(src),
                        target.attribute_shape(attr),
                        &format!("{}.{}", path, attr.name),
                    )?;
                    plan.assignments.push(Assignment {
                        target: attr.name.clone(),
                        source: src.name.clone(),
                        optionality: Optionality::between(src.required, attr.required),
                        transform,
                    });
                }
                FieldMatch::Skipped => plan.skipped.push(SkippedField {
                    name: attr.name.clone(),
                    default: Value::default_for(target.attribute_shape(attr), attr.required)?,
                }),
                FieldMatch::Unresolved => {
                    return Err(unresolved_error(
                        attr,
                        &source.type_name(),
                        &target.type_name(),
                        self.externals,
                    ))
                }
            }
        }
        Ok(plan)
    }
}
