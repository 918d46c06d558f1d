//! # Operation Plans
//!
//! The output of synthesis: a tree of field-by-field operations converting a
//! value of the source shape into a value of the target shape.

use crate::types::{Identity, PrimitiveKind};
use crate::value::Value;
use heck::ToUpperCamelCase;
use serde::Serialize;
use std::collections::HashMap;

/// How presence changes between a source slot and a target slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Optionality {
    /// Required to required.
    Direct,
    /// Optional source, required target: dereference without a nil check.
    Deref,
    /// Required source, optional target: produce a populated optional.
    AddressOf,
    /// Optional to optional: convert the value when present.
    Propagate,
}

impl Optionality {
    /// The conversion between a source and a target requiredness.
    pub fn between(source_required: bool, target_required: bool) -> Self {
        match (source_required, target_required) {
            (true, true) => Optionality::Direct,
            (false, true) => Optionality::Deref,
            (true, false) => Optionality::AddressOf,
            (false, false) => Optionality::Propagate,
        }
    }
}

/// A named type as referenced from rendered code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeRef {
    /// Identity of the named type.
    pub identity: Identity,
    /// Module the type lives in, e.g. `pb`.
    pub module: Option<String>,
}

impl TypeRef {
    /// The qualified Rust path, e.g. `pb::UserTiny`.
    pub fn rust_path(&self) -> String {
        let mut name = self.identity.name.to_upper_camel_case();
        if let Some(view) = &self.identity.view {
            name.push_str(&view.to_upper_camel_case());
        }
        match &self.module {
            Some(module) => format!("{}::{}", module, name),
            None => name,
        }
    }
}

/// One conversion step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Copy a primitive value.
    Copy(PrimitiveKind),
    /// Map every element, index for index.
    Array(Box<Transform>),
    /// Map every entry into an initially empty target map.
    Map {
        /// Key conversion.
        key: Box<Transform>,
        /// Value conversion.
        value: Box<Transform>,
    },
    /// Build an object inline.
    Object(ObjectPlan),
    /// Delegate to a registered helper.
    Call(String),
    /// Wrap a bare value into the single `field` attribute of a message.
    Wrap {
        /// Message type being built.
        target: Option<TypeRef>,
        /// Wrapper attribute name.
        field: String,
        /// Presence conversion into the wrapper attribute.
        optionality: Optionality,
        /// Conversion of the bare value.
        inner: Box<Transform>,
    },
    /// Read the single `field` attribute of a message.
    Unwrap {
        /// Wrapper attribute name.
        field: String,
        /// Presence conversion out of the wrapper attribute.
        optionality: Optionality,
        /// Conversion of the wrapped value.
        inner: Box<Transform>,
    },
}

impl Transform {
    /// Renames helper calls according to `names`, recursively.
    pub fn rename_calls(&mut self, names: &HashMap<String, String>) {
        match self {
            Transform::Copy(_) => {}
            Transform::Array(inner) => inner.rename_calls(names),
            Transform::Map { key, value } => {
                key.rename_calls(names);
                value.rename_calls(names);
            }
            Transform::Object(plan) => plan.rename_calls(names),
            Transform::Call(name) => {
                if let Some(renamed) = names.get(name) {
                    *name = renamed.clone();
                }
            }
            Transform::Wrap { inner, .. } | Transform::Unwrap { inner, .. } => {
                inner.rename_calls(names)
            }
        }
    }

    /// Names of the helpers called directly or through nested steps.
    pub fn calls(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_calls(&mut out);
        out
    }

    fn collect_calls<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Transform::Copy(_) => {}
            Transform::Array(inner) => inner.collect_calls(out),
            Transform::Map { key, value } => {
                key.collect_calls(out);
                value.collect_calls(out);
            }
            Transform::Object(plan) => {
                for a in &plan.assignments {
                    a.transform.collect_calls(out);
                }
            }
            Transform::Call(name) => out.push(name),
            Transform::Wrap { inner, .. } | Transform::Unwrap { inner, .. } => {
                inner.collect_calls(out)
            }
        }
    }
}

/// Construction of one target object.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ObjectPlan {
    /// Target type, when it is named.
    pub target: Option<TypeRef>,
    /// Assignments in target declaration order.
    pub assignments: Vec<Assignment>,
    /// Target attributes left at their default value.
    pub skipped: Vec<SkippedField>,
}

impl ObjectPlan {
    /// Renames helper calls according to `names`, recursively.
    pub fn rename_calls(&mut self, names: &HashMap<String, String>) {
        for a in &mut self.assignments {
            a.transform.rename_calls(names);
        }
    }
}

/// Assignment of one target attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    /// Target attribute name.
    pub target: String,
    /// Source attribute name.
    pub source: String,
    /// Presence conversion.
    pub optionality: Optionality,
    /// Value conversion.
    pub transform: Transform,
}

/// A target attribute left at its default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedField {
    /// Target attribute name.
    pub name: String,
    /// Default value of the attribute's shape.
    pub default: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optionality_between() {
        assert_eq!(Optionality::between(true, true), Optionality::Direct);
        assert_eq!(Optionality::between(false, true), Optionality::Deref);
        assert_eq!(Optionality::between(true, false), Optionality::AddressOf);
        assert_eq!(Optionality::between(false, false), Optionality::Propagate);
    }

    #[test]
    fn test_rust_path() {
        let plain = TypeRef {
            identity: Identity::new("user_profile"),
            module: Some("pb".into()),
        };
        assert_eq!(plain.rust_path(), "pb::UserProfile");
        let view = TypeRef {
            identity: Identity {
                name: "User".into(),
                view: Some("tiny".into()),
            },
            module: None,
        };
        assert_eq!(view.rust_path(), "UserTiny");
    }

    #[test]
    fn test_rename_calls() {
        let mut t = Transform::Array(Box::new(Transform::Call("a".into())));
        let names = HashMap::from([("a".to_string(), "b".to_string())]);
        t.rename_calls(&names);
        assert_eq!(t.calls(), vec!["b"]);
    }
}
