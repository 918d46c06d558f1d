//! # Rust Backend
//!
//! Renders plans and helpers as Rust source.
//!
//! Conventions of the generated code:
//! - helpers take the source by reference: `fn name(v: &Src) -> Dst`.
//! - field names are snake-cased and type names upper-camel-cased.
//! - optional to required uses `as_ref().expect(..)`, optional to optional
//!   uses `as_ref().map(..)` and required to optional uses `Some(..)`.
//! - skipped target fields are filled with `..Default::default()`.
//!
//! Every rendered unit is parsed back with `ra_ap_syntax` before it is returned.

use crate::compat::ROOT_PATH;
use crate::error::{EngineError, EngineResult};
use crate::transform::helpers::{HelperDef, HelperRegistry};
use crate::transform::plan::{ObjectPlan, Optionality, Transform};
use crate::transform::Plan;
use heck::ToSnakeCase;
use ra_ap_edition::Edition;
use ra_ap_syntax::SourceFile;

const INDENT: &str = "    ";

/// Renders the plan as a `let` statement binding the target variable.
pub fn render_plan(plan: &Plan) -> EngineResult<String> {
    let expr = presence(
        plan.optionality,
        &plan.transform,
        &plan.source.var,
        true,
        ROOT_PATH,
        0,
    )?;
    Ok(format!("let {} = {};\n", plan.target.var.to_snake_case(), expr))
}

/// Renders one helper function.
pub fn render_helper(def: &HelperDef) -> EngineResult<String> {
    let body = object(&def.body, "v", 1, "v")?;
    Ok(format!(
        "fn {}(v: &{}) -> {} {{\n{}{}\n}}\n",
        def.name,
        def.source_type.rust_path(),
        def.target_type.rust_path(),
        INDENT,
        body
    ))
}

/// Renders the plan followed by every helper it needs, in registration order.
pub fn render_unit(plan: &Plan, registry: &HelperRegistry) -> EngineResult<String> {
    let statement = render_plan(plan)?;
    let mut helpers = String::new();
    for def in plan.helpers(registry) {
        helpers.push('\n');
        helpers.push_str(&render_helper(def)?);
    }
    validate(&format!("fn unit() {{\n{}}}\n{}", statement, helpers))?;
    Ok(format!("{}{}", statement, helpers))
}

/// Fails when `code` is not syntactically valid Rust.
fn validate(code: &str) -> EngineResult<()> {
    let parse = SourceFile::parse(code, Edition::Edition2021);
    if !parse.errors().is_empty() {
        let errs: Vec<String> = parse.errors().into_iter().map(|e| e.to_string()).collect();
        return Err(EngineError::General(format!(
            "Rendered code does not parse: {}",
            errs.join(", ")
        )));
    }
    Ok(())
}

/// Expression converting `src` with presence handling.
///
/// `by_ref` tells whether `src` is a reference (a closure parameter or a
/// helper argument) rather than a place reached through field access.
fn presence(
    optionality: Optionality,
    transform: &Transform,
    src: &str,
    by_ref: bool,
    path: &str,
    level: usize,
) -> EngineResult<String> {
    Ok(match optionality {
        Optionality::Direct => expr(transform, src, by_ref, path, level)?,
        Optionality::Deref => {
            let deref = format!("{}.as_ref().expect(\"{} is required\")", src, path);
            expr(transform, &deref, true, path, level)?
        }
        Optionality::AddressOf => format!("Some({})", expr(transform, src, by_ref, path, level)?),
        Optionality::Propagate => format!(
            "{}.as_ref().map(|val| {})",
            src,
            expr(transform, "val", true, path, level)?
        ),
    })
}

fn expr(
    transform: &Transform,
    src: &str,
    by_ref: bool,
    path: &str,
    level: usize,
) -> EngineResult<String> {
    Ok(match transform {
        Transform::Copy(kind) if kind.is_copy() => {
            if by_ref {
                format!("*{}", src)
            } else {
                src.to_string()
            }
        }
        Transform::Copy(_) => format!("{}.clone()", src),
        Transform::Array(elem) => format!(
            "{}.iter().map(|val| {}).collect()",
            src,
            expr(elem, "val", true, &format!("{}[0]", path), level)?
        ),
        Transform::Map { key, value } => format!(
            "{}.iter().map(|(key, val)| ({}, {})).collect()",
            src,
            expr(key, "key", true, &format!("{}.key", path), level)?,
            expr(value, "val", true, &format!("{}.value", path), level)?
        ),
        Transform::Object(plan) => object(plan, src, level, path)?,
        Transform::Call(name) => {
            if by_ref {
                format!("{}({})", name, src)
            } else {
                format!("{}(&{})", name, src)
            }
        }
        Transform::Wrap {
            target,
            field,
            optionality,
            inner,
        } => {
            let target = target.as_ref().ok_or_else(|| anonymous(path))?;
            let pad = INDENT.repeat(level + 1);
            format!(
                "{} {{\n{}{}: {},\n{}}}",
                target.rust_path(),
                pad,
                field,
                presence(*optionality, inner, src, by_ref, path, level + 1)?,
                INDENT.repeat(level)
            )
        }
        Transform::Unwrap {
            field,
            optionality,
            inner,
        } => {
            let wrapped = format!("{}.{}", src, field);
            presence(*optionality, inner, &wrapped, false, path, level)?
        }
    })
}

/// Struct literal building `plan` from the fields of `src`.
fn object(plan: &ObjectPlan, src: &str, level: usize, path: &str) -> EngineResult<String> {
    let target = plan.target.as_ref().ok_or_else(|| anonymous(path))?;
    let pad = INDENT.repeat(level + 1);
    let mut out = format!("{} {{\n", target.rust_path());
    for a in &plan.assignments {
        let field = format!("{}.{}", src, a.source.to_snake_case());
        let value = presence(
            a.optionality,
            &a.transform,
            &field,
            false,
            &format!("{}.{}", path, a.source),
            level + 1,
        )?;
        out.push_str(&format!("{}{}: {},\n", pad, a.target.to_snake_case(), value));
    }
    if !plan.skipped.is_empty() {
        out.push_str(&format!("{}..Default::default()\n", pad));
    }
    out.push_str(&INDENT.repeat(level));
    out.push('}');
    Ok(out)
}

fn anonymous(path: &str) -> EngineError {
    EngineError::General(format!(
        "cannot render {}: anonymous object types have no Rust name",
        path
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{synthesize, Binding, Direction, Options};
    use crate::types::{
        Attribute, AttributeMeta, NamedType, PrimitiveKind, Type, TypeGraph, TypeGraphBuilder,
    };
    use pretty_assertions::assert_eq;

    fn graph() -> TypeGraph {
        let mut b = TypeGraphBuilder::new();
        b.declare(NamedType::new(
            "Tag",
            Type::Object(vec![Attribute::required(
                "label",
                Type::Primitive(PrimitiveKind::String),
            )]),
        ))
        .unwrap();
        b.declare(NamedType::new(
            "Post",
            Type::Object(vec![
                Attribute::required("id", Type::Primitive(PrimitiveKind::Int64)),
                Attribute::optional("title", Type::Primitive(PrimitiveKind::String)),
                Attribute::required("tags", Type::array(Type::named("Tag"))),
                Attribute::optional("internal", Type::Primitive(PrimitiveKind::Boolean))
                    .with_meta(AttributeMeta::default().skip()),
            ]),
        ))
        .unwrap();
        b.finalize().unwrap()
    }

    #[test]
    fn test_render_unit() {
        let g = graph();
        let post = g.named_shape("Post").unwrap();
        let mut registry = HelperRegistry::new();
        let plan = synthesize(
            post,
            post,
            &Binding::new("v"),
            &Binding::new("res").with_module("pb"),
            &Options::new(Direction::ToNative),
            &mut registry,
        )
        .unwrap();
        let code = render_unit(&plan, &registry).unwrap();
        let expected = r#"let res = pb::Post {
    id: v.id,
    title: v.title.as_ref().map(|val| val.clone()),
    tags: v.tags.iter().map(|val| convert_tag_to_tag(val)).collect(),
    ..Default::default()
};

fn convert_tag_to_tag(v: &Tag) -> pb::Tag {
    pb::Tag {
        label: v.label.clone(),
    }
}
"#;
        assert_eq!(code, expected);
    }

    #[test]
    fn test_render_deref() {
        let g = TypeGraph::empty();
        let string = Type::Primitive(PrimitiveKind::String);
        let mut registry = HelperRegistry::new();
        let plan = synthesize(
            g.shape(&string),
            g.shape(&string),
            &Binding::new("payload").optional(),
            &Binding::new("out"),
            &Options::new(Direction::ToNative),
            &mut registry,
        )
        .unwrap();
        assert_eq!(
            render_plan(&plan).unwrap(),
            "let out = payload.as_ref().expect(\"<value> is required\").clone();\n"
        );
    }

    #[test]
    fn test_anonymous_object_is_reported() {
        let g = TypeGraph::empty();
        let obj = Type::Object(vec![Attribute::required(
            "a",
            Type::Primitive(PrimitiveKind::Int),
        )]);
        let mut registry = HelperRegistry::new();
        let plan = synthesize(
            g.shape(&obj),
            g.shape(&obj),
            &Binding::new("v"),
            &Binding::new("o"),
            &Options::new(Direction::ToNative),
            &mut registry,
        )
        .unwrap();
        assert!(render_plan(&plan).is_err());
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(validate("fn broken( {").is_err());
        assert!(validate("fn ok() {}").is_ok());
    }
}
