#![deny(missing_docs)]

//! # Field Matching
//!
//! Resolves which source attribute feeds a given target attribute.
//! Shared by the compatibility checker and the transform synthesizer so both
//! stages always agree on the correspondence.
//!
//! The target side of a request must be fully covered; source attributes that
//! no target attribute picks up are ignored.

use crate::error::EngineError;
use crate::types::{Attribute, ExternalField};

/// Whether attribute directives take part in matching.
///
/// `struct.field.external` describes native composites and `origin:attribute`
/// is not carried into lifted messages, so message conversions ignore both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Externals {
    /// Renames and skips apply.
    #[default]
    Honor,
    /// Attributes match by name only.
    Ignore,
}

/// Outcome of resolving one target attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldMatch<'g> {
    /// The source attribute feeding the target attribute.
    Matched(&'g Attribute),
    /// The target attribute is explicitly skipped and left at its default.
    Skipped,
    /// No source attribute corresponds.
    Unresolved,
}

/// Resolves the source attribute for `target` among `source`.
///
/// Order of precedence:
/// 1. `struct.field.external: "-"` on the target skips it.
/// 2. `origin:attribute` on the target names the source attribute.
/// 3. `struct.field.external` on the target names the source field.
/// 4. A source attribute with the same name (unless it is itself mapped elsewhere).
/// 5. A source attribute whose `struct.field.external` names the target.
/// 6. A same-named source attribute marked `"-"` skips the target.
///
/// With [`Externals::Ignore`] only step 4 applies and matches any same-named
/// attribute.
pub fn resolve_field<'g>(
    source: &[&'g Attribute],
    target: &Attribute,
    externals: Externals,
) -> FieldMatch<'g> {
    let by_name = |name: &str| source.iter().copied().find(|a| a.name == name);

    if externals == Externals::Honor && target.meta.is_skipped() {
        return FieldMatch::Skipped;
    }

    if externals == Externals::Ignore {
        return match by_name(&target.name) {
            Some(attr) => FieldMatch::Matched(attr),
            None => FieldMatch::Unresolved,
        };
    }

    if let Some(origin) = &target.meta.origin {
        return match by_name(origin) {
            Some(attr) => FieldMatch::Matched(attr),
            None => FieldMatch::Unresolved,
        };
    }

    if let Some(external) = target.meta.external_name() {
        if let Some(attr) = by_name(external) {
            return FieldMatch::Matched(attr);
        }
    }

    if let Some(attr) = source.iter().copied().find(|a| {
        a.name == target.name
            && (a.meta.external.is_none() || a.meta.external == target.meta.external)
    }) {
        return FieldMatch::Matched(attr);
    }

    let wanted = ExternalField::Rename(target.name.clone());
    if let Some(attr) = source
        .iter()
        .copied()
        .find(|a| a.meta.external.as_ref() == Some(&wanted))
    {
        return FieldMatch::Matched(attr);
    }

    match by_name(&target.name) {
        Some(attr) if attr.meta.is_skipped() => FieldMatch::Skipped,
        _ => FieldMatch::Unresolved,
    }
}

/// Builds the diagnostic for an unresolved target attribute.
pub fn unresolved_error(
    target: &Attribute,
    source_type: &str,
    target_type: &str,
    externals: Externals,
) -> EngineError {
    let field = match externals {
        Externals::Honor => target
            .meta
            .origin
            .as_deref()
            .or(target.meta.external_name())
            .unwrap_or(&target.name),
        Externals::Ignore => target.name.as_str(),
    };
    EngineError::UnresolvedField {
        field: field.to_string(),
        source_type: source_type.to_string(),
        attribute: target.name.clone(),
        target_type: target_type.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributeMeta, PrimitiveKind, Type};

    fn attr(name: &str) -> Attribute {
        Attribute::required(name, Type::Primitive(PrimitiveKind::String))
    }

    fn with(name: &str, meta: AttributeMeta) -> Attribute {
        attr(name).with_meta(meta)
    }

    #[test]
    fn test_same_name() {
        let foo = attr("Foo");
        let source = vec![&foo];
        assert_eq!(
            resolve_field(&source, &attr("Foo"), Externals::Honor),
            FieldMatch::Matched(&foo)
        );
        assert_eq!(resolve_field(&source, &attr("Bar"), Externals::Honor), FieldMatch::Unresolved);
    }

    #[test]
    fn test_target_rename() {
        let baz = attr("Baz");
        let source = vec![&baz];
        let target = with("mapped", AttributeMeta::default().external("Baz"));
        assert_eq!(resolve_field(&source, &target, Externals::Honor), FieldMatch::Matched(&baz));
    }

    #[test]
    fn test_source_rename() {
        // design -> native: the design attribute carries the mapping
        let mapped = with("mapped", AttributeMeta::default().external("Baz"));
        let source = vec![&mapped];
        assert_eq!(
            resolve_field(&source, &attr("Baz"), Externals::Honor),
            FieldMatch::Matched(&mapped)
        );
        // the design name itself no longer matches a native field
        assert_eq!(
            resolve_field(&source, &attr("mapped"), Externals::Honor),
            FieldMatch::Unresolved
        );
    }

    #[test]
    fn test_skip() {
        let source: Vec<&Attribute> = vec![];
        let target = with("ignored", AttributeMeta::default().skip());
        assert_eq!(resolve_field(&source, &target, Externals::Honor), FieldMatch::Skipped);
    }

    #[test]
    fn test_skipped_source_skips_target() {
        // design -> native: the native field stays at its default
        let ignored = with("ignored", AttributeMeta::default().skip());
        let source = vec![&ignored];
        assert_eq!(
            resolve_field(&source, &attr("ignored"), Externals::Honor),
            FieldMatch::Skipped
        );
    }

    #[test]
    fn test_source_rename_wins_over_skip() {
        let ignored = with("name", AttributeMeta::default().skip());
        let renamed = with("label", AttributeMeta::default().external("name"));
        let source = vec![&ignored, &renamed];
        assert_eq!(
            resolve_field(&source, &attr("name"), Externals::Honor),
            FieldMatch::Matched(&renamed)
        );
    }

    #[test]
    fn test_origin_takes_precedence() {
        let a = attr("a");
        let b = attr("b");
        let source = vec![&a, &b];
        let target = with("b", AttributeMeta::default().origin("a"));
        assert_eq!(resolve_field(&source, &target, Externals::Honor), FieldMatch::Matched(&a));
        let target = with("b", AttributeMeta::default().origin("zzz"));
        assert_eq!(resolve_field(&source, &target, Externals::Honor), FieldMatch::Unresolved);
    }

    #[test]
    fn test_ignore_externals() {
        let mapped = with("friend", AttributeMeta::default().external("Buddy"));
        let ignored = with("secret", AttributeMeta::default().skip());
        let source = vec![&mapped, &ignored];
        assert_eq!(
            resolve_field(&source, &attr("friend"), Externals::Ignore),
            FieldMatch::Matched(&mapped)
        );
        assert_eq!(
            resolve_field(&source, &attr("secret"), Externals::Ignore),
            FieldMatch::Matched(&ignored)
        );
        let skipped_target = with("secret", AttributeMeta::default().skip());
        assert_eq!(
            resolve_field(&source, &skipped_target, Externals::Ignore),
            FieldMatch::Matched(&ignored)
        );
        let reshaped = with("friend", AttributeMeta::default().origin("buddy"));
        assert_eq!(
            resolve_field(&source, &reshaped, Externals::Ignore),
            FieldMatch::Matched(&mapped)
        );
        let err = unresolved_error(&reshaped, "Msg", "User", Externals::Ignore);
        assert!(err.to_string().contains("could not find field \"friend\""));
    }

    #[test]
    fn test_unresolved_error_names_external_field() {
        let target = with("mapped", AttributeMeta::default().external("Baz"));
        let err = unresolved_error(&target, "objT5", "objT", Externals::Honor);
        assert_eq!(
            err.to_string(),
            "types don't match: could not find field \"Baz\" of external type \"objT5\" matching attribute \"mapped\" of type \"objT\""
        );
    }
}
