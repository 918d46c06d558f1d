#![deny(missing_docs)]

//! # Attribute Metadata
//!
//! Typed view of the free-form `{key: [values]}` metadata attached to
//! attributes. Recognized keys are parsed and validated when the graph is
//! finalized; unknown keys are carried through verbatim.

use crate::error::{EngineError, EngineResult};
use indexmap::IndexMap;
use serde::Serialize;

/// Key naming the attribute this attribute was copied from.
pub const ORIGIN_ATTRIBUTE: &str = "origin:attribute";
/// Key renaming (or skipping with `-`) a field of a native composite.
pub const STRUCT_FIELD_EXTERNAL: &str = "struct.field.external";
/// Key carrying the wire field number of a message attribute.
pub const RPC_TAG: &str = "rpc:tag";
/// Key selecting a view of the attribute's named type.
pub const VIEW: &str = "view";

/// Value of `struct.field.external` that marks an attribute as skipped.
pub const SKIP_MARKER: &str = "-";

/// Raw ordered multimap form of attribute metadata.
pub type RawMetadata = IndexMap<String, Vec<String>>;

/// Explicit mapping of an attribute to a native field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalField {
    /// The attribute has no native counterpart and is left at its default.
    Skip,
    /// The attribute maps to the native field with this name.
    Rename(String),
}

/// Typed attribute metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeMeta {
    /// `origin:attribute`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// `struct.field.external`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalField>,
    /// `rpc:tag`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_tag: Option<u32>,
    /// `view`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    /// Unrecognized keys, in declaration order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extra: RawMetadata,
}

impl AttributeMeta {
    /// Parses raw metadata, validating the recognized keys.
    ///
    /// `attribute` is only used in diagnostics.
    pub fn from_raw(attribute: &str, raw: &RawMetadata) -> EngineResult<Self> {
        let mut meta = AttributeMeta::default();
        for (key, values) in raw {
            match key.as_str() {
                ORIGIN_ATTRIBUTE => meta.origin = Some(single(attribute, key, values)?),
                STRUCT_FIELD_EXTERNAL => {
                    let value = single(attribute, key, values)?;
                    meta.external = Some(if value == SKIP_MARKER {
                        ExternalField::Skip
                    } else {
                        ExternalField::Rename(value)
                    });
                }
                RPC_TAG => {
                    let value = single(attribute, key, values)?;
                    let tag = value
                        .parse::<u32>()
                        .ok()
                        .filter(|t| *t > 0)
                        .ok_or_else(|| {
                            EngineError::InvalidGraph(format!(
                                "attribute {:?}: {} must be a positive integer, got {:?}",
                                attribute, RPC_TAG, value
                            ))
                        })?;
                    meta.rpc_tag = Some(tag);
                }
                VIEW => meta.view = Some(single(attribute, key, values)?),
                _ => {
                    meta.extra
                        .entry(key.clone())
                        .or_default()
                        .extend(values.iter().cloned());
                }
            }
        }
        Ok(meta)
    }

    /// Converts back into the raw multimap form.
    pub fn to_raw(&self) -> RawMetadata {
        let mut raw = RawMetadata::new();
        if let Some(origin) = &self.origin {
            raw.insert(ORIGIN_ATTRIBUTE.to_string(), vec![origin.clone()]);
        }
        match &self.external {
            Some(ExternalField::Skip) => {
                raw.insert(STRUCT_FIELD_EXTERNAL.to_string(), vec![SKIP_MARKER.into()]);
            }
            Some(ExternalField::Rename(name)) => {
                raw.insert(STRUCT_FIELD_EXTERNAL.to_string(), vec![name.clone()]);
            }
            None => {}
        }
        if let Some(tag) = self.rpc_tag {
            raw.insert(RPC_TAG.to_string(), vec![tag.to_string()]);
        }
        if let Some(view) = &self.view {
            raw.insert(VIEW.to_string(), vec![view.clone()]);
        }
        for (k, v) in &self.extra {
            raw.insert(k.clone(), v.clone());
        }
        raw
    }

    /// Whether no directive is set.
    pub fn is_empty(&self) -> bool {
        self.origin.is_none()
            && self.external.is_none()
            && self.rpc_tag.is_none()
            && self.view.is_none()
            && self.extra.is_empty()
    }

    /// Whether the attribute is explicitly skipped for native mapping.
    pub fn is_skipped(&self) -> bool {
        matches!(self.external, Some(ExternalField::Skip))
    }

    /// The native field name this attribute is explicitly renamed to.
    pub fn external_name(&self) -> Option<&str> {
        match &self.external {
            Some(ExternalField::Rename(name)) => Some(name),
            _ => None,
        }
    }

    /// Builder: sets `origin:attribute`.
    pub fn origin(mut self, name: impl Into<String>) -> Self {
        self.origin = Some(name.into());
        self
    }

    /// Builder: sets `struct.field.external` to a rename.
    pub fn external(mut self, name: impl Into<String>) -> Self {
        self.external = Some(ExternalField::Rename(name.into()));
        self
    }

    /// Builder: sets `struct.field.external` to `-`.
    pub fn skip(mut self) -> Self {
        self.external = Some(ExternalField::Skip);
        self
    }

    /// Builder: sets `rpc:tag`.
    pub fn tag(mut self, tag: u32) -> Self {
        self.rpc_tag = Some(tag);
        self
    }

    /// Builder: sets `view`.
    pub fn view(mut self, name: impl Into<String>) -> Self {
        self.view = Some(name.into());
        self
    }
}

fn single(attribute: &str, key: &str, values: &[String]) -> EngineResult<String> {
    match values {
        [value] => Ok(value.clone()),
        _ => Err(EngineError::InvalidGraph(format!(
            "attribute {:?}: {} expects exactly one value, got {}",
            attribute,
            key,
            values.len()
        ))),
    }
}
