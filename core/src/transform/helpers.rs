//! # Helper Registry
//!
//! Named helper functions produced while synthesizing nested named objects.
//!
//! A helper is reserved under its key *before* its body is built, so a
//! self-referential or mutually recursive pair finds the reservation and
//! emits a call instead of recursing forever.

use crate::transform::plan::{ObjectPlan, TypeRef};
use crate::transform::Direction;
use crate::types::Identity;
use heck::ToSnakeCase;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// Key under which a helper is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HelperKey {
    /// Identity of the source named type.
    pub source: Identity,
    /// Identity of the target named type.
    pub target: Identity,
    /// Conversion direction.
    pub direction: Direction,
}

impl HelperKey {
    /// The preferred helper name, e.g. `marshal_user_to_user_pb`.
    pub fn base_name(&self) -> String {
        format!(
            "{}_{}_to_{}",
            self.direction.verb(),
            identity_slug(&self.source),
            identity_slug(&self.target)
        )
    }
}

fn identity_slug(identity: &Identity) -> String {
    match &identity.view {
        Some(view) => format!("{}_{}", identity.name, view).to_snake_case(),
        None => identity.name.to_snake_case(),
    }
}

/// A registered helper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelperDef {
    /// Unique helper name.
    pub name: String,
    /// Registration key.
    pub key: HelperKey,
    /// Parameter type.
    pub source_type: TypeRef,
    /// Return type.
    pub target_type: TypeRef,
    /// Construction of the returned object.
    pub body: ObjectPlan,
}

/// Registry of helpers shared across synthesis requests.
///
/// Helpers are kept in first-requested order.
#[derive(Debug, Clone, Default)]
pub struct HelperRegistry {
    entries: IndexMap<HelperKey, HelperDef>,
    names: HashMap<String, HelperKey>,
}

impl HelperRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the helper registered under `key`, if any.
    pub fn lookup(&self, key: &HelperKey) -> Option<&str> {
        self.entries.get(key).map(|def| def.name.as_str())
    }

    /// Helper registered under `name`.
    pub fn get(&self, name: &str) -> Option<&HelperDef> {
        self.names.get(name).and_then(|key| self.entries.get(key))
    }

    /// Helpers in registration order.
    pub fn helpers(&self) -> impl Iterator<Item = &HelperDef> {
        self.entries.values()
    }

    /// Number of helpers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no helper was registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reserves a unique name for `key` with an empty body.
    pub(crate) fn reserve(
        &mut self,
        key: HelperKey,
        source_type: TypeRef,
        target_type: TypeRef,
    ) -> String {
        if let Some(existing) = self.lookup(&key) {
            return existing.to_string();
        }
        let name = self.unique_name(&key.base_name());
        self.names.insert(name.clone(), key.clone());
        self.entries.insert(
            key.clone(),
            HelperDef {
                name: name.clone(),
                key,
                source_type,
                target_type,
                body: ObjectPlan::default(),
            },
        );
        name
    }

    /// Fills in the body of a reserved helper.
    pub(crate) fn define(&mut self, key: &HelperKey, body: ObjectPlan) {
        if let Some(def) = self.entries.get_mut(key) {
            def.body = body;
        }
    }

    /// Inserts a complete helper, renaming it when its name is taken by
    /// another key. Returns the name it was registered under.
    pub(crate) fn adopt(&mut self, mut def: HelperDef) -> String {
        if let Some(existing) = self.lookup(&def.key) {
            return existing.to_string();
        }
        def.name = self.unique_name(&def.name);
        let name = def.name.clone();
        self.names.insert(name.clone(), def.key.clone());
        self.entries.insert(def.key.clone(), def);
        name
    }

    /// Drops every helper registered after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
        self.names = self
            .entries
            .iter()
            .map(|(key, def)| (def.name.clone(), key.clone()))
            .collect();
    }

    /// Mutable access for renaming calls inside helper bodies.
    pub(crate) fn bodies_mut(&mut self) -> impl Iterator<Item = &mut HelperDef> {
        self.entries.values_mut()
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.names.contains_key(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}
