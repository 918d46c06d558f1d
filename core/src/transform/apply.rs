//! # Plan Interpreter
//!
//! Executes a plan against a sample [`Value`]. Used to verify synthesized
//! conversions (round trips, optionality) without compiling generated code.

use crate::compat::ROOT_PATH;
use crate::error::{EngineError, EngineResult};
use crate::transform::helpers::HelperRegistry;
use crate::transform::plan::{ObjectPlan, Optionality, Transform};
use crate::transform::Plan;
use crate::value::Value;
use indexmap::IndexMap;

/// Converts `value` with `plan`, calling helpers from `registry`.
pub fn apply(plan: &Plan, registry: &HelperRegistry, value: &Value) -> EngineResult<Value> {
    Executor { registry }.presence(plan.optionality, &plan.transform, value, ROOT_PATH)
}

struct Executor<'r> {
    registry: &'r HelperRegistry,
}

impl Executor<'_> {
    fn presence(
        &self,
        optionality: Optionality,
        transform: &Transform,
        value: &Value,
        path: &str,
    ) -> EngineResult<Value> {
        match optionality {
            Optionality::Direct => self.run(transform, value, path),
            Optionality::Deref => match value {
                Value::Present(inner) => self.run(transform, inner, path),
                Value::Null => Err(EngineError::NilValue {
                    path: path.to_string(),
                }),
                _ => Err(shape_error(path, "an optional")),
            },
            Optionality::AddressOf => Ok(Value::present(self.run(transform, value, path)?)),
            Optionality::Propagate => match value {
                Value::Null => Ok(Value::Null),
                Value::Present(inner) => Ok(Value::present(self.run(transform, inner, path)?)),
                _ => Err(shape_error(path, "an optional")),
            },
        }
    }

    fn run(&self, transform: &Transform, value: &Value, path: &str) -> EngineResult<Value> {
        if let Value::Null = value {
            return Err(EngineError::NilValue {
                path: path.to_string(),
            });
        }
        match transform {
            Transform::Copy(kind) => {
                if value.fits(*kind) {
                    Ok(value.clone())
                } else {
                    Err(shape_error(path, kind.name()))
                }
            }
            Transform::Array(elem) => {
                let Value::Array(items) = value else {
                    return Err(shape_error(path, "an array"));
                };
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.run(elem, item, &format!("{}[{}]", path, i)))
                    .collect::<EngineResult<Vec<_>>>()
                    .map(Value::Array)
            }
            Transform::Map { key, value: val } => {
                let Value::Map(entries) = value else {
                    return Err(shape_error(path, "a map"));
                };
                let mut out = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    out.push((
                        self.run(key, k, &format!("{}.key", path))?,
                        self.run(val, v, &format!("{}.value", path))?,
                    ));
                }
                Ok(Value::Map(out))
            }
            Transform::Object(plan) => self.object(plan, value, path),
            Transform::Call(name) => {
                let helper = self.registry.get(name).ok_or_else(|| {
                    EngineError::General(format!("helper {} is not registered", name))
                })?;
                self.object(&helper.body, value, path)
            }
            Transform::Wrap {
                field,
                optionality,
                inner,
                ..
            } => {
                let wrapped = self.presence(*optionality, inner, value, path)?;
                Ok(Value::Object(IndexMap::from([(field.clone(), wrapped)])))
            }
            Transform::Unwrap {
                field,
                optionality,
                inner,
            } => {
                let Value::Object(fields) = value else {
                    return Err(shape_error(path, "an object"));
                };
                let path = format!("{}.{}", path, field);
                let wrapped = fields.get(field).unwrap_or(&Value::Null);
                self.presence(*optionality, inner, wrapped, &path)
            }
        }
    }

    fn object(&self, plan: &ObjectPlan, value: &Value, path: &str) -> EngineResult<Value> {
        let Value::Object(fields) = value else {
            return Err(shape_error(path, "an object"));
        };
        let mut out = IndexMap::with_capacity(plan.assignments.len() + plan.skipped.len());
        for a in &plan.assignments {
            let source = fields.get(&a.source).unwrap_or(&Value::Null);
            let converted = self.presence(
                a.optionality,
                &a.transform,
                source,
                &format!("{}.{}", path, a.source),
            )?;
            out.insert(a.target.clone(), converted);
        }
        for skipped in &plan.skipped {
            out.insert(skipped.name.clone(), skipped.default.clone());
        }
        Ok(Value::Object(out))
    }
}

fn shape_error(path: &str, expected: &str) -> EngineError {
    EngineError::ValueShape {
        path: path.to_string(),
        expected: expected.to_string(),
    }
}
