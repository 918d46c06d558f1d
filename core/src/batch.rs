#![deny(missing_docs)]

//! # Batch Synthesis
//!
//! Runs independent synthesis requests in parallel, then merges their
//! helpers into one registry.
//!
//! Every request synthesizes into a private registry. The merge runs on a
//! single thread in request order: helpers are deduplicated by key, names
//! taken by another key get a numeric suffix, and calls in the adopted
//! helpers and in the plan are rewritten to the merged names. The result
//! is the same whatever order the workers finished in.

use crate::error::EngineResult;
use crate::transform::helpers::HelperRegistry;
use crate::transform::{synthesize, Binding, Options, Plan};
use crate::types::Shape;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, warn};

/// One independent synthesis request.
#[derive(Debug, Clone)]
pub struct BatchRequest<'g> {
    /// Source shape.
    pub source: Shape<'g>,
    /// Target shape.
    pub target: Shape<'g>,
    /// Source variable.
    pub source_binding: Binding,
    /// Target variable.
    pub target_binding: Binding,
    /// Synthesis options.
    pub options: Options,
}

/// The merged outcome of a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// One result per request, in request order.
    pub plans: Vec<EngineResult<Plan>>,
    /// Helpers of every successful request.
    pub registry: HelperRegistry,
}

impl BatchOutcome {
    /// Number of requests that failed.
    pub fn failures(&self) -> usize {
        self.plans.iter().filter(|p| p.is_err()).count()
    }
}

/// Synthesizes every request; a failed request does not abort the batch.
pub fn synthesize_batch(requests: &[BatchRequest<'_>]) -> BatchOutcome {
    let results: Vec<EngineResult<(Plan, HelperRegistry)>> = requests
        .par_iter()
        .map(|req| {
            let mut registry = HelperRegistry::new();
            synthesize(
                req.source,
                req.target,
                &req.source_binding,
                &req.target_binding,
                &req.options,
                &mut registry,
            )
            .map(|plan| (plan, registry))
        })
        .collect();

    let mut merged = HelperRegistry::new();
    let mut plans = Vec::with_capacity(results.len());
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok((mut plan, local)) => {
                let mark = merged.len();
                let mut renames = HashMap::new();
                for def in local.helpers() {
                    let name = merged.adopt(def.clone());
                    if name != def.name {
                        debug!(request = index, from = %def.name, to = %name, "renamed helper");
                        renames.insert(def.name.clone(), name);
                    }
                }
                if !renames.is_empty() {
                    for def in merged.bodies_mut().skip(mark) {
                        def.body.rename_calls(&renames);
                    }
                    plan.transform.rename_calls(&renames);
                }
                plans.push(Ok(plan));
            }
            Err(err) => {
                warn!(request = index, error = %err, "skipping request");
                plans.push(Err(err));
            }
        }
    }

    BatchOutcome {
        plans,
        registry: merged,
    }
}
