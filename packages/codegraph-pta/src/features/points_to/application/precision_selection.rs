//! Precision-critical method selection
//!
//! Reads a quiescent pre-analysis and flags the methods whose call sites
//! are ambiguous: a call site's fan-out is the number of distinct targets
//! it resolved to over all contexts, and a method is precision-critical
//! when one of its sites has fan-out above the threshold.
//!
//! Methods are inspected in parallel; the result is an immutable set that
//! the refined run shares read-only.

use crate::errors::PtaResult;
use crate::features::points_to::domain::{CallSiteId, MethodSig, ObjectId};
use crate::features::points_to::infrastructure::PropagationSolver;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Observed fan-out of one call site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSiteFanOut {
    pub method: MethodSig,
    pub site: CallSiteId,
    /// Distinct dispatch targets
    pub targets: usize,
    /// Distinct runtime types in the receiver's points-to set (0 for static calls)
    pub receiver_types: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrecisionReport {
    pub threshold: usize,
    pub precision_critical: BTreeSet<MethodSig>,
    pub call_sites: Vec<CallSiteFanOut>,
}

impl PrecisionReport {
    pub fn is_precision_critical(&self, method: &MethodSig) -> bool {
        self.precision_critical.contains(method)
    }

    /// PCM set in the form the partial selector consumes
    pub fn to_set(&self) -> FxHashSet<MethodSig> {
        self.precision_critical.iter().cloned().collect()
    }

    /// Call sites above the threshold
    pub fn polymorphic_sites(&self) -> impl Iterator<Item = &CallSiteFanOut> {
        self.call_sites
            .iter()
            .filter(move |s| s.targets > self.threshold)
    }
}

/// Select precision-critical methods from a quiescent pre-analysis
pub fn select_precision_critical(
    pre: &PropagationSolver,
    fanout_threshold: usize,
) -> PtaResult<PrecisionReport> {
    let methods = pre.reachable_methods()?;

    let per_method: Vec<Vec<CallSiteFanOut>> = methods
        .par_iter()
        .map(|method| call_sites_of(pre, method))
        .collect::<PtaResult<Vec<_>>>()?;

    let mut call_sites: Vec<CallSiteFanOut> = per_method.into_iter().flatten().collect();
    call_sites.sort_by(|a, b| a.method.cmp(&b.method).then(a.site.cmp(&b.site)));

    let precision_critical: BTreeSet<MethodSig> = call_sites
        .iter()
        .filter(|s| s.targets > fanout_threshold)
        .map(|s| s.method.clone())
        .collect();

    tracing::info!(
        "precision selection: {} of {} reachable methods are precision-critical (fan-out > {})",
        precision_critical.len(),
        methods.len(),
        fanout_threshold
    );

    Ok(PrecisionReport {
        threshold: fanout_threshold,
        precision_critical,
        call_sites,
    })
}

fn call_sites_of(pre: &PropagationSolver, method: &MethodSig) -> PtaResult<Vec<CallSiteFanOut>> {
    let Some(pag) = pre.method_pag(method) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(pag.invokes().len());
    for invoke in pag.invokes() {
        let receiver_types = match invoke.base.filter(|_| invoke.has_receiver()) {
            Some(base) => {
                let pts = pre.points_to_local(method, base)?;
                distinct_types(pre, pts.iter())?
            }
            None => 0,
        };
        out.push(CallSiteFanOut {
            method: method.clone(),
            site: invoke.site,
            targets: pre.call_fan_out(invoke.site)?,
            receiver_types,
        });
    }
    Ok(out)
}

fn distinct_types(
    pre: &PropagationSolver,
    objects: impl Iterator<Item = ObjectId>,
) -> PtaResult<usize> {
    let mut types = FxHashSet::default();
    for obj in objects {
        if let Some(o) = pre.object(obj)? {
            types.insert(o.ty.clone());
        }
    }
    Ok(types.len())
}
