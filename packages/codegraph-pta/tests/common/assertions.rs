//! Custom assertions for solver results
//!
//! Object ids depend on discovery order, so comparisons across runs go
//! through [`canonical_object`], which names an object by its allocation and
//! (recursively) its heap context.

use codegraph_pta::errors::PtaResult;
use codegraph_pta::features::points_to::domain::{
    AbstractAlloc, AllocSite, ContextElement, Local, MethodSig, ObjectId,
};
use codegraph_pta::features::points_to::{PointsToSet, PropagationSolver};
use codegraph_pta::PtaError;
use std::collections::BTreeSet;

/// Run-independent name of `id`
pub fn canonical_object(solver: &PropagationSolver, id: ObjectId) -> String {
    let object = solver
        .object(id)
        .unwrap()
        .unwrap_or_else(|| panic!("unknown object {id}"));
    let context = solver.heap_context(id).unwrap().unwrap_or_default();
    let elements: Vec<String> = context
        .elements()
        .iter()
        .map(|element| match *element {
            ContextElement::CallSite(site) => site.to_string(),
            ContextElement::Object(inner) => canonical_object(solver, inner),
        })
        .collect();
    format!("{}[{}]", object.alloc, elements.join(","))
}

pub fn canonical_set(solver: &PropagationSolver, set: &PointsToSet) -> BTreeSet<String> {
    set.iter().map(|id| canonical_object(solver, id)).collect()
}

/// Allocation-site ids a points-to set ranges over
pub fn site_ids(solver: &PropagationSolver, set: &PointsToSet) -> BTreeSet<u32> {
    set.iter()
        .filter_map(|id| solver.object(id).unwrap())
        .filter_map(|o| match &o.alloc {
            AbstractAlloc::Site(site) => Some(site.0),
            _ => None,
        })
        .collect()
}

/// Assert `method`'s `local` points exactly to objects of `sites` (any context)
pub fn assert_points_to_sites(
    solver: &PropagationSolver,
    method: &MethodSig,
    local: Local,
    sites: &[&AllocSite],
) {
    let pts = solver.points_to_local(method, local).unwrap();
    let expected: BTreeSet<u32> = sites.iter().map(|s| s.id.0).collect();
    assert_eq!(
        site_ids(solver, &pts),
        expected,
        "points-to set of {method} {local}"
    );
}

/// Assert a query was refused because the run is unusable
pub fn assert_incomplete<T: std::fmt::Debug>(result: PtaResult<T>) {
    match result {
        Err(err) => assert!(err.is_incomplete(), "expected Incomplete, got {err:?}"),
        Ok(value) => panic!("expected Incomplete, got {value:?}"),
    }
}

pub fn assert_not_solved<T: std::fmt::Debug>(result: PtaResult<T>) {
    assert!(
        matches!(&result, Err(PtaError::NotSolved(_))),
        "expected NotSolved, got {result:?}"
    );
}
