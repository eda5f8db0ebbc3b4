//! On-the-fly call graph
//!
//! Edges are (caller, caller context, call site) → (callee, callee context),
//! added when a call site resolves and never removed.

use crate::features::points_to::domain::{CallSiteId, ContextId, ContextInterner, MethodSig};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

/// Method under a context
pub type ContextMethod = (MethodSig, ContextId);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallEdge {
    pub caller: MethodSig,
    pub caller_ctx: ContextId,
    pub site: CallSiteId,
    pub callee: MethodSig,
    pub callee_ctx: ContextId,
}

#[derive(Debug, Default)]
pub struct CallGraph {
    edges: Vec<CallEdge>,
    edge_set: FxHashSet<CallEdge>,
    out: FxHashMap<ContextMethod, Vec<usize>>,
    inc: FxHashMap<ContextMethod, Vec<usize>>,
    targets: FxHashMap<CallSiteId, BTreeSet<MethodSig>>,
    reachable: Vec<ContextMethod>,
    reachable_set: FxHashSet<ContextMethod>,
    methods: FxHashSet<MethodSig>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the edge is already known
    pub fn add_edge(&mut self, edge: CallEdge) -> bool {
        if self.edge_set.contains(&edge) {
            return false;
        }
        let idx = self.edges.len();
        self.out
            .entry((edge.caller.clone(), edge.caller_ctx))
            .or_default()
            .push(idx);
        self.inc
            .entry((edge.callee.clone(), edge.callee_ctx))
            .or_default()
            .push(idx);
        self.targets
            .entry(edge.site)
            .or_default()
            .insert(edge.callee.clone());
        self.edge_set.insert(edge.clone());
        self.edges.push(edge);
        true
    }

    /// Returns false if `(method, ctx)` was already reachable
    pub fn add_reachable(&mut self, method: &MethodSig, ctx: ContextId) -> bool {
        let key = (method.clone(), ctx);
        if !self.reachable_set.insert(key.clone()) {
            return false;
        }
        self.methods.insert(method.clone());
        self.reachable.push(key);
        true
    }

    pub fn callees_of(&self, method: &MethodSig, ctx: ContextId) -> Vec<ContextMethod> {
        self.collect(&self.out, method, ctx, |e| (e.callee.clone(), e.callee_ctx))
    }

    pub fn callers_of(&self, method: &MethodSig, ctx: ContextId) -> Vec<ContextMethod> {
        self.collect(&self.inc, method, ctx, |e| (e.caller.clone(), e.caller_ctx))
    }

    fn collect(
        &self,
        index: &FxHashMap<ContextMethod, Vec<usize>>,
        method: &MethodSig,
        ctx: ContextId,
        pick: impl Fn(&CallEdge) -> ContextMethod,
    ) -> Vec<ContextMethod> {
        let mut out: Vec<ContextMethod> = index
            .get(&(method.clone(), ctx))
            .into_iter()
            .flatten()
            .map(|&i| pick(&self.edges[i]))
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Distinct targets of a call site over all contexts
    pub fn targets_of(&self, site: CallSiteId) -> Vec<MethodSig> {
        self.targets
            .get(&site)
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn fan_out(&self, site: CallSiteId) -> usize {
        self.targets.get(&site).map_or(0, BTreeSet::len)
    }

    /// Reachable (method, context) pairs in discovery order
    pub fn reachable(&self) -> &[ContextMethod] {
        &self.reachable
    }

    pub fn is_reachable(&self, method: &MethodSig) -> bool {
        self.methods.contains(method)
    }

    /// Reachable methods, sorted
    pub fn reachable_methods(&self) -> Vec<MethodSig> {
        let mut methods: Vec<MethodSig> = self.methods.iter().cloned().collect();
        methods.sort();
        methods
    }

    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Export as a petgraph digraph; nodes are `method@context`, edges are call sites
    pub fn to_petgraph(&self, contexts: &ContextInterner) -> DiGraph<String, String> {
        let mut graph = DiGraph::new();
        let mut nodes: FxHashMap<&ContextMethod, NodeIndex> = FxHashMap::default();

        for cm in &self.reachable {
            let label = format!("{}@{}", cm.0, contexts.get(cm.1));
            nodes.insert(cm, graph.add_node(label));
        }
        for edge in &self.edges {
            let from = nodes.get(&(edge.caller.clone(), edge.caller_ctx)).copied();
            let to = nodes.get(&(edge.callee.clone(), edge.callee_ctx)).copied();
            if let (Some(from), Some(to)) = (from, to) {
                graph.add_edge(from, to, edge.site.to_string());
            }
        }
        graph
    }

    /// Graphviz DOT rendering of [`Self::to_petgraph`]
    pub fn to_dot(&self, contexts: &ContextInterner) -> String {
        let graph = self.to_petgraph(contexts);
        format!("{}", Dot::new(&graph))
    }
}
