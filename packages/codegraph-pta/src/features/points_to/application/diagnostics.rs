//! Pipeline statistics
//!
//! Observational only: nothing here feeds back into the analysis.
//! Per-method node counts replay each method's PAG edge stream and count
//! the distinct pointer-relevant entities (locals, return slot, allocation
//! sites, field-access bases, call arguments/receivers/results).

use crate::errors::PtaResult;
use crate::features::points_to::domain::{AllocSiteId, Local, MethodSig};
use crate::features::points_to::infrastructure::{MethodPag, PagNode, PropagationSolver, RunStats};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Methods reachable in the pre-analysis
    pub reachable_methods: usize,
    pub precision_critical_methods: usize,
    pub context_insensitive_methods: usize,
    /// Nodes of precision-critical methods
    pub cs_nodes: usize,
    /// Nodes of all other methods
    pub ci_nodes: usize,
    pub total_nodes: usize,
    pub per_method_nodes: BTreeMap<String, usize>,
    pub pre_analysis: RunStats,
    pub refined: Option<RunStats>,
}

#[derive(Hash, PartialEq, Eq)]
enum Entity {
    Local(Local),
    Return,
    Alloc(AllocSiteId),
}

/// Distinct pointer entities of one method
pub fn method_node_count(pag: &MethodPag) -> usize {
    let mut nodes: FxHashSet<Entity> = FxHashSet::default();

    let mut add = |node: &PagNode| match node {
        PagNode::Var(local) => {
            nodes.insert(Entity::Local(*local));
        }
        PagNode::Return => {
            nodes.insert(Entity::Return);
        }
        PagNode::Alloc(site) => {
            nodes.insert(Entity::Alloc(site.id));
        }
        PagNode::FieldRef { base, .. } => {
            nodes.insert(Entity::Local(*base));
        }
        PagNode::Static(_) => {}
    };
    for (from, to) in pag.edges().pairs() {
        add(from);
        add(to);
    }

    for invoke in pag.invokes() {
        nodes.extend(invoke.args.iter().flatten().map(|l| Entity::Local(*l)));
        nodes.extend(invoke.dst.map(Entity::Local));
        nodes.extend(invoke.base.map(Entity::Local));
    }
    nodes.len()
}

impl PipelineStats {
    /// Counts over the pre-analysis' reachable methods, split by `pcm`
    pub fn from_pre_analysis(
        pre: &PropagationSolver,
        pcm: &FxHashSet<MethodSig>,
    ) -> PtaResult<Self> {
        let methods = pre.reachable_methods()?;

        let counts: Vec<(MethodSig, usize)> = methods
            .par_iter()
            .filter_map(|m| pre.method_pag(m).map(|pag| (m.clone(), method_node_count(&pag))))
            .collect();

        let mut stats = PipelineStats {
            reachable_methods: methods.len(),
            precision_critical_methods: pcm.len(),
            context_insensitive_methods: methods.len().saturating_sub(pcm.len()),
            pre_analysis: pre.stats(),
            ..Default::default()
        };
        for (method, n) in counts {
            if pcm.contains(&method) {
                stats.cs_nodes += n;
            } else {
                stats.ci_nodes += n;
            }
            stats.total_nodes += n;
            stats.per_method_nodes.insert(method.to_string(), n);
        }
        Ok(stats)
    }

    pub fn with_refined(mut self, refined: RunStats) -> Self {
        self.refined = Some(refined);
        self
    }

    pub fn to_json(&self) -> PtaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn log_summary(&self) {
        tracing::info!(
            reachable = self.reachable_methods,
            pcm = self.precision_critical_methods,
            cim = self.context_insensitive_methods,
            cs_nodes = self.cs_nodes,
            ci_nodes = self.ci_nodes,
            total_nodes = self.total_nodes,
            "pipeline statistics"
        );
        if let Some(refined) = &self.refined {
            tracing::info!(
                nodes = refined.nodes,
                objects = refined.objects,
                contexts = refined.contexts,
                call_edges = refined.call_edges,
                unresolved = refined.unresolved_calls,
                duration_ms = refined.duration_ms,
                "refined run"
            );
        }
    }
}
