//! Staged Pipeline
//!
//! ```text
//! config ──validate──▶ entry points ──▶ run A (insensitive, alloc-site)
//!                                            │
//!                                   precision selection (PCM)
//!                                            │
//!                   run B (heuristic ▸ partial k-selector on PCM,
//!                          heuristic heap merging) ──▶ outcome
//! ```
//!
//! Runs A and B own their PAGs; they only share the immutable program
//! inputs. A is dropped once its statistics and the PCM set are taken.

use super::diagnostics::PipelineStats;
use super::precision_selection::{select_precision_critical, PrecisionReport};
use crate::config::{ConfigError, ContextKind, PtaConfig};
use crate::errors::{PtaError, PtaResult};
use crate::features::points_to::domain::{MethodSig, TypeName};
use crate::features::points_to::infrastructure::{
    AllocSiteAbstractor, CancellationToken, HeuristicAbstractor, HeuristicSelector,
    KCallSiteSelector, KObjectSelector, MethodPag, PartialMethodLevelSelector, PipelineSelector,
    Program, PropagationSolver, RunStats,
};
use crate::features::points_to::ports::{
    ClassHierarchy, ContextSelector, HeapAbstractor, MethodBodyProvider,
};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Result of a pipeline run; `solver` is the refined, quiescent run B
pub struct PipelineOutcome {
    pub solver: PropagationSolver,
    pub pre_analysis: RunStats,
    pub precision: PrecisionReport,
    pub pcm: Arc<FxHashSet<MethodSig>>,
    pub stats: PipelineStats,
}

pub struct StagedPipeline {
    config: PtaConfig,
    provider: Arc<dyn MethodBodyProvider>,
    hierarchy: Arc<dyn ClassHierarchy>,
    cancel: Option<CancellationToken>,
}

impl StagedPipeline {
    pub fn new(
        config: PtaConfig,
        provider: Arc<dyn MethodBodyProvider>,
        hierarchy: Arc<dyn ClassHierarchy>,
    ) -> Self {
        Self {
            config,
            provider,
            hierarchy,
            cancel: None,
        }
    }

    pub fn for_program(config: PtaConfig, program: Arc<Program>) -> Self {
        Self::new(config, program.clone(), program)
    }

    /// Token checked by both runs
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &PtaConfig {
        &self.config
    }

    pub fn run(&self) -> PtaResult<PipelineOutcome> {
        self.config.validate()?;
        let entries = self.entry_points()?;

        info!("pre-analysis: {} entry points", entries.len());
        let mut pre = self.solver();
        for entry in &entries {
            pre.add_entry_point(entry)?;
        }
        pre.solve()?;

        let precision = select_precision_critical(&pre, self.config.pcm_fanout_threshold)?;
        let pcm = Arc::new(precision.to_set());
        let stats = PipelineStats::from_pre_analysis(&pre, &pcm)?;
        let pre_analysis = pre.stats();

        let selector = self.refined_selector(pcm.clone());
        let abstractor = self.refined_abstractor(&pre)?;
        drop(pre);

        info!(
            "refined analysis: {} precision-critical methods, k={}, hk={}, {:?}",
            pcm.len(),
            self.config.k,
            self.config.hk,
            self.config.context_kind
        );
        let mut refined = self
            .solver()
            .with_selector(selector)
            .with_abstractor(abstractor);
        for entry in &entries {
            refined.add_entry_point(entry)?;
        }
        refined.solve()?;

        let stats = stats.with_refined(refined.stats());
        stats.log_summary();

        Ok(PipelineOutcome {
            solver: refined,
            pre_analysis,
            precision,
            pcm,
            stats,
        })
    }

    /// Parse and resolve configured entry points
    pub fn entry_points(&self) -> PtaResult<Vec<MethodSig>> {
        if self.config.entry_points.is_empty() {
            return Err(ConfigError::validation("entry_points must not be empty").into());
        }
        self.config
            .entry_points
            .iter()
            .map(|raw| {
                let sig: MethodSig = raw.parse().map_err(PtaError::InvalidSignature)?;
                self.hierarchy
                    .resolve_method(&sig)
                    .ok_or_else(|| PtaError::UnknownEntryPoint(raw.clone()))
            })
            .collect()
    }

    fn solver(&self) -> PropagationSolver {
        let solver = PropagationSolver::new(self.provider.clone(), self.hierarchy.clone())
            .with_order(self.config.worklist_order)
            .with_time_budget(self.config.time_budget_ms.map(Duration::from_millis));
        match &self.cancel {
            Some(token) => solver.with_cancellation(token.clone()),
            None => solver,
        }
    }

    fn refined_selector(&self, pcm: Arc<FxHashSet<MethodSig>>) -> Arc<dyn ContextSelector> {
        let (k, hk) = (self.config.k, self.config.hk);
        let inner: Arc<dyn ContextSelector> = match self.config.context_kind {
            ContextKind::Object => Arc::new(KObjectSelector::new(k, hk)),
            ContextKind::CallSite => Arc::new(KCallSiteSelector::new(k, hk)),
        };
        let partial = Arc::new(PartialMethodLevelSelector::new(inner, pcm));

        if self.config.enforce_empty_context_for_ignored_types {
            let heuristic = Arc::new(HeuristicSelector::new(
                self.hierarchy.clone(),
                self.config.ignored_type_prefixes.clone(),
            ));
            Arc::new(PipelineSelector::new(heuristic, partial))
        } else {
            partial
        }
    }

    fn refined_abstractor(&self, pre: &PropagationSolver) -> PtaResult<Arc<dyn HeapAbstractor>> {
        if !self.config.heap_merge {
            return Ok(Arc::new(AllocSiteAbstractor));
        }
        let pags: Vec<Arc<MethodPag>> = pre
            .reachable_methods()?
            .iter()
            .filter_map(|m| pre.method_pag(m))
            .collect();
        let abstractor = HeuristicAbstractor::from_bodies(
            pags.iter().map(|p| p.body()),
            self.config.heap_merge_threshold,
            self.config.merge_types.iter().map(TypeName::new),
        );
        info!(
            "heap merging enabled for {} types",
            abstractor.merged_types().count()
        );
        Ok(Arc::new(abstractor))
    }
}
