//! Worklist Propagation Solver
//!
//! Inclusion-based, context-sensitive points-to analysis with on-the-fly
//! call graph construction.
//!
//! # Algorithm
//! 1. Entry methods are built under the empty context; their allocations
//!    seed the worklist with `(node, {object})` deltas.
//! 2. Pop `(n, delta)`, compute `diff = delta - pts(n)`, union `diff` in.
//! 3. Forward `diff` along copy edges (cast edges filter by subtype).
//! 4. Loads/stores on `n` connect `(o, f)` field nodes for every `o` in `diff`.
//! 5. Instance calls on `n` dispatch on every `o` in `diff`; new targets are
//!    built under the selector's context and wired (args, return, `this`).
//!    New call edges are queued and drained iteratively before the next pop.
//! 6. Empty worklist: quiescent.
//!
//! Each `(node, object)` pair is propagated at most once, so the run
//! terminates for any selector/abstractor with a finite universe.
//!
//! # States
//! `Idle → Propagating → Quiescent`, back to `Propagating` when new entry
//! points are injected. Cancellation, time budget exhaustion and invariant
//! violations move to `Failed`: partial state is dropped and every query
//! reports the failure.

use super::call_graph::{CallEdge, CallGraph};
use super::cancellation::CancellationToken;
use super::context_selector::InsensitiveSelector;
use super::heap_abstractor::AllocSiteAbstractor;
use super::method_pag::{EdgeKind, MethodPag, MethodPagCache, PagNode};
use super::pag::{NodeId, NodeKey, Pag, ReceiverCall, VarSlot};
use super::points_to_set::PointsToSet;
use crate::config::WorklistOrder;
use crate::errors::{PtaError, PtaResult};
use crate::features::points_to::domain::{
    AbstractAlloc, AllocSite, AllocSiteId, CallSiteId, Context, ContextId, ContextInterner, FieldSig,
    HeapObject, Invoke, InvokeKind, Local, MethodSig, ObjectId, ObjectTable, TypeName,
};
use crate::features::points_to::ports::{
    AllocSiteInfo, CallSiteInfo, ClassHierarchy, ContextSelector, HeapAbstractor,
    MethodBodyProvider, ReceiverInfo,
};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverState {
    Idle,
    Propagating,
    Quiescent,
    Failed,
}

/// Statistics of one solver run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Built (method, context) pairs
    pub methods_built: usize,
    pub reachable_methods: usize,
    pub reachable_contexts: usize,
    pub nodes: usize,
    pub objects: usize,
    pub contexts: usize,
    pub copy_edges: usize,
    pub field_edges: usize,
    pub call_edges: usize,
    /// Non-empty deltas applied
    pub propagations: usize,
    /// Distinct dropped (call site, receiver type) pairs
    pub unresolved_calls: usize,
    pub method_pags_built: usize,
    pub duration_ms: f64,
}

/// Call edge whose callee is not yet built and wired
#[derive(Debug)]
struct PendingCall {
    caller: MethodSig,
    caller_ctx: ContextId,
    invoke: Invoke,
    target: MethodSig,
    callee_ctx: ContextId,
    receiver: Option<ObjectId>,
    is_new: bool,
}

/// Propagation solver for one analysis run
pub struct PropagationSolver {
    hierarchy: Arc<dyn ClassHierarchy>,
    selector: Arc<dyn ContextSelector>,
    abstractor: Arc<dyn HeapAbstractor>,
    order: WorklistOrder,
    cancel: Option<CancellationToken>,
    time_budget: Option<Duration>,

    pags: MethodPagCache,
    pag: Pag,
    contexts: ContextInterner,
    objects: ObjectTable,
    call_graph: CallGraph,
    worklist: VecDeque<(NodeId, PointsToSet)>,
    pending: VecDeque<PendingCall>,

    unresolved: FxHashSet<(CallSiteId, Option<TypeName>)>,
    propagations: usize,
    elapsed: Duration,
    state: SolverState,
    failure: Option<String>,
}

impl PropagationSolver {
    /// Context-insensitive, allocation-site solver
    pub fn new(provider: Arc<dyn MethodBodyProvider>, hierarchy: Arc<dyn ClassHierarchy>) -> Self {
        Self {
            hierarchy,
            selector: Arc::new(InsensitiveSelector),
            abstractor: Arc::new(AllocSiteAbstractor),
            order: WorklistOrder::default(),
            cancel: None,
            time_budget: None,
            pags: MethodPagCache::new(provider),
            pag: Pag::new(),
            contexts: ContextInterner::new(),
            objects: ObjectTable::new(),
            call_graph: CallGraph::new(),
            worklist: VecDeque::new(),
            pending: VecDeque::new(),
            unresolved: FxHashSet::default(),
            propagations: 0,
            elapsed: Duration::ZERO,
            state: SolverState::Idle,
            failure: None,
        }
    }

    pub fn with_selector(mut self, selector: Arc<dyn ContextSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_abstractor(mut self, abstractor: Arc<dyn HeapAbstractor>) -> Self {
        self.abstractor = abstractor;
        self
    }

    pub fn with_order(mut self, order: WorklistOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    #[inline]
    pub fn state(&self) -> SolverState {
        self.state
    }

    // ------------------------------------------------------------------
    // Graph construction
    // ------------------------------------------------------------------

    /// Make `method` reachable under the empty context.
    ///
    /// Allowed before solving and after quiescence (re-entrant).
    pub fn add_entry_point(&mut self, method: &MethodSig) -> PtaResult<()> {
        self.ensure_not_failed()?;
        let resolved = self
            .hierarchy
            .resolve_method(method)
            .ok_or_else(|| PtaError::UnknownEntryPoint(method.to_string()))?;

        info!("entry point: {}", resolved);
        self.call_graph.add_reachable(&resolved, ContextId::EMPTY);
        self.guarded(|s| {
            s.build_method(&resolved, ContextId::EMPTY)?;
            s.drain_pending()
        })?;
        self.reopen_if_pending();
        Ok(())
    }

    /// Instantiate the PAG of `method` under `context`.
    ///
    /// Returns false when the pair was already built; nothing is added then.
    pub fn build_method_in(&mut self, method: &MethodSig, context: &Context) -> PtaResult<bool> {
        self.ensure_not_failed()?;
        let ctx = self.contexts.intern(context.clone());
        let built = self.guarded(|s| {
            let built = s.build_method(method, ctx)?;
            s.drain_pending()?;
            Ok(built)
        })?;
        if built {
            self.call_graph.add_reachable(method, ctx);
        }
        self.reopen_if_pending();
        Ok(built)
    }

    fn reopen_if_pending(&mut self) {
        if self.state == SolverState::Quiescent
            && (!self.worklist.is_empty() || !self.pending.is_empty())
        {
            self.state = SolverState::Propagating;
        }
    }

    fn build_method(&mut self, method: &MethodSig, ctx: ContextId) -> PtaResult<bool> {
        if !self.pag.mark_built(method, ctx) {
            return Ok(false);
        }
        let Some(mpag) = self.pags.get_or_build(method) else {
            debug!("no body, boundary method: {}", method);
            return Ok(true);
        };

        for edge in mpag.edges() {
            match &edge.kind {
                EdgeKind::New => {
                    let PagNode::Alloc(site) = &edge.from else {
                        return Err(malformed(method, "NEW source is not an allocation"));
                    };
                    let dst = self.local_node(method, &edge.to, ctx)?;
                    let obj = self.new_object(site, method, ctx);
                    self.enqueue(dst, PointsToSet::singleton(obj));
                }
                EdgeKind::Assign => {
                    let from = self.local_node(method, &edge.from, ctx)?;
                    let to = self.local_node(method, &edge.to, ctx)?;
                    self.add_copy_edge(from, to, None);
                }
                EdgeKind::Cast(ty) => {
                    let from = self.local_node(method, &edge.from, ctx)?;
                    let to = self.local_node(method, &edge.to, ctx)?;
                    self.add_copy_edge(from, to, Some(ty.clone()));
                }
                EdgeKind::Load => {
                    let PagNode::FieldRef { base, field } = &edge.from else {
                        return Err(malformed(method, "LOAD source is not a field reference"));
                    };
                    let base = self.var_node(method, VarSlot::Local(*base), ctx)?;
                    let dst = self.local_node(method, &edge.to, ctx)?;
                    if self.pag.add_load(base, field.clone(), dst) {
                        for obj in self.pag.points_to(base).to_vec() {
                            let fnode = self.field_node(obj, field)?;
                            self.add_copy_edge(fnode, dst, None);
                        }
                    }
                }
                EdgeKind::Store => {
                    let PagNode::FieldRef { base, field } = &edge.to else {
                        return Err(malformed(method, "STORE target is not a field reference"));
                    };
                    let base = self.var_node(method, VarSlot::Local(*base), ctx)?;
                    let src = self.local_node(method, &edge.from, ctx)?;
                    if self.pag.add_store(base, field.clone(), src) {
                        for obj in self.pag.points_to(base).to_vec() {
                            let fnode = self.field_node(obj, field)?;
                            self.add_copy_edge(src, fnode, None);
                        }
                    }
                }
            }
        }

        for invoke in mpag.invokes() {
            self.build_invoke(method, ctx, invoke)?;
        }

        debug!(
            "built {}@{} ({} edges, {} calls)",
            method,
            self.contexts.get(ctx),
            mpag.edge_count(),
            mpag.invokes().len()
        );
        Ok(true)
    }

    fn build_invoke(&mut self, caller: &MethodSig, ctx: ContextId, invoke: &Invoke) -> PtaResult<()> {
        match (invoke.kind, invoke.base) {
            (InvokeKind::Virtual | InvokeKind::Special, Some(base)) => {
                let base = self.var_node(caller, VarSlot::Local(base), ctx)?;
                let call = ReceiverCall {
                    caller: caller.clone(),
                    caller_ctx: ctx,
                    invoke: invoke.clone(),
                };
                for obj in self.pag.points_to(base).to_vec() {
                    self.dispatch(&call, obj)?;
                }
                self.pag.add_receiver_call(base, call);
            }
            _ => match self.hierarchy.resolve_method(&invoke.callee) {
                Some(target) => self.add_call_edge(caller, ctx, invoke, &target, None)?,
                None => self.record_unresolved(invoke, None),
            },
        }
        Ok(())
    }

    fn dispatch(&mut self, call: &ReceiverCall, obj: ObjectId) -> PtaResult<()> {
        let ty = self.object_type(obj)?;
        let target = match call.invoke.kind {
            InvokeKind::Virtual => self.hierarchy.dispatch(&ty, &call.invoke.callee),
            _ => self.hierarchy.resolve_method(&call.invoke.callee),
        };
        match target {
            Some(target) => {
                self.add_call_edge(&call.caller, call.caller_ctx, &call.invoke, &target, Some(obj))
            }
            None => {
                self.record_unresolved(&call.invoke, Some(ty));
                Ok(())
            }
        }
    }

    fn add_call_edge(
        &mut self,
        caller: &MethodSig,
        caller_ctx: ContextId,
        invoke: &Invoke,
        target: &MethodSig,
        receiver: Option<ObjectId>,
    ) -> PtaResult<()> {
        let caller_context = self.contexts.get(caller_ctx).clone();
        let selection = match receiver {
            Some(obj) => {
                let (ty, heap_ctx) = self
                    .objects
                    .get(obj)
                    .map(|o| (o.ty.clone(), o.context))
                    .ok_or_else(|| PtaError::invariant(format!("unknown object {}", obj)))?;
                let heap_context = self.contexts.get(heap_ctx).clone();
                let info = CallSiteInfo {
                    site: invoke.site,
                    caller,
                    caller_context: &caller_context,
                    receiver: Some(ReceiverInfo {
                        object: obj,
                        ty: &ty,
                        heap_context: &heap_context,
                    }),
                };
                self.selector.select_context(&info, target)
            }
            None => {
                let info = CallSiteInfo {
                    site: invoke.site,
                    caller,
                    caller_context: &caller_context,
                    receiver: None,
                };
                self.selector.select_context(&info, target)
            }
        };
        let callee_ctx = self.contexts.intern(selection.resolve());

        let is_new = self.call_graph.add_edge(CallEdge {
            caller: caller.clone(),
            caller_ctx,
            site: invoke.site,
            callee: target.clone(),
            callee_ctx,
        });
        if self.call_graph.add_reachable(target, callee_ctx) {
            debug!("reachable: {}@{}", target, self.contexts.get(callee_ctx));
        }
        self.pending.push_back(PendingCall {
            caller: caller.clone(),
            caller_ctx,
            invoke: invoke.clone(),
            target: target.clone(),
            callee_ctx,
            receiver,
            is_new,
        });
        Ok(())
    }

    /// Build and wire queued callees until none are left.
    ///
    /// Building a callee may queue its own calls; this loop handles them too.
    fn drain_pending(&mut self) -> PtaResult<()> {
        while let Some(call) = self.pending.pop_front() {
            self.build_method(&call.target, call.callee_ctx)?;
            let Some(callee) = self.pags.get(&call.target) else {
                continue;
            };

            if let (Some(obj), Some(this)) = (call.receiver, callee.this_local()) {
                let this_node =
                    self.var_node(&call.target, VarSlot::Local(this), call.callee_ctx)?;
                self.enqueue(this_node, PointsToSet::singleton(obj));
            }

            if call.is_new {
                self.wire_arguments(
                    &call.caller,
                    call.caller_ctx,
                    &call.invoke,
                    &callee,
                    call.callee_ctx,
                )?;
            }
        }
        Ok(())
    }

    fn wire_arguments(
        &mut self,
        caller: &MethodSig,
        caller_ctx: ContextId,
        invoke: &Invoke,
        callee: &MethodPag,
        callee_ctx: ContextId,
    ) -> PtaResult<()> {
        let target = callee.sig().clone();
        for (i, arg) in invoke.args.iter().enumerate() {
            if let (Some(arg), Some(param)) = (arg, callee.param(i)) {
                let from = self.var_node(caller, VarSlot::Local(*arg), caller_ctx)?;
                let to = self.var_node(&target, VarSlot::Local(param), callee_ctx)?;
                self.add_copy_edge(from, to, None);
            }
        }
        if let Some(dst) = invoke.dst {
            let from = self.var_node(&target, VarSlot::Return, callee_ctx)?;
            let to = self.var_node(caller, VarSlot::Local(dst), caller_ctx)?;
            self.add_copy_edge(from, to, None);
        }
        Ok(())
    }

    fn record_unresolved(&mut self, invoke: &Invoke, ty: Option<TypeName>) {
        let reported = match &ty {
            Some(t) => format!("{} on {}", invoke.callee, t),
            None => invoke.callee.to_string(),
        };
        if self.unresolved.insert((invoke.site, ty)) {
            warn!("unresolved call at {}: {}, edge dropped", invoke.site, reported);
        }
    }

    fn new_object(&mut self, site: &AllocSite, method: &MethodSig, ctx: ContextId) -> ObjectId {
        let enclosing = self.contexts.get(ctx).clone();
        let heap = self
            .selector
            .select_heap_context(&AllocSiteInfo {
                site,
                method,
                enclosing_context: &enclosing,
            })
            .resolve();
        let alloc = self.abstractor.abstract_object(site, &heap);
        let heap_ctx = if alloc.is_merged() {
            ContextId::EMPTY
        } else {
            self.contexts.intern(heap)
        };
        self.objects.intern(alloc, &site.ty, heap_ctx, method).0
    }

    fn add_copy_edge(&mut self, from: NodeId, to: NodeId, filter: Option<TypeName>) {
        if !self.pag.add_copy(from, to, filter.clone()) {
            return;
        }
        let existing = self.pag.points_to(from);
        if existing.is_empty() {
            return;
        }
        let delta = match &filter {
            Some(ty) => self.type_filter(existing, ty),
            None => existing.clone(),
        };
        self.enqueue(to, delta);
    }

    fn type_filter(&self, set: &PointsToSet, ty: &TypeName) -> PointsToSet {
        set.filtered(|o| {
            self.objects
                .get(o)
                .is_some_and(|obj| self.hierarchy.is_subtype(&obj.ty, ty))
        })
    }

    #[inline]
    fn enqueue(&mut self, node: NodeId, delta: PointsToSet) {
        if !delta.is_empty() {
            self.worklist.push_back((node, delta));
        }
    }

    fn var_node(&mut self, method: &MethodSig, slot: VarSlot, ctx: ContextId) -> PtaResult<NodeId> {
        self.pag.intern(NodeKey::Var {
            method: method.clone(),
            slot,
            ctx,
        })
    }

    fn local_node(&mut self, method: &MethodSig, node: &PagNode, ctx: ContextId) -> PtaResult<NodeId> {
        match node {
            PagNode::Var(local) => self.var_node(method, VarSlot::Local(*local), ctx),
            PagNode::Return => self.var_node(method, VarSlot::Return, ctx),
            PagNode::Static(field) => self.pag.intern(NodeKey::Static(field.clone())),
            other => Err(malformed(method, &format!("{} is not a pointer node", other))),
        }
    }

    fn field_node(&mut self, object: ObjectId, field: &FieldSig) -> PtaResult<NodeId> {
        self.pag.intern(NodeKey::Field {
            object,
            field: field.clone(),
        })
    }

    fn object_type(&self, obj: ObjectId) -> PtaResult<TypeName> {
        self.objects
            .get(obj)
            .map(|o| o.ty.clone())
            .ok_or_else(|| PtaError::invariant(format!("unknown object {}", obj)))
    }

    // ------------------------------------------------------------------
    // Propagation
    // ------------------------------------------------------------------

    /// Run to quiescence
    pub fn solve(&mut self) -> PtaResult<()> {
        self.ensure_not_failed()?;
        self.state = SolverState::Propagating;
        let start = Instant::now();
        info!(
            "propagation started: {} pending deltas, {} reachable",
            self.worklist.len(),
            self.call_graph.reachable().len()
        );

        loop {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Err(self.fail("run cancelled"));
            }
            if let Some(budget) = self.time_budget {
                if self.elapsed + start.elapsed() >= budget {
                    return Err(self.fail(&format!(
                        "time budget of {} ms exhausted",
                        budget.as_millis()
                    )));
                }
            }
            match self.step() {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    let reason = err.to_string();
                    self.fail(&reason);
                    return Err(err);
                }
            }
        }

        self.elapsed += start.elapsed();
        self.state = SolverState::Quiescent;
        let stats = self.stats();
        info!(
            "quiescent: {} reachable methods, {} nodes, {} objects, {} call edges, {} unresolved in {:.2}ms",
            stats.reachable_methods,
            stats.nodes,
            stats.objects,
            stats.call_edges,
            stats.unresolved_calls,
            stats.duration_ms
        );
        Ok(())
    }

    /// Build queued callees, then process one worklist entry; false when
    /// nothing is left
    pub(crate) fn step(&mut self) -> PtaResult<bool> {
        self.drain_pending()?;
        let next = match self.order {
            WorklistOrder::Fifo => self.worklist.pop_front(),
            WorklistOrder::Lifo => self.worklist.pop_back(),
        };
        let Some((node, delta)) = next else {
            return Ok(false);
        };

        let diff = delta.difference(self.pag.points_to(node));
        if diff.is_empty() {
            return Ok(true);
        }

        let pts = self.pag.points_to_mut(node);
        let before = pts.len();
        let added = pts.union_with(&diff);
        if added != diff.len() || pts.len() != before + added {
            return Err(PtaError::invariant(format!(
                "points-to set of n{} changed by {} instead of growing by {}",
                node.0,
                pts.len() as isize - before as isize,
                diff.len()
            )));
        }
        self.propagations += 1;

        for (succ, filter) in self.pag.copy_succs(node).to_vec() {
            let forwarded = match &filter {
                Some(ty) => self.type_filter(&diff, ty),
                None => diff.clone(),
            };
            self.enqueue(succ, forwarded);
        }

        let loads = self.pag.loads(node).to_vec();
        let stores = self.pag.stores(node).to_vec();
        if !loads.is_empty() || !stores.is_empty() {
            for obj in diff.iter() {
                for (field, dst) in &loads {
                    let fnode = self.field_node(obj, field)?;
                    self.add_copy_edge(fnode, *dst, None);
                }
                for (field, src) in &stores {
                    let fnode = self.field_node(obj, field)?;
                    self.add_copy_edge(*src, fnode, None);
                }
            }
        }

        let calls = self.pag.receiver_calls(node).to_vec();
        for call in &calls {
            for obj in diff.iter() {
                self.dispatch(call, obj)?;
            }
        }

        Ok(true)
    }

    fn fail(&mut self, reason: &str) -> PtaError {
        warn!("solver run failed: {}", reason);
        self.state = SolverState::Failed;
        self.failure = Some(reason.to_string());
        self.worklist.clear();
        self.pending.clear();
        self.pag = Pag::new();
        self.objects = ObjectTable::new();
        self.call_graph = CallGraph::new();
        PtaError::incomplete(reason)
    }

    fn guarded<T>(&mut self, op: impl FnOnce(&mut Self) -> PtaResult<T>) -> PtaResult<T> {
        let result = op(self);
        if let Err(PtaError::InvariantViolation(reason)) = &result {
            let reason = reason.clone();
            self.fail(&reason);
        }
        result
    }

    fn ensure_not_failed(&self) -> PtaResult<()> {
        match self.state {
            SolverState::Failed => Err(PtaError::incomplete(
                self.failure.clone().unwrap_or_else(|| "run failed".to_string()),
            )),
            _ => Ok(()),
        }
    }

    fn ensure_solved(&self) -> PtaResult<()> {
        match self.state {
            SolverState::Quiescent => Ok(()),
            SolverState::Failed => self.ensure_not_failed(),
            SolverState::Idle => Err(PtaError::NotSolved("solve() was never called".into())),
            SolverState::Propagating => {
                Err(PtaError::NotSolved("new work is pending, call solve()".into()))
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries (quiescent runs only)
    // ------------------------------------------------------------------

    /// Points-to set of `local` in `method` under `context`
    pub fn points_to(&self, method: &MethodSig, local: Local, context: &Context) -> PtaResult<PointsToSet> {
        self.ensure_solved()?;
        let Some(ctx) = self.contexts.lookup(context) else {
            return Ok(PointsToSet::new());
        };
        Ok(self.node_set(&NodeKey::Var {
            method: method.clone(),
            slot: VarSlot::Local(local),
            ctx,
        }))
    }

    /// Union over every context `method` was analyzed under
    pub fn points_to_local(&self, method: &MethodSig, local: Local) -> PtaResult<PointsToSet> {
        self.ensure_solved()?;
        let mut out = PointsToSet::new();
        for &id in self.pag.vars_of(method) {
            if let Some(NodeKey::Var {
                slot: VarSlot::Local(l),
                ..
            }) = self.pag.key(id)
            {
                if *l == local {
                    out.union_with(self.pag.points_to(id));
                }
            }
        }
        Ok(out)
    }

    /// Points-to set of the return slot of `method` under `context`
    pub fn points_to_return(&self, method: &MethodSig, context: &Context) -> PtaResult<PointsToSet> {
        self.ensure_solved()?;
        let Some(ctx) = self.contexts.lookup(context) else {
            return Ok(PointsToSet::new());
        };
        Ok(self.node_set(&NodeKey::Var {
            method: method.clone(),
            slot: VarSlot::Return,
            ctx,
        }))
    }

    pub fn points_to_static(&self, field: &FieldSig) -> PtaResult<PointsToSet> {
        self.ensure_solved()?;
        Ok(self.node_set(&NodeKey::Static(field.clone())))
    }

    /// Points-to set of field node `(object, field)`
    pub fn points_to_field(&self, object: ObjectId, field: &FieldSig) -> PtaResult<PointsToSet> {
        self.ensure_solved()?;
        Ok(self.node_set(&NodeKey::Field {
            object,
            field: field.clone(),
        }))
    }

    fn node_set(&self, key: &NodeKey) -> PointsToSet {
        self.pag
            .lookup(key)
            .map(|id| self.pag.points_to(id).clone())
            .unwrap_or_default()
    }

    /// Whether two locals of `method` may reference a common object
    pub fn may_alias(&self, method: &MethodSig, a: Local, b: Local) -> PtaResult<bool> {
        Ok(self
            .points_to_local(method, a)?
            .intersects(&self.points_to_local(method, b)?))
    }

    pub fn object(&self, id: ObjectId) -> PtaResult<Option<&HeapObject>> {
        self.ensure_solved()?;
        Ok(self.objects.get(id))
    }

    pub fn heap_context(&self, id: ObjectId) -> PtaResult<Option<Context>> {
        self.ensure_solved()?;
        Ok(self.objects.get(id).map(|o| self.contexts.get(o.context).clone()))
    }

    /// Objects abstracting allocation site `site` (all heap contexts)
    pub fn objects_of_site(&self, site: AllocSiteId) -> PtaResult<Vec<ObjectId>> {
        self.ensure_solved()?;
        Ok(self
            .objects
            .iter()
            .filter(|o| o.alloc == AbstractAlloc::Site(site))
            .map(|o| o.id)
            .collect())
    }

    /// Object of merged type `ty`, if the run created one
    pub fn merged_object(&self, ty: &TypeName) -> PtaResult<Option<ObjectId>> {
        self.ensure_solved()?;
        Ok(self
            .objects
            .iter()
            .find(|o| matches!(&o.alloc, AbstractAlloc::Merged(t) if t == ty))
            .map(|o| o.id))
    }

    pub fn callees_of(&self, method: &MethodSig, context: &Context) -> PtaResult<Vec<(MethodSig, Context)>> {
        self.ensure_solved()?;
        let Some(ctx) = self.contexts.lookup(context) else {
            return Ok(Vec::new());
        };
        Ok(self.with_contexts(self.call_graph.callees_of(method, ctx)))
    }

    pub fn callers_of(&self, method: &MethodSig, context: &Context) -> PtaResult<Vec<(MethodSig, Context)>> {
        self.ensure_solved()?;
        let Some(ctx) = self.contexts.lookup(context) else {
            return Ok(Vec::new());
        };
        Ok(self.with_contexts(self.call_graph.callers_of(method, ctx)))
    }

    /// Callees of `method` over all its contexts, contexts dropped
    pub fn callee_methods(&self, method: &MethodSig) -> PtaResult<Vec<MethodSig>> {
        self.ensure_solved()?;
        let mut out: Vec<MethodSig> = self
            .call_graph
            .edges()
            .iter()
            .filter(|e| &e.caller == method)
            .map(|e| e.callee.clone())
            .collect();
        out.sort();
        out.dedup();
        Ok(out)
    }

    fn with_contexts(&self, pairs: Vec<(MethodSig, ContextId)>) -> Vec<(MethodSig, Context)> {
        pairs
            .into_iter()
            .map(|(m, c)| (m, self.contexts.get(c).clone()))
            .collect()
    }

    /// Distinct targets of call site `site`
    pub fn call_targets(&self, site: CallSiteId) -> PtaResult<Vec<MethodSig>> {
        self.ensure_solved()?;
        Ok(self.call_graph.targets_of(site))
    }

    /// Number of distinct methods a call site resolved to
    pub fn call_fan_out(&self, site: CallSiteId) -> PtaResult<usize> {
        self.ensure_solved()?;
        Ok(self.call_graph.fan_out(site))
    }

    pub fn reachable_methods(&self) -> PtaResult<Vec<MethodSig>> {
        self.ensure_solved()?;
        Ok(self.call_graph.reachable_methods())
    }

    pub fn reachable_contexts(&self) -> PtaResult<Vec<(MethodSig, Context)>> {
        self.ensure_solved()?;
        let mut out = self.with_contexts(self.call_graph.reachable().to_vec());
        out.sort();
        Ok(out)
    }

    pub fn is_reachable(&self, method: &MethodSig) -> PtaResult<bool> {
        self.ensure_solved()?;
        Ok(self.call_graph.is_reachable(method))
    }

    /// Method PAG, for methods that were built with a body
    pub fn method_pag(&self, method: &MethodSig) -> Option<Arc<MethodPag>> {
        self.pags.get(method)
    }

    pub fn call_graph_dot(&self) -> PtaResult<String> {
        self.ensure_solved()?;
        Ok(self.call_graph.to_dot(&self.contexts))
    }

    /// Statistics; available in every state
    pub fn stats(&self) -> RunStats {
        RunStats {
            methods_built: self.pag.built_count(),
            reachable_methods: self.call_graph.reachable_methods().len(),
            reachable_contexts: self.call_graph.reachable().len(),
            nodes: self.pag.node_count(),
            objects: self.objects.len(),
            contexts: self.contexts.len(),
            copy_edges: self.pag.copy_edge_count(),
            field_edges: self.pag.field_edge_count(),
            call_edges: self.call_graph.edge_count(),
            propagations: self.propagations,
            unresolved_calls: self.unresolved.len(),
            method_pags_built: self.pags.built(),
            duration_ms: self.elapsed.as_secs_f64() * 1000.0,
        }
    }
}

fn malformed(method: &MethodSig, what: &str) -> PtaError {
    PtaError::invariant(format!("malformed PAG of {}: {}", method, what))
}
