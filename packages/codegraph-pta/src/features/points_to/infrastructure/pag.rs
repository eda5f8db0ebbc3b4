//! Context-sensitive Pointer Assignment Graph
//!
//! Arena of interned pointer nodes with stable integer ids. Edges reference
//! ids only, so the graph can grow during propagation without ownership
//! cycles.
//!
//! Node keys:
//! - `Var`: (method, local or return slot, context)
//! - `Static`: static field (global, context-insensitive)
//! - `Field`: (abstract object, field), created once the base is known
//!
//! Per node the arena keeps its points-to set and the outgoing edges the
//! solver needs when that set grows: copy successors (optionally type
//! filtered), loads and stores using the node as base, and instance calls
//! using the node as receiver.

use super::points_to_set::PointsToSet;
use crate::errors::{PtaError, PtaResult};
use crate::features::points_to::domain::{
    ContextId, FieldSig, Invoke, Local, MethodSig, ObjectId, TypeName,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

/// Index of a pointer node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Variable slot inside a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarSlot {
    Local(Local),
    Return,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Var {
        method: MethodSig,
        slot: VarSlot,
        ctx: ContextId,
    },
    Static(FieldSig),
    Field {
        object: ObjectId,
        field: FieldSig,
    },
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Var {
                method,
                slot: VarSlot::Local(local),
                ctx,
            } => write!(f, "{}:{}@ctx{}", method, local, ctx.0),
            NodeKey::Var {
                method,
                slot: VarSlot::Return,
                ctx,
            } => write!(f, "{}:ret@ctx{}", method, ctx.0),
            NodeKey::Static(field) => write!(f, "static {}", field),
            NodeKey::Field { object, field } if field.is_array_element() => {
                write!(f, "{}[*]", object)
            }
            NodeKey::Field { object, field } => write!(f, "{}.{}", object, field.name),
        }
    }
}

/// Instance call registered on its receiver node
#[derive(Debug, Clone)]
pub struct ReceiverCall {
    pub caller: MethodSig,
    pub caller_ctx: ContextId,
    pub invoke: Invoke,
}

#[derive(Debug)]
struct NodeData {
    key: NodeKey,
    pts: PointsToSet,
    copy_succs: Vec<(NodeId, Option<TypeName>)>,
    loads: Vec<(FieldSig, NodeId)>,
    stores: Vec<(FieldSig, NodeId)>,
    calls: Vec<ReceiverCall>,
}

impl NodeData {
    fn new(key: NodeKey) -> Self {
        Self {
            key,
            pts: PointsToSet::new(),
            copy_succs: Vec::new(),
            loads: Vec::new(),
            stores: Vec::new(),
            calls: Vec::new(),
        }
    }
}

/// Pointer Assignment Graph of one solver run
#[derive(Debug, Default)]
pub struct Pag {
    nodes: Vec<NodeData>,
    index: FxHashMap<NodeKey, NodeId>,
    copy_edges: FxHashSet<(NodeId, NodeId, Option<TypeName>)>,
    field_edges: FxHashSet<(NodeId, FieldSig, NodeId, bool)>,
    built: FxHashSet<(MethodSig, ContextId)>,
    vars_by_method: FxHashMap<MethodSig, Vec<NodeId>>,
}

impl Pag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the node for `key`.
    ///
    /// Fails if the interning table and the arena disagree.
    pub fn intern(&mut self, key: NodeKey) -> PtaResult<NodeId> {
        if let Some(&id) = self.index.get(&key) {
            return match self.nodes.get(id.index()) {
                Some(data) if data.key == key => Ok(id),
                _ => Err(PtaError::invariant(format!(
                    "node key {} interned as n{} but arena disagrees",
                    key, id.0
                ))),
            };
        }

        let id = NodeId(self.nodes.len() as u32);
        if let NodeKey::Var { method, .. } = &key {
            self.vars_by_method
                .entry(method.clone())
                .or_default()
                .push(id);
        }
        self.nodes.push(NodeData::new(key.clone()));
        self.index.insert(key, id);
        Ok(id)
    }

    #[inline]
    pub fn lookup(&self, key: &NodeKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    pub fn key(&self, id: NodeId) -> Option<&NodeKey> {
        self.nodes.get(id.index()).map(|n| &n.key)
    }

    /// Record that `(method, ctx)` has been built; false if it already was
    pub fn mark_built(&mut self, method: &MethodSig, ctx: ContextId) -> bool {
        self.built.insert((method.clone(), ctx))
    }

    /// Add `from → to`; false if the edge already exists
    pub fn add_copy(&mut self, from: NodeId, to: NodeId, filter: Option<TypeName>) -> bool {
        if !self.copy_edges.insert((from, to, filter.clone())) {
            return false;
        }
        self.nodes[from.index()].copy_succs.push((to, filter));
        true
    }

    /// Add `dst = base.field`; false if already present
    pub fn add_load(&mut self, base: NodeId, field: FieldSig, dst: NodeId) -> bool {
        if !self.field_edges.insert((base, field.clone(), dst, false)) {
            return false;
        }
        self.nodes[base.index()].loads.push((field, dst));
        true
    }

    /// Add `base.field = src`; false if already present
    pub fn add_store(&mut self, base: NodeId, field: FieldSig, src: NodeId) -> bool {
        if !self.field_edges.insert((base, field.clone(), src, true)) {
            return false;
        }
        self.nodes[base.index()].stores.push((field, src));
        true
    }

    pub fn add_receiver_call(&mut self, base: NodeId, call: ReceiverCall) {
        self.nodes[base.index()].calls.push(call);
    }

    #[inline]
    pub fn points_to(&self, id: NodeId) -> &PointsToSet {
        &self.nodes[id.index()].pts
    }

    #[inline]
    pub(crate) fn points_to_mut(&mut self, id: NodeId) -> &mut PointsToSet {
        &mut self.nodes[id.index()].pts
    }

    #[inline]
    pub fn copy_succs(&self, id: NodeId) -> &[(NodeId, Option<TypeName>)] {
        &self.nodes[id.index()].copy_succs
    }

    #[inline]
    pub fn loads(&self, id: NodeId) -> &[(FieldSig, NodeId)] {
        &self.nodes[id.index()].loads
    }

    #[inline]
    pub fn stores(&self, id: NodeId) -> &[(FieldSig, NodeId)] {
        &self.nodes[id.index()].stores
    }

    #[inline]
    pub fn receiver_calls(&self, id: NodeId) -> &[ReceiverCall] {
        &self.nodes[id.index()].calls
    }

    /// Variable nodes of `method`, across all contexts
    pub fn vars_of(&self, method: &MethodSig) -> &[NodeId] {
        self.vars_by_method
            .get(method)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn copy_edge_count(&self) -> usize {
        self.copy_edges.len()
    }

    #[inline]
    pub fn field_edge_count(&self) -> usize {
        self.field_edges.len()
    }

    #[inline]
    pub fn built_count(&self) -> usize {
        self.built.len()
    }
}
