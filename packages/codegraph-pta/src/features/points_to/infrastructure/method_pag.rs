//! Method-local Pointer Assignment Graph
//!
//! Context-free translation of one method body into PAG edges, built once per
//! method and instantiated by the solver for every context the method becomes
//! reachable under.
//!
//! Edge kinds:
//! - NEW:    `alloc → x`            (x = new T)
//! - ASSIGN: `y → x`                (x = y, statics, returns)
//! - CAST:   `y → x` filtered by T  (x = (T) y)
//! - LOAD:   `y.f → x`              (x = y.f)
//! - STORE:  `y → x.f`              (x.f = y)
//!
//! Invocations are kept aside: their edges only exist once targets and
//! contexts are known.

use crate::features::points_to::domain::{
    AllocSite, FieldSig, Invoke, Local, MethodBody, MethodSig, Stmt, TypeName,
};
use crate::features::points_to::ports::MethodBodyProvider;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::Arc;

/// Node of a method-local PAG
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PagNode {
    Var(Local),
    /// Synthetic return slot
    Return,
    Alloc(AllocSite),
    FieldRef { base: Local, field: FieldSig },
    Static(FieldSig),
}

impl fmt::Display for PagNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagNode::Var(local) => write!(f, "{}", local),
            PagNode::Return => f.write_str("ret"),
            PagNode::Alloc(site) => write!(f, "{}", site),
            PagNode::FieldRef { base, field } if field.is_array_element() => {
                write!(f, "{}[*]", base)
            }
            PagNode::FieldRef { base, field } => write!(f, "{}.{}", base, field.name),
            PagNode::Static(field) => write!(f, "{}", field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    New,
    Assign,
    Cast(TypeName),
    Load,
    Store,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PagEdge {
    pub kind: EdgeKind,
    pub from: PagNode,
    pub to: PagNode,
}

impl PagEdge {
    #[inline]
    pub fn endpoints(&self) -> (&PagNode, &PagNode) {
        (&self.from, &self.to)
    }
}

/// PAG of a single method body
#[derive(Debug)]
pub struct MethodPag {
    body: Arc<MethodBody>,
    edges: Vec<PagEdge>,
    invokes: Vec<Invoke>,
}

impl MethodPag {
    pub fn build(body: Arc<MethodBody>) -> Self {
        let mut seen: FxHashSet<PagEdge> = FxHashSet::default();
        let mut edges = Vec::new();
        let mut invokes = Vec::new();

        let mut push = |kind: EdgeKind, from: PagNode, to: PagNode| {
            let edge = PagEdge { kind, from, to };
            if seen.insert(edge.clone()) {
                edges.push(edge);
            }
        };

        for stmt in &body.stmts {
            match stmt {
                Stmt::New { dst, site } => {
                    push(EdgeKind::New, PagNode::Alloc(site.clone()), PagNode::Var(*dst))
                }
                Stmt::Assign { dst, src } => {
                    push(EdgeKind::Assign, PagNode::Var(*src), PagNode::Var(*dst))
                }
                Stmt::Cast { dst, src, ty } => push(
                    EdgeKind::Cast(ty.clone()),
                    PagNode::Var(*src),
                    PagNode::Var(*dst),
                ),
                Stmt::Load { dst, base, field } => push(
                    EdgeKind::Load,
                    PagNode::FieldRef {
                        base: *base,
                        field: field.clone(),
                    },
                    PagNode::Var(*dst),
                ),
                Stmt::Store { base, field, src } => push(
                    EdgeKind::Store,
                    PagNode::Var(*src),
                    PagNode::FieldRef {
                        base: *base,
                        field: field.clone(),
                    },
                ),
                Stmt::StaticLoad { dst, field } => push(
                    EdgeKind::Assign,
                    PagNode::Static(field.clone()),
                    PagNode::Var(*dst),
                ),
                Stmt::StaticStore { field, src } => push(
                    EdgeKind::Assign,
                    PagNode::Var(*src),
                    PagNode::Static(field.clone()),
                ),
                Stmt::Return { src } => push(EdgeKind::Assign, PagNode::Var(*src), PagNode::Return),
                Stmt::Invoke(invoke) => invokes.push(invoke.clone()),
            }
        }

        Self {
            body,
            edges,
            invokes,
        }
    }

    #[inline]
    pub fn sig(&self) -> &MethodSig {
        &self.body.sig
    }

    #[inline]
    pub fn body(&self) -> &MethodBody {
        &self.body
    }

    #[inline]
    pub fn this_local(&self) -> Option<Local> {
        self.body.this_local
    }

    /// Local bound to parameter `index`, if it is a reference parameter
    #[inline]
    pub fn param(&self, index: usize) -> Option<Local> {
        self.body.params.get(index).copied().flatten()
    }

    /// Restartable stream over internal edges
    #[inline]
    pub fn edges(&self) -> EdgeStream<'_> {
        EdgeStream {
            edges: &self.edges,
            pos: 0,
        }
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn invokes(&self) -> &[Invoke] {
        &self.invokes
    }
}

/// Lazy reader over a method's edges.
///
/// Cloning yields an independent reader at the same position, so diagnostics
/// can replay edges without copying them.
#[derive(Debug, Clone)]
pub struct EdgeStream<'a> {
    edges: &'a [PagEdge],
    pos: usize,
}

impl<'a> EdgeStream<'a> {
    /// Rewind to the first edge
    pub fn restart(&mut self) {
        self.pos = 0;
    }

    /// `(from, to)` view of the remaining edges
    pub fn pairs(self) -> impl Iterator<Item = (&'a PagNode, &'a PagNode)> {
        self.map(PagEdge::endpoints)
    }
}

impl<'a> Iterator for EdgeStream<'a> {
    type Item = &'a PagEdge;

    fn next(&mut self) -> Option<Self::Item> {
        let edge = self.edges.get(self.pos)?;
        self.pos += 1;
        Some(edge)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.edges.len() - self.pos;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for EdgeStream<'_> {}

/// Per-run cache of method PAGs (one build per method)
pub struct MethodPagCache {
    provider: Arc<dyn MethodBodyProvider>,
    pags: FxHashMap<MethodSig, Option<Arc<MethodPag>>>,
}

impl MethodPagCache {
    pub fn new(provider: Arc<dyn MethodBodyProvider>) -> Self {
        Self {
            provider,
            pags: FxHashMap::default(),
        }
    }

    /// PAG of `method`, building it on first request.
    ///
    /// `None` means the method has no body.
    pub fn get_or_build(&mut self, method: &MethodSig) -> Option<Arc<MethodPag>> {
        if let Some(cached) = self.pags.get(method) {
            return cached.clone();
        }
        let pag = self
            .provider
            .method_body(method)
            .map(|body| Arc::new(MethodPag::build(body)));
        if let Some(ref p) = pag {
            tracing::debug!("method PAG built: {} ({} edges)", method, p.edge_count());
        }
        self.pags.insert(method.clone(), pag.clone());
        pag
    }

    /// Already built PAG of `method`
    #[inline]
    pub fn get(&self, method: &MethodSig) -> Option<Arc<MethodPag>> {
        self.pags.get(method).cloned().flatten()
    }

    /// Number of methods with a built PAG
    pub fn built(&self) -> usize {
        self.pags.values().filter(|p| p.is_some()).count()
    }
}

impl fmt::Debug for MethodPagCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodPagCache")
            .field("methods", &self.pags.len())
            .finish_non_exhaustive()
    }
}
