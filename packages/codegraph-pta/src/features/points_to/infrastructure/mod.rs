//! Infrastructure layer for Points-to Analysis
//!
//! - **PointsToSet**: sorted-vector sets with delta operations
//! - **HeapAbstractor**: allocation-site and type-merging abstractions
//! - **ContextSelector**: k-call-site, k-object, heuristic, partial and pipeline policies
//! - **MethodPag**: per-method PAG with a restartable edge stream
//! - **Pag**: context-sensitive node arena
//! - **PropagationSolver**: worklist fixpoint with on-the-fly call graph
//! - **Program**: in-memory class set implementing the upstream ports

pub mod call_graph;
pub mod cancellation;
pub mod context_selector;
pub mod heap_abstractor;
pub mod in_memory_program;
pub mod method_pag;
pub mod pag;
pub mod points_to_set;
pub mod solver;

pub use call_graph::{CallEdge, CallGraph};
pub use cancellation::CancellationToken;
pub use context_selector::{
    HeuristicSelector, InsensitiveSelector, KCallSiteSelector, KObjectSelector,
    PartialMethodLevelSelector, PipelineSelector,
};
pub use heap_abstractor::{AllocSiteAbstractor, HeuristicAbstractor};
pub use in_memory_program::{
    ClassDecl, MethodBuilder, MethodKind, MethodSpec, Program, ProgramBuilder, ProgramSpec,
};
pub use method_pag::{EdgeKind, EdgeStream, MethodPag, MethodPagCache, PagEdge, PagNode};
pub use pag::{NodeId, NodeKey, Pag, VarSlot};
pub use points_to_set::PointsToSet;
pub use solver::{PropagationSolver, RunStats, SolverState};
