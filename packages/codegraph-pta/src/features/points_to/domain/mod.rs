//! Domain models for Points-to Analysis
//!
//! Pure data, independent of any solving strategy:
//! - Program: three-address IR handed over by the frontend
//! - Context: bounded call-site/object strings + interning
//! - HeapObject: abstract allocations + interning

pub mod context;
pub mod heap_object;
pub mod program;

pub use context::{Context, ContextElement, ContextId, ContextInterner};
pub use heap_object::{AbstractAlloc, HeapObject, ObjectId, ObjectTable};
pub use program::{
    AllocSite, AllocSiteId, CallSiteId, FieldSig, Invoke, InvokeKind, Local, MethodBody,
    MethodSig, Stmt, TypeName,
};
