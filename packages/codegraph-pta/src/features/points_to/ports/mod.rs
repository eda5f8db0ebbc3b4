//! Ports (Interfaces) for Points-to Analysis
//!
//! Two kinds of seams:
//! - **Upstream collaborators**: [`MethodBodyProvider`] and [`ClassHierarchy`]
//!   are implemented by the frontend (or by the in-memory
//!   [`Program`](crate::features::points_to::infrastructure::Program)).
//! - **Pluggable policies**: [`ContextSelector`] and [`HeapAbstractor`] decide
//!   how much context and heap precision the solver spends. Policies are
//!   composed by delegation (see `PipelineSelector`), never by subclassing.
//!
//! All traits are object-safe and `Send + Sync` so a run can hold them as
//! `Arc<dyn ...>` and share the immutable inputs between pipeline stages.

use crate::features::points_to::domain::{
    AbstractAlloc, AllocSite, CallSiteId, Context, MethodBody, MethodSig, ObjectId, TypeName,
};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Upstream collaborators
// ============================================================================

/// Source of method bodies
pub trait MethodBodyProvider: Send + Sync {
    /// Body of `method`, or `None` for abstract/native methods.
    ///
    /// Methods without a body are boundary calls: they can be reachable but
    /// contribute no internal propagation.
    fn method_body(&self, method: &MethodSig) -> Option<Arc<MethodBody>>;
}

/// Type/class hierarchy oracle
pub trait ClassHierarchy: Send + Sync {
    /// Resolve a static method reference to the declaration it names
    /// (walking superclasses). `None` when the reference is unknown.
    fn resolve_method(&self, method: &MethodSig) -> Option<MethodSig>;

    /// Implementation selected by virtual dispatch of `method` on an object
    /// of `runtime_type`. `None` when nothing concrete is found.
    fn dispatch(&self, runtime_type: &TypeName, method: &MethodSig) -> Option<MethodSig>;

    /// Reflexive, transitive subtype test
    fn is_subtype(&self, sub: &TypeName, sup: &TypeName) -> bool;

    /// Library types are candidates for forced context insensitivity
    fn is_library(&self, _ty: &TypeName) -> bool {
        false
    }
}

// ============================================================================
// Context selection
// ============================================================================

/// Answer of a [`ContextSelector`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Use this context
    Context(Context),
    /// No opinion; let the next selector in a pipeline decide
    Defer,
}

impl Selection {
    /// Fall back to `other` when this selection defers
    #[inline]
    pub fn or_else(self, other: impl FnOnce() -> Selection) -> Selection {
        match self {
            Selection::Defer => other(),
            chosen => chosen,
        }
    }

    /// Final context; a deferral that reaches the solver means "no context"
    #[inline]
    pub fn resolve(self) -> Context {
        match self {
            Selection::Context(ctx) => ctx,
            Selection::Defer => Context::empty(),
        }
    }
}

/// Receiver object of an instance call
#[derive(Debug, Clone, Copy)]
pub struct ReceiverInfo<'a> {
    pub object: ObjectId,
    pub ty: &'a TypeName,
    /// Heap context the receiver was allocated under
    pub heap_context: &'a Context,
}

/// Call edge being resolved
#[derive(Debug, Clone, Copy)]
pub struct CallSiteInfo<'a> {
    pub site: CallSiteId,
    pub caller: &'a MethodSig,
    pub caller_context: &'a Context,
    /// `None` for static calls
    pub receiver: Option<ReceiverInfo<'a>>,
}

/// Allocation being abstracted
#[derive(Debug, Clone, Copy)]
pub struct AllocSiteInfo<'a> {
    pub site: &'a AllocSite,
    /// Method containing the `new`
    pub method: &'a MethodSig,
    /// Context the containing method is analyzed under
    pub enclosing_context: &'a Context,
}

/// Context sensitivity policy
pub trait ContextSelector: Send + Sync + fmt::Debug {
    /// Context under which `callee` is analyzed for this call edge
    fn select_context(&self, call: &CallSiteInfo<'_>, callee: &MethodSig) -> Selection;

    /// Heap context attached to an object allocated at `alloc`
    fn select_heap_context(&self, alloc: &AllocSiteInfo<'_>) -> Selection;
}

// ============================================================================
// Heap abstraction
// ============================================================================

/// Heap abstraction policy.
///
/// Must be a pure function of its inputs for the whole run, and must never
/// map sites of different declared types to the same abstract allocation.
pub trait HeapAbstractor: Send + Sync + fmt::Debug {
    fn abstract_object(&self, site: &AllocSite, context: &Context) -> AbstractAlloc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::points_to::domain::ContextElement;

    #[test]
    fn test_selection_fallback() {
        let ctx = Context::from_elements([ContextElement::CallSite(CallSiteId(1))]);

        let chosen = Selection::Context(ctx.clone()).or_else(|| Selection::Context(Context::empty()));
        assert_eq!(chosen.resolve(), ctx);

        let deferred = Selection::Defer.or_else(|| Selection::Context(ctx.clone()));
        assert_eq!(deferred.resolve(), ctx);

        assert!(Selection::Defer.resolve().is_empty());
    }
}
