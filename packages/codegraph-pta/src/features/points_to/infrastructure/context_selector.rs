//! Context Selection Policies
//!
//! - [`InsensitiveSelector`]: everything under the empty context (pre-analysis)
//! - [`KCallSiteSelector`]: k-limited call strings (k-CFA)
//! - [`KObjectSelector`]: k-limited receiver-object strings
//! - [`HeuristicSelector`]: empty context for ignored (library) types, defers otherwise
//! - [`PartialMethodLevelSelector`]: applies an inner selector only to a fixed
//!   method set (the precision-critical methods), empty context elsewhere
//! - [`PipelineSelector`]: first selector's answer unless it defers
//!
//! `k` bounds method contexts, `hk` bounds heap contexts. Heap contexts are
//! always a suffix of the allocating method's context.
//!
//! # References
//! - Milanova et al. "Parameterized Object Sensitivity" (TOSEM 2005)
//! - Smaragdakis et al. "Pick Your Contexts Well" (POPL 2011)
//! - Li et al. "Precision-Guided Context Sensitivity for Pointer Analysis" (OOPSLA 2018)

use crate::features::points_to::domain::{Context, ContextElement, MethodSig, TypeName};
use crate::features::points_to::ports::{
    AllocSiteInfo, CallSiteInfo, ClassHierarchy, ContextSelector, Selection,
};
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;

/// Context-insensitive policy
#[derive(Debug, Default, Clone, Copy)]
pub struct InsensitiveSelector;

impl ContextSelector for InsensitiveSelector {
    fn select_context(&self, _call: &CallSiteInfo<'_>, _callee: &MethodSig) -> Selection {
        Selection::Context(Context::empty())
    }

    fn select_heap_context(&self, _alloc: &AllocSiteInfo<'_>) -> Selection {
        Selection::Context(Context::empty())
    }
}

/// k-call-site sensitivity with hk-limited heap contexts
#[derive(Debug, Clone, Copy)]
pub struct KCallSiteSelector {
    pub k: usize,
    pub hk: usize,
}

impl KCallSiteSelector {
    pub fn new(k: usize, hk: usize) -> Self {
        Self { k, hk }
    }
}

impl ContextSelector for KCallSiteSelector {
    fn select_context(&self, call: &CallSiteInfo<'_>, _callee: &MethodSig) -> Selection {
        Selection::Context(
            call.caller_context
                .push_limited(ContextElement::CallSite(call.site), self.k),
        )
    }

    fn select_heap_context(&self, alloc: &AllocSiteInfo<'_>) -> Selection {
        Selection::Context(alloc.enclosing_context.truncated(self.hk))
    }
}

/// k-object sensitivity with hk-limited heap contexts
#[derive(Debug, Clone, Copy)]
pub struct KObjectSelector {
    pub k: usize,
    pub hk: usize,
}

impl KObjectSelector {
    pub fn new(k: usize, hk: usize) -> Self {
        Self { k, hk }
    }
}

impl ContextSelector for KObjectSelector {
    fn select_context(&self, call: &CallSiteInfo<'_>, _callee: &MethodSig) -> Selection {
        match call.receiver {
            Some(receiver) => Selection::Context(
                receiver
                    .heap_context
                    .push_limited(ContextElement::Object(receiver.object), self.k),
            ),
            // Static calls carry the caller's receiver string along
            None => Selection::Context(call.caller_context.truncated(self.k)),
        }
    }

    fn select_heap_context(&self, alloc: &AllocSiteInfo<'_>) -> Selection {
        Selection::Context(alloc.enclosing_context.truncated(self.hk))
    }
}

/// Forces the empty context for ignored types, defers for everything else
pub struct HeuristicSelector {
    hierarchy: Arc<dyn ClassHierarchy>,
    ignored_prefixes: Vec<String>,
}

impl HeuristicSelector {
    pub fn new(hierarchy: Arc<dyn ClassHierarchy>, ignored_prefixes: Vec<String>) -> Self {
        Self {
            hierarchy,
            ignored_prefixes,
        }
    }

    /// Library type, or name under a configured prefix
    pub fn is_ignored(&self, ty: &TypeName) -> bool {
        self.hierarchy.is_library(ty)
            || self
                .ignored_prefixes
                .iter()
                .any(|prefix| ty.as_str().starts_with(prefix.as_str()))
    }
}

impl fmt::Debug for HeuristicSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeuristicSelector")
            .field("ignored_prefixes", &self.ignored_prefixes)
            .finish_non_exhaustive()
    }
}

impl ContextSelector for HeuristicSelector {
    fn select_context(&self, _call: &CallSiteInfo<'_>, callee: &MethodSig) -> Selection {
        if self.is_ignored(&callee.class) {
            Selection::Context(Context::empty())
        } else {
            Selection::Defer
        }
    }

    fn select_heap_context(&self, alloc: &AllocSiteInfo<'_>) -> Selection {
        if self.is_ignored(&alloc.site.ty) {
            Selection::Context(Context::empty())
        } else {
            Selection::Defer
        }
    }
}

/// Method-level selective context sensitivity
#[derive(Debug, Clone)]
pub struct PartialMethodLevelSelector {
    inner: Arc<dyn ContextSelector>,
    methods: Arc<FxHashSet<MethodSig>>,
}

impl PartialMethodLevelSelector {
    pub fn new(inner: Arc<dyn ContextSelector>, methods: Arc<FxHashSet<MethodSig>>) -> Self {
        Self { inner, methods }
    }

    #[inline]
    pub fn is_selected(&self, method: &MethodSig) -> bool {
        self.methods.contains(method)
    }
}

impl ContextSelector for PartialMethodLevelSelector {
    fn select_context(&self, call: &CallSiteInfo<'_>, callee: &MethodSig) -> Selection {
        if self.is_selected(callee) {
            self.inner.select_context(call, callee)
        } else {
            Selection::Context(Context::empty())
        }
    }

    fn select_heap_context(&self, alloc: &AllocSiteInfo<'_>) -> Selection {
        if self.is_selected(alloc.method) {
            self.inner.select_heap_context(alloc)
        } else {
            Selection::Context(Context::empty())
        }
    }
}

/// Chains two selectors by delegation
#[derive(Debug, Clone)]
pub struct PipelineSelector {
    first: Arc<dyn ContextSelector>,
    second: Arc<dyn ContextSelector>,
}

impl PipelineSelector {
    pub fn new(first: Arc<dyn ContextSelector>, second: Arc<dyn ContextSelector>) -> Self {
        Self { first, second }
    }
}

impl ContextSelector for PipelineSelector {
    fn select_context(&self, call: &CallSiteInfo<'_>, callee: &MethodSig) -> Selection {
        self.first
            .select_context(call, callee)
            .or_else(|| self.second.select_context(call, callee))
    }

    fn select_heap_context(&self, alloc: &AllocSiteInfo<'_>) -> Selection {
        self.first
            .select_heap_context(alloc)
            .or_else(|| self.second.select_heap_context(alloc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::points_to::domain::{AllocSite, CallSiteId, ObjectId};
    use crate::features::points_to::ports::ReceiverInfo;

    #[derive(Debug)]
    struct LibraryOracle;

    impl ClassHierarchy for LibraryOracle {
        fn resolve_method(&self, method: &MethodSig) -> Option<MethodSig> {
            Some(method.clone())
        }
        fn dispatch(&self, _runtime_type: &TypeName, method: &MethodSig) -> Option<MethodSig> {
            Some(method.clone())
        }
        fn is_subtype(&self, sub: &TypeName, sup: &TypeName) -> bool {
            sub == sup
        }
        fn is_library(&self, ty: &TypeName) -> bool {
            ty.as_str() == "lib.Vector"
        }
    }

    fn call<'a>(caller: &'a MethodSig, ctx: &'a Context, site: u32) -> CallSiteInfo<'a> {
        CallSiteInfo {
            site: CallSiteId(site),
            caller,
            caller_context: ctx,
            receiver: None,
        }
    }

    #[test]
    fn test_call_site_string_is_k_limited() {
        let sel = KCallSiteSelector::new(2, 1);
        let caller = MethodSig::new("Main", "main()");
        let callee = MethodSig::new("A", "foo()");

        let ctx1 = sel.select_context(&call(&caller, &Context::empty(), 1), &callee).resolve();
        let ctx2 = sel.select_context(&call(&caller, &ctx1, 2), &callee).resolve();
        let ctx3 = sel.select_context(&call(&caller, &ctx2, 3), &callee).resolve();

        assert_eq!(
            ctx3.elements(),
            &[
                ContextElement::CallSite(CallSiteId(2)),
                ContextElement::CallSite(CallSiteId(3))
            ]
        );
    }

    #[test]
    fn test_object_selector_uses_receiver() {
        let sel = KObjectSelector::new(2, 1);
        let caller = MethodSig::new("Main", "main()");
        let callee = MethodSig::new("A", "foo()");
        let ty = TypeName::new("A");
        let heap_ctx = Context::from_elements([ContextElement::Object(ObjectId(1))]);
        let empty = Context::empty();

        let info = CallSiteInfo {
            receiver: Some(ReceiverInfo {
                object: ObjectId(2),
                ty: &ty,
                heap_context: &heap_ctx,
            }),
            ..call(&caller, &empty, 9)
        };
        let ctx = sel.select_context(&info, &callee).resolve();
        assert_eq!(
            ctx.elements(),
            &[ContextElement::Object(ObjectId(1)), ContextElement::Object(ObjectId(2))]
        );

        let site = AllocSite::new(1, "B");
        let heap = sel
            .select_heap_context(&AllocSiteInfo {
                site: &site,
                method: &callee,
                enclosing_context: &ctx,
            })
            .resolve();
        assert_eq!(heap.elements(), &[ContextElement::Object(ObjectId(2))]);
    }

    #[test]
    fn test_partial_selector_only_for_selected_methods() {
        let selected = MethodSig::new("A", "critical()");
        let other = MethodSig::new("A", "plain()");
        let methods: FxHashSet<MethodSig> = [selected.clone()].into_iter().collect();
        let sel = PartialMethodLevelSelector::new(Arc::new(KCallSiteSelector::new(1, 0)), Arc::new(methods));

        let caller = MethodSig::new("Main", "main()");
        let empty = Context::empty();
        assert_eq!(sel.select_context(&call(&caller, &empty, 4), &selected).resolve().depth(), 1);
        assert!(sel.select_context(&call(&caller, &empty, 4), &other).resolve().is_empty());
    }

    #[test]
    fn test_pipeline_defers_to_second() {
        let heuristic = HeuristicSelector::new(Arc::new(LibraryOracle), vec!["java.".to_string()]);
        let sel = PipelineSelector::new(Arc::new(heuristic), Arc::new(KCallSiteSelector::new(1, 0)));

        let caller = MethodSig::new("Main", "main()");
        let empty = Context::empty();

        let library = MethodSig::new("lib.Vector", "add(java.lang.Object)");
        let jdk = MethodSig::new("java.util.ArrayList", "add(java.lang.Object)");
        let app = MethodSig::new("app.Foo", "bar()");

        assert!(sel.select_context(&call(&caller, &empty, 1), &library).resolve().is_empty());
        assert!(sel.select_context(&call(&caller, &empty, 1), &jdk).resolve().is_empty());
        assert_eq!(sel.select_context(&call(&caller, &empty, 1), &app).resolve().depth(), 1);
    }

    #[test]
    fn test_heuristic_alone_defers() {
        let heuristic = HeuristicSelector::new(Arc::new(LibraryOracle), vec![]);
        let caller = MethodSig::new("Main", "main()");
        let app = MethodSig::new("app.Foo", "bar()");
        assert_eq!(
            heuristic.select_context(&call(&caller, &Context::empty(), 1), &app),
            Selection::Defer
        );
    }
}
