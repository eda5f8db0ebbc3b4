//! Heap Abstraction Policies
//!
//! - [`AllocSiteAbstractor`]: one abstract object per syntactic `new`
//! - [`HeuristicAbstractor`]: collapse every site of selected types into a
//!   single object per type, bounding object counts for types that are
//!   allocated all over the program (strings, builders, exceptions)
//!
//! The merge key of the heuristic abstractor is the declared type itself,
//! so two sites of different types can never share an abstract object.

use crate::features::points_to::domain::{AbstractAlloc, AllocSite, Context, MethodBody, TypeName};
use crate::features::points_to::ports::HeapAbstractor;
use rustc_hash::{FxHashMap, FxHashSet};

/// Allocation-site abstraction (ignores context)
#[derive(Debug, Default, Clone, Copy)]
pub struct AllocSiteAbstractor;

impl HeapAbstractor for AllocSiteAbstractor {
    #[inline]
    fn abstract_object(&self, site: &AllocSite, _context: &Context) -> AbstractAlloc {
        AbstractAlloc::Site(site.id)
    }
}

/// Type-based merging for selected types
#[derive(Debug, Clone, Default)]
pub struct HeuristicAbstractor {
    merged: FxHashSet<TypeName>,
}

impl HeuristicAbstractor {
    /// Merge exactly the given types
    pub fn new(merge_types: impl IntoIterator<Item = TypeName>) -> Self {
        Self {
            merged: merge_types.into_iter().collect(),
        }
    }

    /// Merge `merge_types` plus every type allocated at more than
    /// `site_threshold` distinct sites in `bodies`.
    pub fn from_bodies<'a>(
        bodies: impl IntoIterator<Item = &'a MethodBody>,
        site_threshold: usize,
        merge_types: impl IntoIterator<Item = TypeName>,
    ) -> Self {
        let mut sites_per_type: FxHashMap<TypeName, FxHashSet<u32>> = FxHashMap::default();
        for body in bodies {
            for site in body.alloc_sites() {
                sites_per_type
                    .entry(site.ty.clone())
                    .or_default()
                    .insert(site.id.0);
            }
        }

        let mut merged: FxHashSet<TypeName> = merge_types.into_iter().collect();
        merged.extend(
            sites_per_type
                .into_iter()
                .filter(|(_, sites)| sites.len() > site_threshold)
                .map(|(ty, _)| ty),
        );
        Self { merged }
    }

    #[inline]
    pub fn is_merged(&self, ty: &TypeName) -> bool {
        self.merged.contains(ty)
    }

    pub fn merged_types(&self) -> impl Iterator<Item = &TypeName> {
        self.merged.iter()
    }
}

impl HeapAbstractor for HeuristicAbstractor {
    fn abstract_object(&self, site: &AllocSite, _context: &Context) -> AbstractAlloc {
        if self.merged.contains(&site.ty) {
            AbstractAlloc::Merged(site.ty.clone())
        } else {
            AbstractAlloc::Site(site.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::points_to::domain::{Local, MethodSig, Stmt};

    fn body_with_sites(sites: &[(u32, &str)]) -> MethodBody {
        let mut body = MethodBody::new(MethodSig::new("Main", "main()"));
        for (i, (id, ty)) in sites.iter().enumerate() {
            body.stmts.push(Stmt::New {
                dst: Local(i as u32),
                site: AllocSite::new(*id, *ty),
            });
        }
        body
    }

    #[test]
    fn test_alloc_site_is_one_per_site() {
        let abst = AllocSiteAbstractor;
        let a = abst.abstract_object(&AllocSite::new(1, "A"), &Context::empty());
        let b = abst.abstract_object(&AllocSite::new(2, "A"), &Context::empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_explicit_merge_types() {
        let abst = HeuristicAbstractor::new([TypeName::new("java.lang.StringBuilder")]);
        let a = abst.abstract_object(&AllocSite::new(1, "java.lang.StringBuilder"), &Context::empty());
        let b = abst.abstract_object(&AllocSite::new(2, "java.lang.StringBuilder"), &Context::empty());
        let c = abst.abstract_object(&AllocSite::new(3, "A"), &Context::empty());
        assert_eq!(a, b);
        assert_eq!(c, AbstractAlloc::Site(crate::features::points_to::domain::AllocSiteId(3)));
    }

    #[test]
    fn test_threshold_merge_never_crosses_types() {
        let body = body_with_sites(&[(1, "A"), (2, "A"), (3, "A"), (4, "B"), (5, "B"), (6, "B")]);
        let abst = HeuristicAbstractor::from_bodies([&body], 2, Vec::new());
        assert!(abst.is_merged(&TypeName::new("A")));
        assert!(abst.is_merged(&TypeName::new("B")));

        let a = abst.abstract_object(&AllocSite::new(1, "A"), &Context::empty());
        let b = abst.abstract_object(&AllocSite::new(4, "B"), &Context::empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_below_threshold_stays_per_site() {
        let body = body_with_sites(&[(1, "A"), (2, "A")]);
        let abst = HeuristicAbstractor::from_bodies([&body], 2, Vec::new());
        assert!(!abst.is_merged(&TypeName::new("A")));
    }
}
