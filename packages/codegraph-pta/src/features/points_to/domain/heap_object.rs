//! Abstract Heap Objects
//!
//! Concrete heap addresses are abstracted in two steps:
//! 1. the [`HeapAbstractor`](crate::features::points_to::ports::HeapAbstractor)
//!    maps an allocation site to an [`AbstractAlloc`] (one per site, or one per
//!    merged type),
//! 2. the pair (abstract allocation, heap context) is interned to a dense
//!    [`ObjectId`] that points-to sets store.
//!
//! ```text
//! // Line 10: x = new A()   → alloc:1:A
//! // Line 20: y = new A()   → alloc:2:A   (different site, different object)
//! // merged heap:           → merged:A    (both sites, one object)
//! ```

use super::context::ContextId;
use super::program::{AllocSiteId, MethodSig, TypeName};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense id of an abstract heap object within one solver run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o{}", self.0)
    }
}

/// Output of the heap abstraction policy
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbstractAlloc {
    /// One object per syntactic allocation site
    Site(AllocSiteId),
    /// All sites of this type collapsed into one object
    Merged(TypeName),
}

impl AbstractAlloc {
    #[inline]
    pub fn is_merged(&self) -> bool {
        matches!(self, AbstractAlloc::Merged(_))
    }
}

impl fmt::Display for AbstractAlloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbstractAlloc::Site(site) => write!(f, "alloc:{}", site.0),
            AbstractAlloc::Merged(ty) => write!(f, "merged:{}", ty),
        }
    }
}

/// Abstract heap object (allocation + heap context)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeapObject {
    pub id: ObjectId,
    pub alloc: AbstractAlloc,
    /// Runtime type, used for dispatch and cast filtering
    pub ty: TypeName,
    pub context: ContextId,
    /// Method containing the allocation (first one seen for merged objects)
    pub method: MethodSig,
}

impl fmt::Display for HeapObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@ctx{}", self.alloc, self.ty, self.context.0)
    }
}

/// Interning table for heap objects (one per solver run)
#[derive(Debug, Default)]
pub struct ObjectTable {
    objects: Vec<HeapObject>,
    index: FxHashMap<(AbstractAlloc, ContextId), ObjectId>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the object for `(alloc, context)`.
    ///
    /// Returns the id and whether it was newly created.
    pub fn intern(
        &mut self,
        alloc: AbstractAlloc,
        ty: &TypeName,
        context: ContextId,
        method: &MethodSig,
    ) -> (ObjectId, bool) {
        if let Some(&id) = self.index.get(&(alloc.clone(), context)) {
            return (id, false);
        }
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(HeapObject {
            id,
            alloc: alloc.clone(),
            ty: ty.clone(),
            context,
            method: method.clone(),
        });
        self.index.insert((alloc, context), id);
        (id, true)
    }

    #[inline]
    pub fn get(&self, id: ObjectId) -> Option<&HeapObject> {
        self.objects.get(id.0 as usize)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeapObject> {
        self.objects.iter()
    }
}
