//! Abstract Contexts
//!
//! A context is a bounded string of call sites and/or receiver objects.
//! Which elements end up in it, and how many, is decided entirely by the
//! active [`ContextSelector`](crate::features::points_to::ports::ContextSelector);
//! this module only provides the value type and its interning table.

use super::heap_object::ObjectId;
use super::program::CallSiteId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One element of a context string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContextElement {
    /// Call-site sensitivity
    CallSite(CallSiteId),
    /// Object sensitivity (receiver or allocator object)
    Object(ObjectId),
}

/// Context value, most recent element last
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Context {
    elements: Vec<ContextElement>,
}

impl Context {
    /// The unit context used by context-insensitive analysis
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: impl IntoIterator<Item = ContextElement>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn elements(&self) -> &[ContextElement] {
        &self.elements
    }

    /// Append `element` and keep only the last `k` elements
    pub fn push_limited(&self, element: ContextElement, k: usize) -> Self {
        if k == 0 {
            return Self::empty();
        }
        let keep = self.elements.len().min(k - 1);
        let mut elements = Vec::with_capacity(keep + 1);
        elements.extend_from_slice(&self.elements[self.elements.len() - keep..]);
        elements.push(element);
        Self { elements }
    }

    /// Keep only the last `k` elements
    pub fn truncated(&self, k: usize) -> Self {
        if self.elements.len() <= k {
            return self.clone();
        }
        Self {
            elements: self.elements[self.elements.len() - k..].to_vec(),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match element {
                ContextElement::CallSite(site) => write!(f, "{}", site)?,
                ContextElement::Object(obj) => write!(f, "{}", obj)?,
            }
        }
        f.write_str("]")
    }
}

/// Dense id of an interned [`Context`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u32);

impl ContextId {
    /// The empty context is always interned first
    pub const EMPTY: ContextId = ContextId(0);
}

/// Interning table for contexts (one per solver run)
#[derive(Debug)]
pub struct ContextInterner {
    contexts: Vec<Context>,
    index: FxHashMap<Context, ContextId>,
}

impl Default for ContextInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextInterner {
    pub fn new() -> Self {
        let mut interner = Self {
            contexts: Vec::new(),
            index: FxHashMap::default(),
        };
        interner.intern(Context::empty());
        interner
    }

    /// Get or create the id of `context`
    pub fn intern(&mut self, context: Context) -> ContextId {
        if let Some(&id) = self.index.get(&context) {
            return id;
        }
        let id = ContextId(self.contexts.len() as u32);
        self.contexts.push(context.clone());
        self.index.insert(context, id);
        id
    }

    /// Id of an already interned context
    #[inline]
    pub fn lookup(&self, context: &Context) -> Option<ContextId> {
        self.index.get(context).copied()
    }

    #[inline]
    pub fn get(&self, id: ContextId) -> &Context {
        &self.contexts[id.0 as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
