//! Points-to Sets
//!
//! Sorted, deduplicated vector of object ids. Propagation mostly moves small
//! deltas, so the operations that matter are:
//! - `difference`: the part of an incoming delta that is actually new
//! - `union_with`: merge a delta into a node's set
//!
//! # Performance Characteristics
//! - Insert: O(n) (binary search + shift), fine for small sets
//! - Contains: O(log n)
//! - Union / difference / intersects: O(n + m) merge

use crate::features::points_to::domain::ObjectId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointsToSet {
    elements: Vec<u32>,
}

impl PointsToSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn singleton(obj: ObjectId) -> Self {
        Self {
            elements: vec![obj.0],
        }
    }

    /// Returns true if `obj` was not present
    pub fn insert(&mut self, obj: ObjectId) -> bool {
        match self.elements.binary_search(&obj.0) {
            Ok(_) => false,
            Err(pos) => {
                self.elements.insert(pos, obj.0);
                true
            }
        }
    }

    #[inline]
    pub fn contains(&self, obj: ObjectId) -> bool {
        self.elements.binary_search(&obj.0).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.elements.iter().map(|&e| ObjectId(e))
    }

    pub fn to_vec(&self) -> Vec<ObjectId> {
        self.iter().collect()
    }

    /// Merge `other` into `self`; returns the number of added elements
    pub fn union_with(&mut self, other: &PointsToSet) -> usize {
        if other.is_empty() {
            return 0;
        }
        if self.is_empty() {
            self.elements = other.elements.clone();
            return self.elements.len();
        }

        let before = self.elements.len();
        let mut merged = Vec::with_capacity(before + other.elements.len());
        let (mut i, mut j) = (0, 0);
        while i < self.elements.len() && j < other.elements.len() {
            match self.elements[i].cmp(&other.elements[j]) {
                Ordering::Less => {
                    merged.push(self.elements[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    merged.push(other.elements[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    merged.push(self.elements[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&self.elements[i..]);
        merged.extend_from_slice(&other.elements[j..]);
        self.elements = merged;
        self.elements.len() - before
    }

    /// Elements of `self` that are not in `other`
    pub fn difference(&self, other: &PointsToSet) -> PointsToSet {
        if other.is_empty() {
            return self.clone();
        }
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.elements.len() {
            if j >= other.elements.len() {
                out.extend_from_slice(&self.elements[i..]);
                break;
            }
            match self.elements[i].cmp(&other.elements[j]) {
                Ordering::Less => {
                    out.push(self.elements[i]);
                    i += 1;
                }
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        PointsToSet { elements: out }
    }

    /// Keep only elements matching `pred`
    pub fn filtered(&self, mut pred: impl FnMut(ObjectId) -> bool) -> PointsToSet {
        PointsToSet {
            elements: self
                .elements
                .iter()
                .copied()
                .filter(|&e| pred(ObjectId(e)))
                .collect(),
        }
    }

    pub fn intersects(&self, other: &PointsToSet) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.elements.len() && j < other.elements.len() {
            match self.elements[i].cmp(&other.elements[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => return true,
            }
        }
        false
    }

    pub fn is_subset_of(&self, other: &PointsToSet) -> bool {
        self.len() <= other.len() && self.difference(other).is_empty()
    }
}

impl FromIterator<ObjectId> for PointsToSet {
    fn from_iter<I: IntoIterator<Item = ObjectId>>(iter: I) -> Self {
        let mut elements: Vec<u32> = iter.into_iter().map(|o| o.0).collect();
        elements.sort_unstable();
        elements.dedup();
        Self { elements }
    }
}
