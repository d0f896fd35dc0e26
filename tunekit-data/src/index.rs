//! Shared feature and label indexes.
//!
//! The feature index is the stable bijection between feature names and dense
//! positions that keeps weight vectors and gradients addressable by the same
//! coordinates over the lifetime of an optimizer.  It grows append-only and
//! is shared by reference between the optimizer and its caller.
extern crate hashbrown;

use std::sync::RwLock;

use self::hashbrown::HashMap;

use crate::datatypes::FeatureVector;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Binary class label for ranking examples.  The label set is fixed to
/// exactly these two entries; the positions matter for the classifier.
pub enum Label {
    /// The loser-minus-winner side of a pair
    Negative,
    /// The winner-minus-loser side of a pair
    Positive,
}

impl Label {
    #[inline]
    /// Dense position of the label
    pub fn index(&self) -> usize {
        match self {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }

    /// Class name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Label::Negative => "NEGATIVE",
            Label::Positive => "POSITIVE",
        }
    }
}

#[derive(Default)]
struct Inner {
    positions: HashMap<String, usize>,
    names: Vec<String>,
}

/// Append-only bijection between feature names and dense positions.  First
/// insertion of a new name is serialized behind an internal lock so that
/// concurrent callers never assign the same position twice.
pub struct FeatureIndex {
    inner: RwLock<Inner>,
}

impl FeatureIndex {
    /// Returns an empty index
    pub fn new() -> FeatureIndex {
        FeatureIndex {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Number of indexed features
    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("feature index lock poisoned");
        inner.names.len()
    }

    /// Returns the position for `name`, assigning the next free position if
    /// the name has never been seen.  Positions never change once assigned.
    pub fn add(&self, name: &str) -> usize {
        {
            let inner = self.inner.read().expect("feature index lock poisoned");
            if let Some(position) = inner.positions.get(name) {
                return *position;
            }
        }
        let mut inner = self.inner.write().expect("feature index lock poisoned");
        // Double check: another writer may have inserted between the locks
        if let Some(position) = inner.positions.get(name) {
            return *position;
        }
        let position = inner.names.len();
        inner.names.push(name.to_string());
        inner.positions.insert(name.to_string(), position);
        position
    }

    /// Returns the position for `name` without inserting
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let inner = self.inner.read().expect("feature index lock poisoned");
        inner.positions.get(name).map(|x| *x)
    }

    /// Returns the name stored at `position`
    pub fn name_of(&self, position: usize) -> Option<String> {
        let inner = self.inner.read().expect("feature index lock poisoned");
        inner.names.get(position).map(|x| x.clone())
    }

    /// Projects a sparse vector into a dense array of length `dimension`.
    /// Features without an index, or indexed at or beyond `dimension`, are
    /// dropped.
    pub fn to_dense(&self, vector: &FeatureVector, dimension: usize) -> Vec<f64> {
        let inner = self.inner.read().expect("feature index lock poisoned");
        let mut dense = vec![0.0; dimension];
        for (name, value) in vector.iter() {
            if let Some(position) = inner.positions.get(name) {
                if *position < dimension {
                    dense[*position] = *value;
                }
            }
        }
        dense
    }

    /// Re-expresses a dense array in sparse feature-name form, skipping
    /// exact zeros
    pub fn to_sparse(&self, dense: &[f64]) -> FeatureVector {
        let inner = self.inner.read().expect("feature index lock poisoned");
        let mut out = FeatureVector::new();
        for (position, value) in dense.iter().enumerate() {
            if *value != 0.0 {
                if let Some(name) = inner.names.get(position) {
                    out.set(name, *value);
                }
            }
        }
        out
    }
}
