//! Sparse feature vectors keyed by feature name.
extern crate hashbrown;

use std::fmt::Debug;

use self::hashbrown::{HashMap, HashSet};

#[derive(Clone, Default)]
/// Sparse mapping from feature name to a real value.  Missing features read
/// as zero, so the type doubles as a counter over feature names.
pub struct FeatureVector {
    counts: HashMap<String, f64>,
}

impl FeatureVector {
    /// Returns an empty feature vector
    pub fn new() -> FeatureVector {
        FeatureVector {
            counts: HashMap::new(),
        }
    }

    /// Number of stored features
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no features are stored
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[inline]
    /// Gets the value for a feature, zero if absent
    pub fn get(&self, name: &str) -> f64 {
        self.counts.get(name).map(|x| *x).unwrap_or(0.0)
    }

    #[inline]
    /// Sets the value for a feature
    pub fn set(&mut self, name: &str, value: f64) -> () {
        self.counts.insert(name.to_string(), value);
    }

    #[inline]
    /// Adds `by` to the value for a feature
    pub fn increment(&mut self, name: &str, by: f64) -> () {
        let e = self.counts.entry(name.to_string()).or_insert(0.0);
        *e += by;
    }

    /// Subtracts `other` from this vector in place.  Features present only in
    /// `other` show up negated; zero-valued entries are kept.
    pub fn subtract(&mut self, other: &FeatureVector) -> () {
        for (name, value) in other.counts.iter() {
            let e = self.counts.entry(name.clone()).or_insert(0.0);
            *e -= value;
        }
    }

    /// Returns `self - other` as a new vector
    pub fn difference(&self, other: &FeatureVector) -> FeatureVector {
        let mut out = self.clone();
        out.subtract(other);
        out
    }

    /// Returns the vector with every value negated
    pub fn negated(&self) -> FeatureVector {
        let mut out = self.clone();
        for value in out.counts.values_mut() {
            *value = -*value;
        }
        out
    }

    /// Drops every feature whose name is not in `keys`
    pub fn retain_keys(&mut self, keys: &HashSet<String>) -> () {
        self.counts.retain(|name, _| keys.contains(name));
    }

    /// Iterates over the stored features
    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.counts.iter()
    }

    /// L2 norm of the stored values
    pub fn l2norm(&self) -> f64 {
        let total: f64 = self.counts.values().map(|v| v * v).sum();
        total.sqrt()
    }

    /// Compares two vectors feature by feature within `eps`.  This is
    /// expensive and mainly useful for testing.
    pub fn approx_eq(&self, other: &FeatureVector, eps: f64) -> bool {
        for (name, value) in self.counts.iter() {
            if (value - other.get(name)).abs() > eps {
                return false;
            }
        }
        for (name, value) in other.counts.iter() {
            if (value - self.get(name)).abs() > eps {
                return false;
            }
        }
        true
    }
}

impl Debug for FeatureVector {
    /// Prints the features sorted by name
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut data: Vec<(&String, &f64)> = self.counts.iter().collect();
        data.sort_by_key(|(name, _v)| *name);
        write!(f, "{:?}", data)
    }
}
