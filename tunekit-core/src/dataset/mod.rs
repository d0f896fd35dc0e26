//! Transient training example sets and feature whitelisting.
//!
//! A RankingDataset is a computation artifact: it is rebuilt from scratch
//! inside every gradient call and discarded afterwards.  Feature names are
//! resolved to dense positions through the shared FeatureIndex as examples
//! are added.
extern crate hashbrown;
extern crate tune_data;

use std::sync::Mutex;

use self::hashbrown::{HashMap, HashSet};

use self::tune_data::datatypes::FeatureVector;
use self::tune_data::index::{FeatureIndex, Label};
use self::tune_data::nbest::Hypothesis;

#[derive(Clone, Debug)]
/// One training example in dense index space
pub struct SparseExample {
    /// Feature positions
    pub indices: Vec<usize>,
    /// Feature values
    pub values: Vec<f64>,
}

/// The multiset of signed training examples assembled for one gradient call
pub struct RankingDataset {
    examples: Vec<SparseExample>,
    labels: Vec<Label>,
    num_feature_types: usize,
}

impl RankingDataset {
    /// Returns an empty dataset with room for `size` examples
    pub fn with_capacity(size: usize) -> RankingDataset {
        RankingDataset {
            examples: Vec::with_capacity(size),
            labels: Vec::with_capacity(size),
            num_feature_types: 0,
        }
    }

    /// Adds one example, assigning dense positions to unseen feature names
    pub fn add(&mut self, vector: &FeatureVector, label: Label, index: &FeatureIndex) -> () {
        let mut indices = Vec::with_capacity(vector.len());
        let mut values = Vec::with_capacity(vector.len());
        for (name, value) in vector.iter() {
            let position = index.add(name);
            self.num_feature_types = self.num_feature_types.max(position + 1);
            indices.push(position);
            values.push(*value);
        }
        self.examples.push(SparseExample {
            indices: indices,
            values: values,
        });
        self.labels.push(label);
    }

    /// Number of examples
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Whether the dataset holds no examples
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Size of the dense coordinate space spanned by the examples
    pub fn num_feature_types(&self) -> usize {
        self.num_feature_types
    }

    /// Iterates over examples with their labels
    pub fn iter(&self) -> impl Iterator<Item = (&SparseExample, Label)> {
        self.examples.iter().zip(self.labels.iter().map(|x| *x))
    }
}

/// Cumulative per-feature support counts used to filter sparse features.
///
/// A feature becomes eligible for training once it has been observed in
/// enough distinct tuning instances.  Counts persist across calls, so the
/// whitelist grows as tuning progresses; the interior lock lets concurrent
/// gradient calls share one whitelist.
pub struct FeatureWhitelist {
    counts: Mutex<HashMap<String, usize>>,
}

impl FeatureWhitelist {
    /// Returns an empty whitelist
    pub fn new() -> FeatureWhitelist {
        FeatureWhitelist {
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// Folds a batch of n-best lists into the running counts, counting each
    /// feature at most once per instance, and returns the names currently at
    /// or above `min_segment_count`.
    pub fn observe(
        &self,
        translation_lists: &[&[Hypothesis]],
        min_segment_count: usize,
    ) -> HashSet<String> {
        let mut counts = self.counts.lock().expect("whitelist lock poisoned");
        for translations in translation_lists.iter() {
            let mut seen: HashSet<&str> = HashSet::new();
            for hypothesis in translations.iter() {
                for (name, _value) in hypothesis.features.iter() {
                    seen.insert(name);
                }
            }
            for name in seen {
                let e = counts.entry(name.to_string()).or_insert(0);
                *e += 1;
            }
        }
        counts
            .iter()
            .filter(|(_name, count)| **count >= min_segment_count)
            .map(|(name, _count)| name.clone())
            .collect()
    }

    /// Number of distinct features counted so far
    pub fn len(&self) -> usize {
        let counts = self.counts.lock().expect("whitelist lock poisoned");
        counts.len()
    }
}
