//! N-best lists and tuning instances.
use crate::datatypes::FeatureVector;

/// A decoded token sequence
pub type Tokens = Vec<String>;

#[derive(Clone, Debug)]
/// One entry of an n-best list: a candidate translation with its sparse
/// feature vector and the decoder's model score
pub struct Hypothesis {
    /// Decoded output tokens
    pub translation: Tokens,
    /// Sparse feature vector extracted by the decoder
    pub features: FeatureVector,
    /// Model score under the weights the list was decoded with
    pub score: f64,
}

impl Hypothesis {
    /// Returns a new Hypothesis
    pub fn new(translation: Tokens, features: FeatureVector, score: f64) -> Hypothesis {
        Hypothesis {
            translation: translation,
            features: features,
            score: score,
        }
    }
}

#[derive(Clone, Debug)]
/// One tuning instance: a source sentence with its n-best candidates and
/// reference translations.  Read-only to the optimizer.
pub struct TuningInstance {
    /// Caller-assigned source sentence id; not required to be contiguous
    pub source_id: usize,
    /// Source sentence tokens
    pub source: Tokens,
    /// Ordered n-best candidate list
    pub hypotheses: Vec<Hypothesis>,
    /// Reference translations
    pub references: Vec<Tokens>,
}
