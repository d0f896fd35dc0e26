//! In-place weight update rules.
//!
//! The update direction convention is fixed by the caller: each rule applies
//! `weight - step(gradient)` for every feature in the gradient.
extern crate hashbrown;
extern crate tune_data;

use self::hashbrown::HashMap;

use self::tune_data::datatypes::FeatureVector;

/// An in-place weight update strategy.  Each updater instance owns its own
/// state and is not shared across optimizer instances.
pub trait UpdateRule {
    /// Applies one gradient step to `weights`
    fn update(&mut self, weights: &mut FeatureVector, gradient: &FeatureVector) -> ();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Update rule variants selectable by configuration
pub enum UpdaterType {
    /// Single scalar learning rate
    Sgd,
    /// Per-feature adaptive learning rate
    AdaGrad,
}

impl UpdaterType {
    /// Resolves a configuration name.  Unrecognized names fall back to Sgd.
    pub fn from_name(name: &str) -> UpdaterType {
        match name {
            "adagrad" => UpdaterType::AdaGrad,
            _ => UpdaterType::Sgd,
        }
    }
}

/// Plain stochastic gradient step with a fixed learning rate
pub struct SgdUpdater {
    rate: f64,
}

impl SgdUpdater {
    /// Returns a new SgdUpdater
    pub fn new(rate: f64) -> SgdUpdater {
        SgdUpdater { rate: rate }
    }
}

impl UpdateRule for SgdUpdater {
    fn update(&mut self, weights: &mut FeatureVector, gradient: &FeatureVector) -> () {
        for (name, value) in gradient.iter() {
            weights.increment(name, -self.rate * value);
        }
    }
}

/// Per-feature adaptive learning rate scaled inversely with the square root
/// of the accumulated squared-gradient history
pub struct AdaGradUpdater {
    rate: f64,
    sum_grad_sq: HashMap<String, f64>,
}

impl AdaGradUpdater {
    /// Returns a new AdaGradUpdater sized for `expected_num_features`
    pub fn new(rate: f64, expected_num_features: usize) -> AdaGradUpdater {
        AdaGradUpdater {
            rate: rate,
            sum_grad_sq: HashMap::with_capacity(expected_num_features),
        }
    }
}

impl UpdateRule for AdaGradUpdater {
    fn update(&mut self, weights: &mut FeatureVector, gradient: &FeatureVector) -> () {
        for (name, value) in gradient.iter() {
            let history = self.sum_grad_sq.entry(name.clone()).or_insert(0.0);
            // The unit offset makes the first step from an empty accumulator
            // identical to a plain SGD step
            let step = self.rate * value / (1.0 + *history).sqrt();
            *history += value * value;
            weights.increment(name, -step);
        }
    }
}
