//! The regularized logistic objective.
//!
//! Binary logistic negative log-likelihood over a ranking dataset, with an
//! optional log-prior on the weights.  The optimizer only ever evaluates the
//! gradient; the value is exposed for testing the gradient against finite
//! differences.
extern crate tune_data;

use self::tune_data::intrinsics::{axpy, dot, sparse_axpy, sparse_dot};

use crate::dataset::RankingDataset;

#[derive(Clone, Copy, Debug)]
/// Log-prior over the weight vector
pub enum LogPrior {
    /// No regularization
    None,
    /// Gaussian (quadratic) prior with the given variance
    Gaussian {
        /// Prior variance
        sigma_sq: f64,
    },
}

/// Binary logistic regression objective over a dataset
pub struct LogisticObjective<'a> {
    dataset: &'a RankingDataset,
    dimension: usize,
    prior: LogPrior,
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[inline]
fn softplus(x: f64) -> f64 {
    // log(1 + e^x) without overflow for large |x|
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

impl<'a> LogisticObjective<'a> {
    /// Returns a new objective over `dataset` in a `dimension`-sized
    /// coordinate space
    pub fn new(
        dataset: &'a RankingDataset,
        dimension: usize,
        prior: LogPrior,
    ) -> LogisticObjective<'a> {
        assert!(dataset.num_feature_types() <= dimension);
        LogisticObjective {
            dataset: dataset,
            dimension: dimension,
            prior: prior,
        }
    }

    /// Negative log-likelihood plus the prior term at `w`
    pub fn value_at(&self, w: &[f64]) -> f64 {
        assert_eq!(w.len(), self.dimension);
        let mut value = 0.0;
        for (example, label) in self.dataset.iter() {
            let margin = sparse_dot(&example.indices, &example.values, w);
            value += softplus(margin) - label.index() as f64 * margin;
        }
        match self.prior {
            LogPrior::None => (),
            LogPrior::Gaussian { sigma_sq } => value += dot(w, w) / (2.0 * sigma_sq),
        }
        value
    }

    /// Gradient of the objective at `w`
    pub fn gradient_at(&self, w: &[f64]) -> Vec<f64> {
        assert_eq!(w.len(), self.dimension);
        let mut gradient = vec![0.0; self.dimension];
        for (example, label) in self.dataset.iter() {
            let margin = sparse_dot(&example.indices, &example.values, w);
            let residual = sigmoid(margin) - label.index() as f64;
            sparse_axpy(residual, &example.indices, &example.values, &mut gradient);
        }
        if let LogPrior::Gaussian { sigma_sq } = self.prior {
            axpy(1.0 / sigma_sq, w, &mut gradient);
        }
        gradient
    }
}

#[cfg(test)]
mod tests {
    extern crate tune_data;

    use self::tune_data::datatypes::FeatureVector;
    use self::tune_data::index::{FeatureIndex, Label};

    use super::*;

    fn vector(fs: &[(&str, f64)]) -> FeatureVector {
        let mut fv = FeatureVector::new();
        for (name, value) in fs.iter() {
            fv.set(name, *value);
        }
        fv
    }

    fn small_dataset(index: &FeatureIndex) -> RankingDataset {
        let mut dataset = RankingDataset::with_capacity(4);
        let gt = vector(&[("lm", 1.0), ("tm", -0.5)]);
        dataset.add(&gt, Label::Positive, index);
        dataset.add(&gt.negated(), Label::Negative, index);
        let gt = vector(&[("tm", 2.0)]);
        dataset.add(&gt, Label::Positive, index);
        dataset.add(&gt.negated(), Label::Negative, index);
        dataset
    }

    #[test]
    fn test_sigmoid_and_softplus_stability() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(800.0) <= 1.0);
        assert!((softplus(0.0) - (2f64).ln()).abs() < 1e-12);
        assert!((softplus(800.0) - 800.0).abs() < 1e-9);
        assert!(softplus(-800.0) >= 0.0);
    }

    #[test]
    fn test_gradient_at_zero_weights() {
        // At w = 0 every sigmoid is 0.5, so each signed example pair
        // contributes (0.5 - 1) x + (0.5 - 0)(-x) = -x
        let index = FeatureIndex::new();
        let dataset = small_dataset(&index);
        let objective = LogisticObjective::new(&dataset, 2, LogPrior::None);
        let g = objective.gradient_at(&[0.0, 0.0]);
        let lm = index.index_of("lm").unwrap();
        let tm = index.index_of("tm").unwrap();
        assert!((g[lm] - -1.0).abs() < 1e-12);
        assert!((g[tm] - -1.5).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let index = FeatureIndex::new();
        let dataset = small_dataset(&index);
        let objective =
            LogisticObjective::new(&dataset, 2, LogPrior::Gaussian { sigma_sq: 0.25 });
        let w = vec![0.3, -0.7];
        let g = objective.gradient_at(&w);
        let eps = 1e-6;
        for i in 0..w.len() {
            let mut hi = w.clone();
            hi[i] += eps;
            let mut lo = w.clone();
            lo[i] -= eps;
            let numeric = (objective.value_at(&hi) - objective.value_at(&lo)) / (2.0 * eps);
            assert!(
                (numeric - g[i]).abs() < 1e-5,
                "dim {}: numeric {} analytic {}",
                i,
                numeric,
                g[i]
            );
        }
    }

    #[test]
    fn test_prior_pulls_toward_zero() {
        let index = FeatureIndex::new();
        let dataset = small_dataset(&index);
        let unregularized = LogisticObjective::new(&dataset, 2, LogPrior::None);
        let regularized =
            LogisticObjective::new(&dataset, 2, LogPrior::Gaussian { sigma_sq: 0.01 });
        let w = vec![1.0, 1.0];
        let g0 = unregularized.gradient_at(&w);
        let g1 = regularized.gradient_at(&w);
        for i in 0..w.len() {
            assert!((g1[i] - g0[i] - w[i] / 0.01).abs() < 1e-9);
        }
    }
}
