//! The online pairwise ranking optimizer (PRO-SGD).
//!
//! Converts one or more tuning instances into a regularized logistic
//! gradient over sampled candidate pairs.  True online learning is the
//! mini-batch case with a single instance; both run through one code path.
//! The returned gradient is sparse and the caller applies it with an update
//! rule from `new_updater`; the weight vector passed in is never mutated.
extern crate tune_data;

use std::fmt;
use std::sync::Arc;

use self::tune_data::datatypes::FeatureVector;
use self::tune_data::index::{FeatureIndex, Label};
use self::tune_data::nbest::{Hypothesis, Tokens};

use crate::dataset::{FeatureWhitelist, RankingDataset};
use crate::metric::{SentenceMetric, TuningMetric};
use crate::objective::{LogPrior, LogisticObjective};
use crate::sampler::PairSampler;
use crate::updater::{AdaGradUpdater, SgdUpdater, UpdateRule, UpdaterType};

/// Default number of sampled index pairs per instance
pub const DEFAULT_GAMMA: usize = 500;
/// Default maximum number of retained pairs per instance
pub const DEFAULT_XI: usize = 15;
/// Default noise threshold on the metric margin
pub const DEFAULT_N_THRESHOLD: f64 = 5.0;
/// Default minimum number of distinct instances a feature must appear in
pub const DEFAULT_MIN_FEATURE_SEGMENT_COUNT: usize = 3;
/// Default Gaussian prior sigma
pub const DEFAULT_SIGMA: f64 = 0.1;
/// Default learning rate
pub const DEFAULT_RATE: f64 = 0.1;
/// Default update rule name
pub const DEFAULT_UPDATER: &str = "sgd";
/// Default base sampling seed
pub const DEFAULT_SEED: u64 = 1234;

#[derive(Clone, Debug, Default, Deserialize)]
/// Tuning parameters.  Fields left unset fall back to the DEFAULT_*
/// constants at construction.
pub struct TunerParameters {
    /// Number of uniform with-replacement pair draws per instance
    pub gamma: Option<usize>,
    /// Maximum number of retained pairs per instance
    pub xi: Option<usize>,
    /// Minimum metric margin for a sampled pair to survive
    pub n_threshold: Option<f64>,
    /// Minimum number of distinct instances a feature must appear in
    pub min_feature_segment_count: Option<usize>,
    /// Gaussian prior sigma
    pub sigma: Option<f64>,
    /// Learning rate for the update rules
    pub rate: Option<f64>,
    /// Update rule name, `sgd` or `adagrad`
    pub updater: Option<String>,
    /// Base sampling seed
    pub seed: Option<u64>,
}

/// Online pairwise-ranking optimizer over a shared feature index
pub struct PairwiseRankingOptimizer {
    sampler: PairSampler,
    min_feature_segment_count: usize,
    tune_set_size: usize,
    expected_num_features: usize,
    sigma_sq: f64,
    rate: f64,
    updater_type: UpdaterType,
    feature_index: Arc<FeatureIndex>,
}

impl PairwiseRankingOptimizer {
    /// Returns a new optimizer.  Invalid parameter values fail here, not in
    /// later calls.
    ///
    /// # Arguments
    ///
    /// * `feature_index` shared name-to-position bijection
    /// * `tune_set_size` number of instances in the full tuning set
    /// * `expected_num_features` sizing hint for updater state
    /// * `params` tuning parameters, defaults applied per field
    pub fn new(
        feature_index: Arc<FeatureIndex>,
        tune_set_size: usize,
        expected_num_features: usize,
        params: &TunerParameters,
    ) -> PairwiseRankingOptimizer {
        let min_feature_segment_count = params
            .min_feature_segment_count
            .unwrap_or(DEFAULT_MIN_FEATURE_SEGMENT_COUNT);
        assert!(tune_set_size > 0, "Tune set size must be > 0");
        assert!(
            min_feature_segment_count >= 1,
            "Feature segment count must be >= 1: {}",
            min_feature_segment_count
        );
        let sigma = params.sigma.unwrap_or(DEFAULT_SIGMA);
        let sampler = PairSampler::new(
            params.gamma.unwrap_or(DEFAULT_GAMMA),
            params.xi.unwrap_or(DEFAULT_XI),
            params.n_threshold.unwrap_or(DEFAULT_N_THRESHOLD),
            params.seed.unwrap_or(DEFAULT_SEED),
        );
        let updater_type = UpdaterType::from_name(
            params
                .updater
                .as_ref()
                .map(|name| name.as_str())
                .unwrap_or(DEFAULT_UPDATER),
        );
        PairwiseRankingOptimizer {
            sampler: sampler,
            min_feature_segment_count: min_feature_segment_count,
            tune_set_size: tune_set_size,
            expected_num_features: expected_num_features,
            sigma_sq: sigma * sigma,
            rate: params.rate.unwrap_or(DEFAULT_RATE),
            updater_type: updater_type,
            feature_index: feature_index,
        }
    }

    /// Returns a new optimizer with all parameters at their defaults
    pub fn with_defaults(
        feature_index: Arc<FeatureIndex>,
        tune_set_size: usize,
        expected_num_features: usize,
    ) -> PairwiseRankingOptimizer {
        PairwiseRankingOptimizer::new(
            feature_index,
            tune_set_size,
            expected_num_features,
            &TunerParameters::default(),
        )
    }

    /// Selects PRO samples from a batch and assembles the example set.
    /// Each retained pair yields two examples: the winner-minus-loser
    /// difference labeled positive and its negation labeled negative, so a
    /// two-class classifier learns the ranking hyperplane.
    fn build_dataset<M: SentenceMetric>(
        &self,
        source_ids: &[usize],
        metric: &TuningMetric<M>,
        translation_lists: &[&[Hypothesis]],
        reference_lists: &[&[Tokens]],
        feature_whitelist: Option<&FeatureWhitelist>,
    ) -> RankingDataset {
        assert_eq!(
            source_ids.len(),
            translation_lists.len(),
            "one n-best list per source id"
        );
        assert_eq!(
            translation_lists.len(),
            reference_lists.len(),
            "one reference list per n-best list"
        );

        // Filtering for sparse features; dense models don't need it
        let allowed = feature_whitelist
            .map(|whitelist| whitelist.observe(translation_lists, self.min_feature_segment_count));

        let mut dataset = RankingDataset::with_capacity(2 * self.sampler.xi() * source_ids.len());
        for i in 0..source_ids.len() {
            let source_id = source_ids[i];
            let translations = translation_lists[i];
            let references = reference_lists[i];
            assert!(
                !translations.is_empty(),
                "empty n-best list for source {}",
                source_id
            );
            assert!(
                !references.is_empty(),
                "no references for source {}",
                source_id
            );

            let pairs = metric.score_then_update(
                |m| self.sampler.sample(translations, references, source_id, m),
                source_id,
                references,
                &translations[0].translation,
            );

            for pair in pairs {
                let mut gt_vector =
                    translations[pair.winner].features.difference(&translations[pair.loser].features);
                if let Some(keys) = allowed.as_ref() {
                    gt_vector.retain_keys(keys);
                }
                let lt_vector = gt_vector.negated();
                dataset.add(&gt_vector, Label::Positive, &self.feature_index);
                dataset.add(&lt_vector, Label::Negative, &self.feature_index);
            }
        }
        dataset
    }

    /// Computes the gradient for the assembled set of PRO samples
    fn compute_gradient(&self, dataset: &RankingDataset, weights: &FeatureVector) -> FeatureVector {
        let data_fraction =
            dataset.len() as f64 / (2 * self.sampler.xi() * self.tune_set_size) as f64;
        // Dividing the variance by the data fraction has the same effect as
        // scaling the regularization strength by the data fraction
        let prior = LogPrior::Gaussian {
            sigma_sq: self.sigma_sq / data_fraction,
        };

        let dimension = weights.len().max(dataset.num_feature_types());
        let objective = LogisticObjective::new(dataset, dimension, prior);
        let w = self.feature_index.to_dense(weights, dimension);
        let g = objective.gradient_at(&w);
        self.feature_index.to_sparse(&g)
    }

    /// True online learning, one instance at a time
    pub fn get_gradient<M: SentenceMetric>(
        &self,
        weights: &FeatureVector,
        _source: &[String],
        source_id: usize,
        translations: &[Hypothesis],
        references: &[Tokens],
        metric: &TuningMetric<M>,
        feature_whitelist: Option<&FeatureWhitelist>,
    ) -> FeatureVector {
        assert!(!translations.is_empty(), "empty n-best list");
        assert!(!references.is_empty(), "empty reference list");

        let dataset = self.build_dataset(
            &[source_id],
            metric,
            &[translations],
            &[references],
            feature_whitelist,
        );
        if dataset.is_empty() {
            eprintln!("Warning: null gradient for source {}", source_id);
            return FeatureVector::new();
        }
        self.compute_gradient(&dataset, weights)
    }

    /// Mini-batch learning
    pub fn get_batch_gradient<M: SentenceMetric>(
        &self,
        weights: &FeatureVector,
        _sources: &[&[String]],
        source_ids: &[usize],
        translation_lists: &[&[Hypothesis]],
        reference_lists: &[&[Tokens]],
        metric: &TuningMetric<M>,
        feature_whitelist: Option<&FeatureWhitelist>,
    ) -> FeatureVector {
        assert!(!translation_lists.is_empty(), "empty mini-batch");

        let dataset = self.build_dataset(
            source_ids,
            metric,
            translation_lists,
            reference_lists,
            feature_whitelist,
        );
        if dataset.is_empty() {
            eprintln!("Warning: null gradient for mini-batch {:?}", source_ids);
            return FeatureVector::new();
        }
        self.compute_gradient(&dataset, weights)
    }

    /// Returns a fresh, independently-stateful update rule of the
    /// configured type
    pub fn new_updater(&self) -> Box<dyn UpdateRule> {
        match self.updater_type {
            UpdaterType::AdaGrad => {
                Box::new(AdaGradUpdater::new(self.rate, self.expected_num_features))
            }
            UpdaterType::Sgd => Box::new(SgdUpdater::new(self.rate)),
        }
    }
}

impl fmt::Display for PairwiseRankingOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "PairwiseRankingOptimizer gamma: {} xi: {} threshold: {:.2} feature-filter: {} updater: {:?}",
            self.sampler.gamma(),
            self.sampler.xi(),
            self.sampler.n_threshold(),
            self.min_feature_segment_count,
            self.updater_type
        )
    }
}

#[cfg(test)]
mod tests {
    extern crate hashbrown;

    use self::hashbrown::HashMap;

    use super::*;

    struct TableMetric {
        scores: HashMap<String, f64>,
        updates: usize,
    }

    impl TableMetric {
        fn new(entries: &[(&str, f64)]) -> TableMetric {
            let mut scores = HashMap::new();
            for (translation, score) in entries.iter() {
                scores.insert(translation.to_string(), *score);
            }
            TableMetric {
                scores: scores,
                updates: 0,
            }
        }
    }

    impl SentenceMetric for TableMetric {
        fn score(&self, _source_id: usize, _references: &[Tokens], translation: &[String]) -> f64 {
            self.scores[&translation.join(" ")]
        }

        fn update(
            &mut self,
            _source_id: usize,
            _references: &[Tokens],
            _translation: &[String],
        ) -> () {
            self.updates += 1;
        }
    }

    fn hypothesis(translation: &str, fs: &[(&str, f64)]) -> Hypothesis {
        let mut features = FeatureVector::new();
        for (name, value) in fs.iter() {
            features.set(name, *value);
        }
        Hypothesis::new(
            translation.split_whitespace().map(|x| x.to_string()).collect(),
            features,
            0.0,
        )
    }

    fn nbest() -> Vec<Hypothesis> {
        vec![
            hypothesis("a", &[("good", 1.0), ("lm", -1.0)]),
            hypothesis("b", &[("mid", 1.0), ("lm", -2.0)]),
            hypothesis("c", &[("bad", 1.0), ("lm", -3.0)]),
        ]
    }

    fn references() -> Vec<Tokens> {
        vec![vec!["a".to_string()]]
    }

    fn params(gamma: usize, xi: usize, n_threshold: f64) -> TunerParameters {
        TunerParameters {
            gamma: Some(gamma),
            xi: Some(xi),
            n_threshold: Some(n_threshold),
            min_feature_segment_count: Some(1),
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_example_pairs_are_negations() {
        let index = Arc::new(FeatureIndex::new());
        let optimizer =
            PairwiseRankingOptimizer::new(index.clone(), 1, 8, &params(60, 4, 0.1));
        let metric = TuningMetric::new(TableMetric::new(&[("a", 0.9), ("b", 0.6), ("c", 0.2)]));
        let translations = nbest();
        let refs = references();

        let dataset = optimizer.build_dataset(&[0], &metric, &[&translations], &[&refs], None);
        assert!(!dataset.is_empty());
        assert_eq!(dataset.len() % 2, 0);

        let pairs: Vec<_> = dataset.iter().collect();
        for chunk in pairs.chunks(2) {
            let (gt, gt_label) = &chunk[0];
            let (lt, lt_label) = &chunk[1];
            assert_eq!(*gt_label, Label::Positive);
            assert_eq!(*lt_label, Label::Negative);
            assert_eq!(gt.indices.len(), lt.indices.len());
            for k in 0..gt.indices.len() {
                let pos = lt.indices.iter().position(|i| *i == gt.indices[k]).unwrap();
                assert_eq!(lt.values[pos], -gt.values[k]);
            }
        }
    }

    #[test]
    fn test_whitelist_excluding_everything_empties_features_not_labels() {
        let index = Arc::new(FeatureIndex::new());
        let mut p = params(60, 4, 0.1);
        p.min_feature_segment_count = Some(100);
        let optimizer = PairwiseRankingOptimizer::new(index.clone(), 1, 8, &p);
        let metric = TuningMetric::new(TableMetric::new(&[("a", 0.9), ("b", 0.6), ("c", 0.2)]));
        let translations = nbest();
        let refs = references();
        let whitelist = FeatureWhitelist::new();

        let dataset =
            optimizer.build_dataset(&[0], &metric, &[&translations], &[&refs], Some(&whitelist));
        assert!(!dataset.is_empty());
        let mut positives = 0;
        let mut negatives = 0;
        for (example, label) in dataset.iter() {
            assert!(example.indices.is_empty());
            match label {
                Label::Positive => positives += 1,
                Label::Negative => negatives += 1,
            }
        }
        assert_eq!(positives, negatives);

        // The gradient over feature-free examples is empty, not an error
        let gradient = optimizer.get_gradient(
            &FeatureVector::new(),
            &[],
            0,
            &translations,
            &refs,
            &metric,
            Some(&whitelist),
        );
        assert!(gradient.is_empty());
    }

    #[test]
    fn test_zero_pairs_returns_empty_gradient() {
        let index = Arc::new(FeatureIndex::new());
        let optimizer =
            PairwiseRankingOptimizer::new(index.clone(), 1, 8, &params(60, 4, 1000.0));
        let metric = TuningMetric::new(TableMetric::new(&[("a", 0.9), ("b", 0.6), ("c", 0.2)]));
        let translations = nbest();
        let refs = references();

        let gradient = optimizer.get_gradient(
            &FeatureVector::new(),
            &[],
            0,
            &translations,
            &refs,
            &metric,
            None,
        );
        assert!(gradient.is_empty());
        // The metric state update still ran exactly once
        assert_eq!(metric.into_inner().updates, 1);
    }

    #[test]
    fn test_metric_updated_once_per_instance() {
        let index = Arc::new(FeatureIndex::new());
        let optimizer =
            PairwiseRankingOptimizer::new(index.clone(), 3, 8, &params(60, 4, 0.1));
        let metric = TuningMetric::new(TableMetric::new(&[("a", 0.9), ("b", 0.6), ("c", 0.2)]));
        let translations = nbest();
        let refs = references();

        let t: Vec<&[Hypothesis]> = vec![&translations, &translations, &translations];
        let r: Vec<&[Tokens]> = vec![&refs, &refs, &refs];
        optimizer.get_batch_gradient(
            &FeatureVector::new(),
            &[&[], &[], &[]],
            &[0, 1, 2],
            &t,
            &r,
            &metric,
            None,
        );
        assert_eq!(metric.into_inner().updates, 3);
    }

    #[test]
    fn test_batch_of_copies_scales_the_data_term() {
        // At zero weights the prior contributes nothing, so a batch of n
        // identical instances must yield exactly n times the online gradient
        let index = Arc::new(FeatureIndex::new());
        let optimizer =
            PairwiseRankingOptimizer::new(index.clone(), 3, 8, &params(60, 3, 0.1));
        let metric = TuningMetric::new(TableMetric::new(&[("a", 0.9), ("b", 0.6), ("c", 0.2)]));
        let translations = nbest();
        let refs = references();
        let weights = FeatureVector::new();

        let single =
            optimizer.get_gradient(&weights, &[], 5, &translations, &refs, &metric, None);
        assert!(!single.is_empty());

        let t: Vec<&[Hypothesis]> = vec![&translations, &translations, &translations];
        let r: Vec<&[Tokens]> = vec![&refs, &refs, &refs];
        let batch = optimizer.get_batch_gradient(
            &weights,
            &[&[], &[], &[]],
            &[5, 5, 5],
            &t,
            &r,
            &metric,
            None,
        );

        let mut scaled = FeatureVector::new();
        for (name, value) in single.iter() {
            scaled.set(name, 3.0 * value);
        }
        assert!(batch.approx_eq(&scaled, 1e-9));
    }

    #[test]
    fn test_gradient_points_away_from_winners() {
        // Minimizing the logistic loss moves weights toward winner features,
        // so the raw gradient on `good` must be negative and on `bad`
        // positive
        let index = Arc::new(FeatureIndex::new());
        let optimizer =
            PairwiseRankingOptimizer::new(index.clone(), 1, 8, &params(200, 10, 0.1));
        let metric = TuningMetric::new(TableMetric::new(&[("a", 0.9), ("b", 0.6), ("c", 0.2)]));
        let translations = nbest();
        let refs = references();

        let gradient = optimizer.get_gradient(
            &FeatureVector::new(),
            &[],
            0,
            &translations,
            &refs,
            &metric,
            None,
        );
        assert!(gradient.get("good") < 0.0);
        assert!(gradient.get("bad") > 0.0);
    }

    #[test]
    fn test_display_reports_configuration() {
        let index = Arc::new(FeatureIndex::new());
        let optimizer = PairwiseRankingOptimizer::with_defaults(index, 10, 8);
        let rendered = format!("{}", optimizer);
        assert!(rendered.contains("gamma: 500"));
        assert!(rendered.contains("xi: 15"));
        assert!(rendered.contains("updater: Sgd"));
    }

    #[test]
    #[should_panic]
    fn test_zero_xi_fails_construction() {
        let index = Arc::new(FeatureIndex::new());
        let mut p = TunerParameters::default();
        p.xi = Some(0);
        PairwiseRankingOptimizer::new(index, 10, 8, &p);
    }

    #[test]
    #[should_panic]
    fn test_zero_segment_count_fails_construction() {
        let index = Arc::new(FeatureIndex::new());
        let mut p = TunerParameters::default();
        p.min_feature_segment_count = Some(0);
        PairwiseRankingOptimizer::new(index, 10, 8, &p);
    }

    #[test]
    #[should_panic]
    fn test_mismatched_batch_shapes_fail() {
        let index = Arc::new(FeatureIndex::new());
        let optimizer =
            PairwiseRankingOptimizer::new(index.clone(), 2, 8, &params(10, 2, 0.1));
        let metric = TuningMetric::new(TableMetric::new(&[("a", 0.9)]));
        let translations = nbest();
        let refs = references();
        let t: Vec<&[Hypothesis]> = vec![&translations, &translations];
        let r: Vec<&[Tokens]> = vec![&refs];
        optimizer.get_batch_gradient(
            &FeatureVector::new(),
            &[&[], &[]],
            &[0, 1],
            &t,
            &r,
            &metric,
            None,
        );
    }
}
