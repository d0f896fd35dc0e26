//! The outer online tuning loop.
//!
//! Shuffles the tuning set each epoch, chunks it into mini-batches, and
//! applies each gradient with an update rule from the optimizer.  Two
//! scheduling strategies are available: the sequential path runs one
//! mini-batch gradient per chunk, while the parallel path computes
//! per-instance gradients across worker threads and applies them in order.
//! The parallel path is only taken when the metric declares itself safe for
//! concurrent scoring; the optimizer itself performs no internal threading.
extern crate rand;
extern crate rand_xorshift;
extern crate rayon;
extern crate tune_core;
extern crate tune_data;

use self::rand::seq::SliceRandom;
use self::rand::SeedableRng;
use self::rand_xorshift::XorShiftRng;
use self::rayon::prelude::*;

use self::tune_core::dataset::FeatureWhitelist;
use self::tune_core::metric::{SentenceMetric, TuningMetric};
use self::tune_core::optimizer::PairwiseRankingOptimizer;
use self::tune_data::datatypes::FeatureVector;
use self::tune_data::nbest::{Hypothesis, Tokens, TuningInstance};

#[derive(Clone, Debug)]
/// Settings for the online tuning loop
pub struct TunerLoop {
    epochs: usize,
    batch_size: usize,
    parallel: bool,
    seed: u64,
}

impl TunerLoop {
    /// Returns a new TunerLoop
    ///
    /// # Arguments
    ///
    /// * `epochs` number of passes over the tuning set
    /// * `batch_size` instances per mini-batch
    /// * `parallel` sample instances of a batch on worker threads when the
    ///   metric allows it
    /// * `seed` seed for the per-epoch shuffle
    pub fn new(epochs: usize, batch_size: usize, parallel: bool, seed: u64) -> TunerLoop {
        assert!(epochs > 0, "Epochs must be > 0: {}", epochs);
        assert!(batch_size > 0, "Batch size must be > 0: {}", batch_size);
        TunerLoop {
            epochs: epochs,
            batch_size: batch_size,
            parallel: parallel,
            seed: seed,
        }
    }

    /// Runs the tuning loop and returns the final weights
    pub fn run<M: SentenceMetric + Send + Sync>(
        &self,
        optimizer: &PairwiseRankingOptimizer,
        metric: &TuningMetric<M>,
        tune_set: &[TuningInstance],
        whitelist: Option<&FeatureWhitelist>,
        init: FeatureVector,
    ) -> FeatureVector {
        assert!(!tune_set.is_empty(), "Tune set must be non-empty");
        let mut weights = init;
        let mut updater = optimizer.new_updater();
        let mut order: Vec<usize> = (0..tune_set.len()).collect();

        for epoch in 0..self.epochs {
            let mut rng = XorShiftRng::seed_from_u64(self.seed.wrapping_add(epoch as u64));
            order.shuffle(&mut rng);

            let mut skipped = 0;
            for chunk in order.chunks(self.batch_size) {
                if self.parallel && metric.is_concurrent() && chunk.len() > 1 {
                    // Fan instances out to worker threads, apply in order
                    let gradients: Vec<FeatureVector> = chunk
                        .par_iter()
                        .map(|i| {
                            let instance = &tune_set[*i];
                            optimizer.get_gradient(
                                &weights,
                                &instance.source,
                                instance.source_id,
                                &instance.hypotheses,
                                &instance.references,
                                metric,
                                whitelist,
                            )
                        })
                        .collect();
                    for gradient in gradients {
                        if gradient.is_empty() {
                            skipped += 1;
                        } else {
                            updater.update(&mut weights, &gradient);
                        }
                    }
                } else {
                    let source_ids: Vec<usize> =
                        chunk.iter().map(|i| tune_set[*i].source_id).collect();
                    let sources: Vec<&[String]> =
                        chunk.iter().map(|i| tune_set[*i].source.as_slice()).collect();
                    let translations: Vec<&[Hypothesis]> = chunk
                        .iter()
                        .map(|i| tune_set[*i].hypotheses.as_slice())
                        .collect();
                    let references: Vec<&[Tokens]> = chunk
                        .iter()
                        .map(|i| tune_set[*i].references.as_slice())
                        .collect();

                    let gradient = optimizer.get_batch_gradient(
                        &weights,
                        &sources,
                        &source_ids,
                        &translations,
                        &references,
                        metric,
                        whitelist,
                    );
                    if gradient.is_empty() {
                        skipped += 1;
                    } else {
                        updater.update(&mut weights, &gradient);
                    }
                }
            }

            println!(
                "Epoch {}: features: {} weight-l2: {:.4} skipped updates: {}",
                epoch + 1,
                weights.len(),
                weights.l2norm(),
                skipped
            );
        }
        weights
    }
}
