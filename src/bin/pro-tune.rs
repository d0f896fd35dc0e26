//! Tunes MT feature weights with online pairwise ranking optimization.
extern crate clap;
extern crate tune;
extern crate tune_core;
extern crate tune_data;

use std::sync::Arc;
use std::time::Instant;

use clap::App;

use tune_core::dataset::FeatureWhitelist;
use tune_core::metric::TuningMetric;
use tune_core::optimizer::{PairwiseRankingOptimizer, DEFAULT_SEED};
use tune_data::index::FeatureIndex;

use tune::bin_utils::args::{ArgAugmenter, DatasetArgs, OptimizerArgs};
use tune::bin_utils::loaders::{build_tune_set, dump_weights, load_weights};
use tune::metrics::{PseudoCorpusBleu, SmoothBleu};
use tune::tuner::TunerLoop;

fn main() {
    let app = App::new("pro-tune")
        .version("0.1.0")
        .about("Tunes MT feature weights with online pairwise ranking optimization");
    let app = DatasetArgs.add_args(app);
    let app = OptimizerArgs.add_args(app);
    let matches = app.get_matches();

    let dm = DatasetArgs.load_from_args(&matches);
    let om = OptimizerArgs.load_from_args(&matches);

    let tune_set = build_tune_set(
        &dm.nbest,
        dm.source.as_ref().map(|x| x.as_str()),
        &dm.refs,
    );
    let weights = load_weights(dm.weights_in.as_ref().map(|x| x.as_str()));

    // One whitelist and one feature index shared across the whole run
    let whitelist = FeatureWhitelist::new();
    let feature_index = Arc::new(FeatureIndex::new());
    let expected_num_features = {
        let mut names = std::collections::HashSet::new();
        for instance in tune_set.iter() {
            for hypothesis in instance.hypotheses.iter() {
                for (name, _value) in hypothesis.features.iter() {
                    names.insert(name.clone());
                }
            }
        }
        names.len()
    };
    println!("Distinct features: {}", expected_num_features);

    let optimizer = PairwiseRankingOptimizer::new(
        feature_index,
        tune_set.len(),
        expected_num_features,
        &om.params,
    );
    println!("{}", optimizer);

    let seed = om.params.seed.unwrap_or(DEFAULT_SEED);
    let tuner_loop = TunerLoop::new(om.epochs, om.batch_size, om.parallel, seed);

    let now = Instant::now();
    let tuned = match om.metric.as_str() {
        "pseudo-bleu" => {
            println!("Using pseudo-corpus BLEU");
            let metric = TuningMetric::new(PseudoCorpusBleu::default());
            tuner_loop.run(&optimizer, &metric, &tune_set, Some(&whitelist), weights)
        }
        _ => {
            println!("Using smoothed sentence BLEU");
            let metric = TuningMetric::new(SmoothBleu::default());
            tuner_loop.run(&optimizer, &metric, &tune_set, Some(&whitelist), weights)
        }
    };
    println!("Tuning runtime (secs): {}", now.elapsed().as_secs());
    println!("Whitelist features: {}", whitelist.len());
    println!("Tuned weights: {:?}", tuned);

    dump_weights(&tuned, dm.weights_out.as_ref().map(|x| x.as_str()));
}
