//! PRO pair sampling.
//!
//! For one tuning instance, draws candidate index pairs uniformly at random,
//! scores both sides with the metric, keeps pairs whose score margin clears
//! the noise threshold, and retains the highest-margin survivors.  Margins
//! below the threshold are treated as not reliably distinguishing
//! translation quality.
extern crate float_ord;
extern crate rand;
extern crate rand_xorshift;
extern crate tune_data;

use self::float_ord::FloatOrd;
use self::rand::distributions::{Distribution, Uniform};
use self::rand::SeedableRng;
use self::rand_xorshift::XorShiftRng;

use self::tune_data::nbest::{Hypothesis, Tokens};

use crate::metric::SentenceMetric;

#[derive(Clone, Copy, Debug, PartialEq)]
/// A sampled candidate pair whose metric margin cleared the noise threshold.
/// The winner is the higher-scoring side.
pub struct CandidatePair {
    /// Absolute metric score margin between the two candidates
    pub margin: f64,
    /// Index of the higher-scoring candidate
    pub winner: usize,
    /// Index of the lower-scoring candidate
    pub loser: usize,
}

#[derive(Clone, Debug)]
/// Samples high-margin candidate pairs from one n-best list
pub struct PairSampler {
    gamma: usize,
    xi: usize,
    n_threshold: f64,
    seed: u64,
}

impl PairSampler {
    /// Returns a new PairSampler
    ///
    /// # Arguments
    ///
    /// * `gamma` number of uniform with-replacement index pair draws
    /// * `xi` maximum number of retained pairs
    /// * `n_threshold` minimum metric margin for a pair to survive
    /// * `seed` base seed; each instance derives its own generator from it
    pub fn new(gamma: usize, xi: usize, n_threshold: f64, seed: u64) -> PairSampler {
        assert!(gamma > 0, "Gamma must be > 0: {}", gamma);
        assert!(xi > 0, "Xi must be > 0: {}", xi);
        assert!(n_threshold >= 0.0, "Threshold must be >= 0: {}", n_threshold);
        PairSampler {
            gamma: gamma,
            xi: xi,
            n_threshold: n_threshold,
            seed: seed,
        }
    }

    /// Number of pair draws per instance
    pub fn gamma(&self) -> usize {
        self.gamma
    }

    /// Maximum number of pairs retained per instance
    pub fn xi(&self) -> usize {
        self.xi
    }

    /// Minimum metric margin for a pair to survive
    pub fn n_threshold(&self) -> f64 {
        self.n_threshold
    }

    /// Samples pairs from one n-best list, returning at most `xi` pairs
    /// sorted descending by margin.  Zero surviving pairs is a valid
    /// outcome.  The generator is re-derived from `(seed, source_id)` so
    /// sampling is deterministic per instance and safe to run from
    /// concurrent callers.
    pub fn sample<M: SentenceMetric>(
        &self,
        translations: &[Hypothesis],
        references: &[Tokens],
        source_id: usize,
        metric: &M,
    ) -> Vec<CandidatePair> {
        assert!(
            !translations.is_empty(),
            "empty n-best list for source {}",
            source_id
        );
        let mut rng = XorShiftRng::seed_from_u64(self.seed.wrapping_add(source_id as u64));
        let uniform = Uniform::new(0, translations.len());

        let mut v = Vec::with_capacity(self.gamma);
        for _ in 0..self.gamma {
            let j = uniform.sample(&mut rng);
            let j_prime = uniform.sample(&mut rng);
            let g_j = metric.score(source_id, references, &translations[j].translation);
            let g_j_prime = metric.score(source_id, references, &translations[j_prime].translation);
            let margin = (g_j - g_j_prime).abs();
            if margin >= self.n_threshold {
                if g_j > g_j_prime {
                    v.push(CandidatePair {
                        margin: margin,
                        winner: j,
                        loser: j_prime,
                    });
                } else {
                    v.push(CandidatePair {
                        margin: margin,
                        winner: j_prime,
                        loser: j,
                    });
                }
            }
        }

        // Keep the max-margin pairs
        v.sort_by_key(|p| (FloatOrd(p.margin), p.winner, p.loser));
        v.reverse();
        v.truncate(self.xi);
        v
    }
}
