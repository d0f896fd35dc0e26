//! Tunekit-Core
//! ===
//!
//! This library contains the online pairwise-ranking sampler and gradient
//! engine used to tune the feature weights of a statistical machine
//! translation system (PRO-SGD).
//!
//! Pair Sampling
//! ---
//! For each tuning instance (a source sentence with its n-best candidate
//! list and references) a fixed number of candidate pairs is drawn uniformly
//! at random.  Each side of a pair is scored with a sentence-level quality
//! metric; pairs whose score margin falls below a noise threshold are
//! discarded and only the highest-margin survivors are kept.  This biases
//! training toward confident, high-margin evidence.
//!
//! Gradient Computation
//! ---
//! Retained pairs become signed feature-difference examples with binary
//! labels, so a standard two-class logistic classifier learns the ranking
//! hyperplane.  The gradient of a Gaussian-prior logistic objective over the
//! assembled example set is returned in sparse feature-name form; the prior
//! variance is corrected for the fraction of the tuning set the examples
//! actually cover.  Single-instance (online) and mini-batch learning share
//! one code path.
//!
//! The consuming pipeline (decoder, n-best generation, feature extraction,
//! and the metric implementations) lives outside this crate; this crate only
//! turns sampled evidence into a gradient and provides the in-place weight
//! update rules to apply it.

#![warn(missing_docs, unused)]

#[macro_use]
extern crate serde_derive;

/// Transient training example sets and feature whitelisting
pub mod dataset;
/// The sentence-level metric contract and its concurrency wrapper
pub mod metric;
/// The regularized logistic objective
pub mod objective;
/// The online pairwise ranking optimizer
pub mod optimizer;
/// PRO pair sampling
pub mod sampler;
/// In-place weight update rules
pub mod updater;
