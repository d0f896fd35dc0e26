//! Sentence-level quality metrics.
//!
//! The optimizer consumes metrics through the SentenceMetric contract and
//! never constructs them.  Because many metrics keep running corpus
//! statistics that are unsafe under concurrent mutation, a metric is wrapped
//! in a TuningMetric which fixes the scheduling regime once, at
//! construction, instead of branching on a capability flag at every call
//! site.
extern crate tune_data;

use std::sync::{Mutex, RwLock};

use self::tune_data::nbest::Tokens;

/// A sentence-level translation quality metric.
pub trait SentenceMetric {
    /// Whether `score` and `update` are internally synchronized and safe to
    /// call from concurrent threads
    fn is_threadsafe(&self) -> bool {
        false
    }

    /// Scores a candidate translation against the references.  Higher is
    /// better.
    fn score(&self, source_id: usize, references: &[Tokens], translation: &[String]) -> f64;

    /// Folds the chosen hypothesis for an instance into any running state.
    /// Called exactly once per instance per sampling pass.
    fn update(&mut self, source_id: usize, references: &[Tokens], translation: &[String]) -> ();
}

/// A metric bound to its scheduling regime.
///
/// `Concurrent` metrics may be scored from many instances at once; the
/// per-instance state update takes the write side of the lock.  `Exclusive`
/// metrics get one critical section spanning the whole score+update sequence
/// of an instance, which is a correctness requirement for metrics with
/// running corpus statistics.
pub enum TuningMetric<M> {
    /// Scoring may run in parallel across instances
    Concurrent(RwLock<M>),
    /// Score+update sequences are mutually exclusive across instances
    Exclusive(Mutex<M>),
}

impl<M: SentenceMetric> TuningMetric<M> {
    /// Wraps a metric, selecting the regime from its capability flag
    pub fn new(metric: M) -> TuningMetric<M> {
        if metric.is_threadsafe() {
            TuningMetric::Concurrent(RwLock::new(metric))
        } else {
            TuningMetric::Exclusive(Mutex::new(metric))
        }
    }

    /// Whether instances sharing this metric may be sampled in parallel
    pub fn is_concurrent(&self) -> bool {
        match self {
            TuningMetric::Concurrent(_) => true,
            TuningMetric::Exclusive(_) => false,
        }
    }

    /// Runs one instance's sampling pass, then the state update, honoring
    /// the regime: exclusive metrics hold a single critical section across
    /// both, concurrent metrics score under a shared guard and update under
    /// the write guard.
    pub fn score_then_update<R, F>(
        &self,
        sample: F,
        source_id: usize,
        references: &[Tokens],
        top_translation: &[String],
    ) -> R
    where
        F: FnOnce(&M) -> R,
    {
        match self {
            TuningMetric::Concurrent(lock) => {
                let out = {
                    let metric = lock.read().expect("metric lock poisoned");
                    sample(&metric)
                };
                let mut metric = lock.write().expect("metric lock poisoned");
                metric.update(source_id, references, top_translation);
                out
            }
            TuningMetric::Exclusive(lock) => {
                let mut metric = lock.lock().expect("metric lock poisoned");
                let out = sample(&metric);
                metric.update(source_id, references, top_translation);
                out
            }
        }
    }

    /// Unwraps the metric, e.g. to inspect its final state
    pub fn into_inner(self) -> M {
        match self {
            TuningMetric::Concurrent(lock) => lock.into_inner().expect("metric lock poisoned"),
            TuningMetric::Exclusive(lock) => lock.into_inner().expect("metric lock poisoned"),
        }
    }
}
