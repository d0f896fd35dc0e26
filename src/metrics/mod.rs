//! Metrics
//! ---
//! Sentence-level translation quality metrics for tuning.
//!
//! Both metrics score on a 0-100 BLEU scale, which is the scale the
//! sampler's default noise threshold assumes.
//!
//! - SmoothBleu: smoothed sentence BLEU with no running state; safe for
//!   concurrent scoring.
//! - PseudoCorpusBleu: sentence BLEU against exponentially decayed
//!   background counts of previously selected hypotheses; the running state
//!   makes it unsafe for concurrent use.
extern crate hashbrown;
extern crate tune_core;
extern crate tune_data;

use self::hashbrown::HashMap;

use self::tune_core::metric::SentenceMetric;
use self::tune_data::nbest::Tokens;

/// Default n-gram order for BLEU
pub const DEFAULT_ORDER: usize = 4;
/// Default decay applied to the pseudo-corpus background counts
pub const DEFAULT_DECAY: f64 = 0.9;

#[derive(Clone, Debug)]
/// Accumulated per-order n-gram statistics for BLEU
pub struct BleuStats {
    /// Clipped n-gram matches per order
    pub matches: Vec<f64>,
    /// Candidate n-gram totals per order
    pub totals: Vec<f64>,
    /// Accumulated candidate length
    pub hyp_len: f64,
    /// Accumulated effective reference length
    pub ref_len: f64,
}

impl BleuStats {
    /// Returns zeroed statistics for the given n-gram order
    pub fn zero(order: usize) -> BleuStats {
        BleuStats {
            matches: vec![0.0; order],
            totals: vec![0.0; order],
            hyp_len: 0.0,
            ref_len: 0.0,
        }
    }

    /// Accumulates another set of statistics into this one
    pub fn add(&mut self, other: &BleuStats) -> () {
        assert_eq!(self.matches.len(), other.matches.len());
        for n in 0..self.matches.len() {
            self.matches[n] += other.matches[n];
            self.totals[n] += other.totals[n];
        }
        self.hyp_len += other.hyp_len;
        self.ref_len += other.ref_len;
    }

    /// Scales all counts, e.g. to decay background statistics
    pub fn scale(&mut self, by: f64) -> () {
        for n in 0..self.matches.len() {
            self.matches[n] *= by;
            self.totals[n] *= by;
        }
        self.hyp_len *= by;
        self.ref_len *= by;
    }
}

/// Counts the n-grams of lengths `1..=order` in a token sequence
fn ngram_counts(tokens: &[String], order: usize) -> HashMap<Vec<String>, usize> {
    let mut counts = HashMap::new();
    for n in 1..=order {
        if tokens.len() < n {
            break;
        }
        for window in tokens.windows(n) {
            let e = counts.entry(window.to_vec()).or_insert(0);
            *e += 1;
        }
    }
    counts
}

/// Reference length closest to the candidate length, ties to the shorter
pub fn closest_ref_length(references: &[Tokens], hyp_len: usize) -> usize {
    references
        .iter()
        .map(|r| r.len())
        .min_by_key(|len| ((*len as i64 - hyp_len as i64).abs(), *len))
        .expect("Must have at least one reference")
}

/// Collects clipped n-gram statistics for one candidate translation
pub fn sentence_stats(translation: &[String], references: &[Tokens], order: usize) -> BleuStats {
    let mut ref_counts: HashMap<Vec<String>, usize> = HashMap::new();
    for reference in references.iter() {
        for (ngram, count) in ngram_counts(reference, order) {
            let e = ref_counts.entry(ngram).or_insert(0);
            if count > *e {
                *e = count;
            }
        }
    }

    let mut stats = BleuStats::zero(order);
    for (ngram, count) in ngram_counts(translation, order) {
        let n = ngram.len() - 1;
        let clip = ref_counts.get(&ngram).map(|x| *x).unwrap_or(0);
        stats.totals[n] += count as f64;
        stats.matches[n] += count.min(clip) as f64;
    }
    stats.hyp_len = translation.len() as f64;
    stats.ref_len = closest_ref_length(references, translation.len()) as f64;
    stats
}

/// Smoothed BLEU on a 0-100 scale from accumulated statistics.  Higher
/// orders get add-one smoothing (Lin and Och 2004); a candidate with no
/// unigram match scores zero.
pub fn bleu(stats: &BleuStats) -> f64 {
    let order = stats.matches.len();
    let mut log_precision = 0.0;
    for n in 0..order {
        let (matched, total) = if n == 0 {
            (stats.matches[0], stats.totals[0])
        } else {
            (stats.matches[n] + 1.0, stats.totals[n] + 1.0)
        };
        if matched <= 0.0 || total <= 0.0 {
            return 0.0;
        }
        log_precision += (matched / total).ln();
    }
    log_precision /= order as f64;

    let brevity = if stats.hyp_len < stats.ref_len {
        (1.0 - stats.ref_len / stats.hyp_len).exp()
    } else {
        1.0
    };
    100.0 * brevity * log_precision.exp()
}

#[derive(Clone, Debug)]
/// Smoothed sentence-level BLEU with no running state
pub struct SmoothBleu {
    order: usize,
}

impl SmoothBleu {
    /// Returns a new SmoothBleu of the given n-gram order
    pub fn new(order: usize) -> SmoothBleu {
        assert!(order >= 1, "BLEU order must be >= 1: {}", order);
        SmoothBleu { order: order }
    }
}

impl Default for SmoothBleu {
    fn default() -> SmoothBleu {
        SmoothBleu::new(DEFAULT_ORDER)
    }
}

impl SentenceMetric for SmoothBleu {
    fn is_threadsafe(&self) -> bool {
        true
    }

    fn score(&self, _source_id: usize, references: &[Tokens], translation: &[String]) -> f64 {
        bleu(&sentence_stats(translation, references, self.order))
    }

    fn update(
        &mut self,
        _source_id: usize,
        _references: &[Tokens],
        _translation: &[String],
    ) -> () {
        // Stateless
    }
}

#[derive(Clone, Debug)]
/// Sentence BLEU against an exponentially decayed pseudo-corpus of the
/// hypotheses selected so far (Chiang's approximate corpus BLEU)
pub struct PseudoCorpusBleu {
    order: usize,
    decay: f64,
    background: BleuStats,
}

impl PseudoCorpusBleu {
    /// Returns a new PseudoCorpusBleu
    pub fn new(order: usize, decay: f64) -> PseudoCorpusBleu {
        assert!(order >= 1, "BLEU order must be >= 1: {}", order);
        assert!(
            decay > 0.0 && decay <= 1.0,
            "Decay must be in (0, 1]: {}",
            decay
        );
        PseudoCorpusBleu {
            order: order,
            decay: decay,
            background: BleuStats::zero(order),
        }
    }
}

impl Default for PseudoCorpusBleu {
    fn default() -> PseudoCorpusBleu {
        PseudoCorpusBleu::new(DEFAULT_ORDER, DEFAULT_DECAY)
    }
}

impl SentenceMetric for PseudoCorpusBleu {
    // The background counts are mutable running state, so the default
    // is_threadsafe of false stands

    fn score(&self, _source_id: usize, references: &[Tokens], translation: &[String]) -> f64 {
        let mut stats = sentence_stats(translation, references, self.order);
        stats.add(&self.background);
        bleu(&stats)
    }

    fn update(&mut self, _source_id: usize, references: &[Tokens], translation: &[String]) -> () {
        let stats = sentence_stats(translation, references, self.order);
        self.background.add(&stats);
        self.background.scale(self.decay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Tokens {
        s.split_whitespace().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_ngram_counts() {
        let counts = ngram_counts(&tokens("a b a b"), 2);
        assert_eq!(counts[&tokens("a")], 2);
        assert_eq!(counts[&tokens("b")], 2);
        assert_eq!(counts[&tokens("a b")], 2);
        assert_eq!(counts[&tokens("b a")], 1);
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_closest_ref_length() {
        let refs = vec![tokens("a b c"), tokens("a b c d e")];
        assert_eq!(closest_ref_length(&refs, 2), 3);
        assert_eq!(closest_ref_length(&refs, 5), 5);
        // Equidistant: prefer the shorter reference
        assert_eq!(closest_ref_length(&refs, 4), 3);
    }

    #[test]
    fn test_perfect_match_scores_100() {
        let metric = SmoothBleu::default();
        let refs = vec![tokens("the cat sat on the mat")];
        let score = metric.score(0, &refs, &tokens("the cat sat on the mat"));
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_overlap_scores_zero() {
        let metric = SmoothBleu::default();
        let refs = vec![tokens("the cat sat")];
        assert_eq!(metric.score(0, &refs, &tokens("x y z")), 0.0);
    }

    #[test]
    fn test_smooth_bleu_hand_computed() {
        // Unigrams 5/5, bigrams (3+1)/(4+1), brevity exp(1 - 6/5)
        let metric = SmoothBleu::new(2);
        let refs = vec![tokens("the cat sat on the mat")];
        let score = metric.score(0, &refs, &tokens("the cat sat on mat"));
        assert!((score - 73.22936).abs() < 1e-3, "got {}", score);
    }

    #[test]
    fn test_capability_flags() {
        assert!(SmoothBleu::default().is_threadsafe());
        assert!(!PseudoCorpusBleu::default().is_threadsafe());
    }

    #[test]
    fn test_pseudo_corpus_background_shifts_scores() {
        let mut metric = PseudoCorpusBleu::new(1, 0.9);
        let refs = vec![tokens("a b")];

        // No background yet: plain unigram precision
        let before = metric.score(0, &refs, &tokens("a x"));
        assert!((before - 50.0).abs() < 1e-9);

        // A perfect selected hypothesis pads the background counts
        metric.update(0, &refs, &tokens("a b"));
        let after = metric.score(1, &refs, &tokens("a x"));
        assert!(after > before, "{} vs {}", after, before);
    }

    #[test]
    fn test_pseudo_corpus_decay_bounds_background() {
        let mut metric = PseudoCorpusBleu::new(1, 0.5);
        let refs = vec![tokens("a b")];
        for i in 0..100 {
            metric.update(i, &refs, &tokens("a b"));
        }
        // Geometric series: the totals converge to decay/(1-decay) * 2 = 2
        assert!(metric.background.totals[0] <= 2.0 + 1e-9);
        assert!(metric.background.totals[0] > 1.9);
    }
}
