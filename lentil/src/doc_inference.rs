//! Coordinate ascent on the topic proportions of one document at a
//! time.
//!
//! With `β̃ = exp(E[log β])` restricted to the words `w` of document
//! `d` and `θ̃ = exp(E[log θ_d])`, each sweep updates
//!
//! ```text
//! γ_d ← α + θ̃ ⊙ Σ_w β̃_{·w} n_dw / (θ̃ · β̃_{·w} + ε)
//! ```
//!
//! until the mean absolute change of `γ_d` drops below a tolerance or
//! the sweep limit is reached.

use crate::corpus::{CountMatrix, DocWords};
use crate::dirichlet::{mean_change, DirichletOps};
use crate::error::LdaError;
use crate::model::TopicWordModel;
use ndarray::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};

/// Floor of the normalizer
pub const EPS: f64 = f64::EPSILON;

/// Random starting point `γ_d ~ Gamma(shape, scale)` in training
const INIT_GAMMA_SHAPE: f64 = 100.0;
const INIT_GAMMA_SCALE: f64 = 0.01;

/// Convergence controls of the per-document loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocControls {
    pub max_iters: usize,
    pub mean_change_tol: f64,
}

/// How to initialize `γ_d` before the first sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InferenceMode {
    /// all ones, for `transform` and scoring
    Deterministic,
    /// `init` draws; each document has its own generator seeded by
    /// `seed` and its row so that the outcome does not depend on how
    /// the rows are split across workers
    Training { seed: u64, init: Gamma<f64> },
}

impl InferenceMode {
    /// Training mode with `Gamma(100, 0.01)` starting points
    pub fn training(seed: u64) -> Result<Self, LdaError> {
        let init = Gamma::new(INIT_GAMMA_SHAPE, INIT_GAMMA_SCALE)
            .map_err(|e| LdaError::invalid_parameter("initial doc_topic", e))?;
        Ok(Self::Training { seed, init })
    }
}

/// Result of one document
#[derive(Debug, Clone)]
pub struct DocPosterior {
    /// γ_d, unnormalized Dirichlet parameters
    pub doc_topic: Array1<f64>,
    /// `exp(E[log θ_d])` at γ_d
    pub exp_doc_topic: Array1<f64>,
    /// `n_dw / (θ̃ · β̃_{·w} + ε)` for the words of the document
    pub weighted_counts: Array1<f64>,
    /// number of sweeps taken
    pub n_sweeps: usize,
}

impl DocPosterior {
    /// Add `outer(θ̃, n_dw / norm)` into the columns `ids` of a `K x V`
    /// statistic. The `β̃` factor is left for the caller.
    pub fn accumulate_stats(&self, ids: &[usize], suff_stats: &mut Array2<f64>) {
        debug_assert_eq!(ids.len(), self.weighted_counts.len());
        for (&w, &c) in ids.iter().zip(self.weighted_counts.iter()) {
            let mut stat_w = suff_stats.column_mut(w);
            stat_w.scaled_add(c, &self.exp_doc_topic);
        }
    }
}

/// Starting `γ_d` of the document at `row` of the current corpus
pub fn initial_doc_topic(mode: InferenceMode, row: usize, n_topics: usize) -> Array1<f64> {
    match mode {
        InferenceMode::Deterministic => Array1::ones(n_topics),
        InferenceMode::Training { seed, init } => {
            let doc_seed = seed ^ (row as u64).wrapping_mul(2654435761);
            let mut rng = SmallRng::seed_from_u64(doc_seed);
            Array1::from_shape_fn(n_topics, |_| init.sample(&mut rng))
        }
    }
}

/// Infer γ_d of one document
/// * `doc` - nonzero word ids and counts
/// * `exp_topic_word` - `exp(E[log β])`, `K x V`
/// * `doc_topic_prior` - α
/// * `controls` - sweep limit and tolerance
/// * `init` - starting γ_d
pub fn infer_document(
    doc: &DocWords,
    exp_topic_word: &Array2<f64>,
    doc_topic_prior: f64,
    controls: &DocControls,
    init: Array1<f64>,
) -> DocPosterior {
    let counts = ArrayView1::from(&doc.counts[..]);
    let n_topics = exp_topic_word.nrows();
    let exp_topic_word_d = Array2::from_shape_fn((n_topics, doc.ids.len()), |(k, j)| {
        exp_topic_word[(k, doc.ids[j])]
    });

    let mut doc_topic = init;
    let mut exp_doc_topic = doc_topic.exp_dirichlet_expectation();
    let mut norm_phi = exp_doc_topic.dot(&exp_topic_word_d) + EPS;

    let mut n_sweeps = 0;
    for _ in 0..controls.max_iters {
        let weighted = &counts / &norm_phi;
        let mut doc_topic_new = &exp_doc_topic * &exp_topic_word_d.dot(&weighted);
        doc_topic_new += doc_topic_prior;

        exp_doc_topic = doc_topic_new.exp_dirichlet_expectation();
        norm_phi = exp_doc_topic.dot(&exp_topic_word_d) + EPS;
        n_sweeps += 1;

        let change = mean_change(&doc_topic_new, &doc_topic);
        doc_topic = doc_topic_new;
        if change < controls.mean_change_tol {
            break;
        }
    }

    let weighted_counts = &counts / &norm_phi;

    DocPosterior {
        doc_topic,
        exp_doc_topic,
        weighted_counts,
        n_sweeps,
    }
}

/// Posterior of a contiguous range of documents
#[derive(Debug, Clone)]
pub struct SlicePosterior {
    /// `(ub - lb) x K`
    pub doc_topic: Array2<f64>,
    /// `K x V`, without the `β̃` factor; only if requested
    pub suff_stats: Option<Array2<f64>>,
    /// sweeps summed over the documents
    pub n_sweeps: usize,
}

/// Run [`infer_document`] on rows `[lb, ub)` one by one
/// * `corpus` - document by word counts
/// * `(lb, ub)` - row range
/// * `model` - current topic-word model
/// * `controls` - per-document convergence controls
/// * `mode` - initialization of γ
/// * `collect_stats` - accumulate the sufficient statistics
pub fn infer_slice<C>(
    corpus: &C,
    (lb, ub): (usize, usize),
    model: &TopicWordModel,
    controls: &DocControls,
    mode: InferenceMode,
    collect_stats: bool,
) -> SlicePosterior
where
    C: CountMatrix + ?Sized,
{
    let n_topics = model.n_topics();
    let exp_topic_word = model.exp_dirichlet_component();
    let alpha = model.priors().doc_topic;

    let mut doc_topic = Array2::<f64>::zeros((ub - lb, n_topics));
    let mut suff_stats = if collect_stats {
        Some(Array2::<f64>::zeros((n_topics, model.n_words())))
    } else {
        None
    };

    let mut n_sweeps = 0;
    for (d, mut doc_topic_d) in (lb..ub).zip(doc_topic.rows_mut()) {
        let doc = corpus.doc_words(d);
        let init = initial_doc_topic(mode, d, n_topics);
        let post = infer_document(&doc, exp_topic_word, alpha, controls, init);

        if let Some(stats) = suff_stats.as_mut() {
            post.accumulate_stats(&doc.ids, stats);
        }
        doc_topic_d.assign(&post.doc_topic);
        n_sweeps += post.n_sweeps;
    }

    SlicePosterior {
        doc_topic,
        suff_stats,
        n_sweeps,
    }
}
