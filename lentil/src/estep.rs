//! Corpus-level E-step: split the documents into even row slices,
//! infer them on the rayon pool and merge.

use crate::corpus::CountMatrix;
use crate::doc_inference::{infer_slice, DocControls, InferenceMode, SlicePosterior};
use crate::model::TopicWordModel;
use log::debug;
use matrix_util::utils::generate_even_slices;
use ndarray::prelude::*;
use rayon::prelude::*;

/// Controls of one E-step round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EStepControls {
    pub doc: DocControls,
    /// number of row slices; `None` takes the size of the rayon pool
    pub n_jobs: Option<usize>,
}

impl EStepControls {
    fn num_slices(&self) -> usize {
        self.n_jobs.unwrap_or_else(rayon::current_num_threads).max(1)
    }
}

/// γ of every document, `N x K`, rows in corpus order
pub fn e_step<C>(
    corpus: &C,
    model: &TopicWordModel,
    controls: &EStepControls,
    mode: InferenceMode,
) -> Array2<f64>
where
    C: CountMatrix + ?Sized,
{
    run_slices(corpus, model, controls, mode, false).0
}

/// γ of every document (`N x K`) and the sufficient statistics
/// (`K x V`) for the M-step
pub fn e_step_with_stats<C>(
    corpus: &C,
    model: &TopicWordModel,
    controls: &EStepControls,
    mode: InferenceMode,
) -> (Array2<f64>, Array2<f64>)
where
    C: CountMatrix + ?Sized,
{
    let (doc_topic, suff_stats) = run_slices(corpus, model, controls, mode, true);
    let mut suff_stats =
        suff_stats.unwrap_or_else(|| Array2::zeros((model.n_topics(), model.n_words())));
    suff_stats *= model.exp_dirichlet_component();
    (doc_topic, suff_stats)
}

fn run_slices<C>(
    corpus: &C,
    model: &TopicWordModel,
    controls: &EStepControls,
    mode: InferenceMode,
    collect_stats: bool,
) -> (Array2<f64>, Option<Array2<f64>>)
where
    C: CountMatrix + ?Sized,
{
    let ndocs = corpus.num_docs();
    let slices = generate_even_slices(ndocs, controls.num_slices());
    debug!("E-step over {} documents in {} slices", ndocs, slices.len());

    let infer = |&range: &(usize, usize)| {
        infer_slice(corpus, range, model, &controls.doc, mode, collect_stats)
    };

    let parts: Vec<SlicePosterior> = if slices.len() <= 1 {
        slices.iter().map(infer).collect()
    } else {
        slices.par_iter().map(infer).collect()
    };

    merge_slices(parts, model.n_topics())
}

fn merge_slices(
    parts: Vec<SlicePosterior>,
    n_topics: usize,
) -> (Array2<f64>, Option<Array2<f64>>) {
    let ndocs: usize = parts.iter().map(|p| p.doc_topic.nrows()).sum();
    let mut doc_topic = Array2::<f64>::zeros((ndocs, n_topics));
    let mut suff_stats: Option<Array2<f64>> = None;
    let mut n_sweeps = 0;

    let mut lb = 0;
    for part in parts {
        let ub = lb + part.doc_topic.nrows();
        doc_topic.slice_mut(s![lb..ub, ..]).assign(&part.doc_topic);
        lb = ub;
        n_sweeps += part.n_sweeps;

        if let Some(stats) = part.suff_stats {
            match suff_stats.as_mut() {
                Some(tot) => *tot += &stats,
                None => suff_stats = Some(stats),
            }
        }
    }

    if ndocs > 0 {
        debug!("{:.2} sweeps per document", n_sweeps as f64 / ndocs as f64);
    }

    (doc_topic, suff_stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_inference::{infer_document, initial_doc_topic};
    use crate::model::{LearningSchedule, Priors};
    use approx::assert_abs_diff_eq;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn controls(n_jobs: Option<usize>) -> EStepControls {
        EStepControls {
            doc: DocControls {
                max_iters: 50,
                mean_change_tol: 1e-4,
            },
            n_jobs,
        }
    }

    fn random_model(n_words: usize) -> TopicWordModel {
        let mut rng = SmallRng::seed_from_u64(1);
        TopicWordModel::random(
            3,
            n_words,
            Priors {
                doc_topic: 1. / 3.,
                topic_word: 1. / 3.,
            },
            LearningSchedule {
                decay: 0.7,
                offset: 10.,
            },
            &mut rng,
        )
        .unwrap()
    }

    fn random_corpus(ndocs: usize, nwords: usize) -> Array2<f64> {
        Array2::from_shape_fn((ndocs, nwords), |(i, j)| ((i * 7 + j * 3) % 5) as f64)
    }

    #[test]
    fn worker_count_does_not_change_the_result() {
        let corpus = random_corpus(23, 6);
        let model = random_model(6);

        for mode in [
            InferenceMode::Deterministic,
            InferenceMode::training(99).unwrap(),
        ] {
            let (gamma_1, stats_1) = e_step_with_stats(&corpus, &model, &controls(Some(1)), mode);
            for n_jobs in [2, 4, 7, 100] {
                let (gamma_n, stats_n) =
                    e_step_with_stats(&corpus, &model, &controls(Some(n_jobs)), mode);
                assert_eq!(gamma_1, gamma_n);
                assert_abs_diff_eq!(stats_1, stats_n, epsilon = 1e-10);
            }
            assert_eq!(gamma_1, e_step(&corpus, &model, &controls(None), mode));
        }
    }

    #[test]
    fn rows_follow_sequential_inference() {
        let corpus = random_corpus(10, 6);
        let model = random_model(6);
        let ctrl = controls(Some(3));
        let mode = InferenceMode::training(5).unwrap();
        let gamma = e_step(&corpus, &model, &ctrl, mode);

        for d in 0..corpus.nrows() {
            let post = infer_document(
                &corpus.doc_words(d),
                model.exp_dirichlet_component(),
                model.priors().doc_topic,
                &ctrl.doc,
                initial_doc_topic(mode, d, 3),
            );
            assert_eq!(gamma.row(d), post.doc_topic);
        }
    }

    #[test]
    fn statistics_sum_to_word_counts() {
        // Σ_k S_kw = n_w up to the normalizer floor
        let corpus = random_corpus(12, 6);
        let model = random_model(6);
        let (_, stats) = e_step_with_stats(
            &corpus,
            &model,
            &controls(Some(2)),
            InferenceMode::Deterministic,
        );
        assert_abs_diff_eq!(stats.sum_axis(Axis(0)), corpus.sum_axis(Axis(0)), epsilon = 1e-8);
    }

    #[test]
    fn empty_corpus() {
        let corpus = Array2::<f64>::zeros((0, 6));
        let model = random_model(6);
        let (gamma, stats) = e_step_with_stats(
            &corpus,
            &model,
            &controls(None),
            InferenceMode::Deterministic,
        );
        assert_eq!(gamma.dim(), (0, 3));
        assert_eq!(stats.dim(), (3, 6));
        assert_eq!(stats.sum(), 0.0);
    }
}
