//! Variational lower bound (ELBO) and perplexity.
//!
//! ```text
//! L = Σ_d Σ_w n_dw log Σ_k exp(E[log θ_dk] + E[log β_kw])
//!   + E[log p(θ|α) - log q(θ|γ)]
//!   + E[log p(β|η) - log q(β|λ)]
//! ```

use crate::corpus::CountMatrix;
use crate::dirichlet::{ln_gamma, DirichletOps};
use crate::model::TopicWordModel;
use ndarray::prelude::*;
use ndarray::Data;
use rayon::prelude::*;

/// `E[log p(x|prior) - log q(x|distr)]` summed over the rows of a
/// matrix of Dirichlet parameters, each of length `size`
///
/// ```text
/// Σ (prior - distr) E[log x] + Σ (lnΓ(distr) - lnΓ(prior))
///   + Σ_rows (lnΓ(prior * size) - lnΓ(Σ_j distr_j))
/// ```
pub fn dirichlet_log_likelihood<S1, S2>(
    prior: f64,
    distr: &ArrayBase<S1, Ix2>,
    dirichlet_distr: &ArrayBase<S2, Ix2>,
    size: usize,
) -> f64
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
{
    let ln_gamma_prior = ln_gamma(prior);
    let ln_gamma_prior_tot = ln_gamma(prior * size as f64);

    let mut score = 0.0;
    for (distr_i, elog_i) in distr.rows().into_iter().zip(dirichlet_distr.rows()) {
        for (&x, &elog) in distr_i.iter().zip(elog_i.iter()) {
            score += (prior - x) * elog;
            score += ln_gamma(x) - ln_gamma_prior;
        }
        score += ln_gamma_prior_tot - ln_gamma(distr_i.sum());
    }
    score
}

/// `log Σ exp(x)` with the maximum pulled out
fn log_sum_exp<I: Iterator<Item = f64> + Clone>(xx: I) -> f64 {
    let x_max = xx.clone().fold(f64::NEG_INFINITY, f64::max);
    if !x_max.is_finite() {
        return x_max;
    }
    x_max + xx.map(|x| (x - x_max).exp()).sum::<f64>().ln()
}

/// Approximate variational bound of the corpus under the model
/// * `corpus` - `N x V` counts
/// * `doc_topic` - γ, `N x K`
/// * `model` - topic-word model
/// * `sub_sampling` - `Some(total_samples)` scales the document part
///   up to a corpus of that many documents
pub fn approx_bound<C>(
    corpus: &C,
    doc_topic: &Array2<f64>,
    model: &TopicWordModel,
    sub_sampling: Option<f64>,
) -> f64
where
    C: CountMatrix + ?Sized,
{
    let ndocs = corpus.num_docs();
    let n_topics = model.n_topics();
    debug_assert_eq!(doc_topic.dim(), (ndocs, n_topics));

    let priors = model.priors();
    let dirichlet_doc_topic = doc_topic.log_dirichlet_expectation();
    let dirichlet_component = model.dirichlet_component();

    // E[log p(docs | θ, β)], summed in row order
    let doc_scores: Vec<f64> = (0..ndocs)
        .into_par_iter()
        .map(|d| {
            let doc = corpus.doc_words(d);
            let elog_theta_d = dirichlet_doc_topic.row(d);
            doc.ids
                .iter()
                .zip(doc.counts.iter())
                .map(|(&w, &n)| {
                    let norm_phi = log_sum_exp(
                        elog_theta_d
                            .iter()
                            .zip(dirichlet_component.column(w))
                            .map(|(&a, &b)| a + b),
                    );
                    n * norm_phi
                })
                .sum::<f64>()
        })
        .collect();

    let mut score: f64 = doc_scores.iter().sum();

    score += dirichlet_log_likelihood(
        priors.doc_topic,
        doc_topic,
        &dirichlet_doc_topic,
        n_topics,
    );

    if let Some(total_samples) = sub_sampling {
        score *= total_samples / ndocs.max(1) as f64;
    }

    score += dirichlet_log_likelihood(
        priors.topic_word,
        model.components(),
        dirichlet_component,
        model.n_words(),
    );

    score
}

/// `exp(-bound / word_count)`
pub fn perplexity_from_bound(bound: f64, word_count: f64) -> f64 {
    (-bound / word_count).exp()
}

/// Word count used to normalize the bound; scaled like the bound
/// under sub-sampling
pub fn effective_word_count<C>(corpus: &C, sub_sampling: Option<f64>) -> f64
where
    C: CountMatrix + ?Sized,
{
    let word_count = corpus.total_count();
    match sub_sampling {
        Some(total_samples) => word_count * total_samples / corpus.num_docs().max(1) as f64,
        None => word_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_inference::InferenceMode;
    use crate::estep::{e_step, EStepControls};
    use crate::doc_inference::DocControls;
    use crate::model::{LearningSchedule, Priors};
    use approx::assert_abs_diff_eq;

    fn toy() -> (Array2<f64>, TopicWordModel) {
        let corpus = array![[2., 0., 1., 0.], [0., 3., 0., 1.], [1., 1., 1., 1.]];
        let model = TopicWordModel::from_components(
            array![[3.0, 0.5, 2.0, 0.5], [0.5, 4.0, 0.5, 2.0]],
            Priors {
                doc_topic: 0.5,
                topic_word: 0.5,
            },
            LearningSchedule {
                decay: 0.7,
                offset: 10.,
            },
        )
        .unwrap();
        (corpus, model)
    }

    fn gamma_of(corpus: &Array2<f64>, model: &TopicWordModel) -> Array2<f64> {
        let controls = EStepControls {
            doc: DocControls {
                max_iters: 100,
                mean_change_tol: 1e-6,
            },
            n_jobs: Some(2),
        };
        e_step(corpus, model, &controls, InferenceMode::Deterministic)
    }

    #[test]
    fn log_sum_exp_is_stable() {
        let xx = [1000.0, 1000.0];
        assert_abs_diff_eq!(
            log_sum_exp(xx.iter().cloned()),
            1000.0 + 2f64.ln(),
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            log_sum_exp([0.1f64, -2.0, 0.5].iter().cloned()),
            (0.1f64.exp() + (-2f64).exp() + 0.5f64.exp()).ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn prior_equal_to_posterior_has_no_divergence() {
        // Dirichlet(prior) against itself: zero KL
        let distr = Array2::from_elem((3, 4), 0.7);
        let elog = distr.log_dirichlet_expectation();
        assert_abs_diff_eq!(
            dirichlet_log_likelihood(0.7, &distr, &elog, 4),
            0.0,
            epsilon = 1e-10
        );
        // anything else is a negative expected log ratio
        let other = array![[0.2, 3.0, 1.0, 0.9]];
        let elog = other.log_dirichlet_expectation();
        assert!(dirichlet_log_likelihood(0.7, &other, &elog, 4) < 0.0);
    }

    #[test]
    fn perplexity_is_at_least_one() {
        let (corpus, model) = toy();
        let gamma = gamma_of(&corpus, &model);
        let bound = approx_bound(&corpus, &gamma, &model, None);
        assert!(bound.is_finite() && bound < 0.0);

        let perp = perplexity_from_bound(bound, effective_word_count(&corpus, None));
        assert!(perp.is_finite() && perp >= 1.0);
    }

    #[test]
    fn sub_sampling_scales_the_document_part() {
        let (corpus, model) = toy();
        let gamma = gamma_of(&corpus, &model);
        let topic_word_part = dirichlet_log_likelihood(
            0.5,
            model.components(),
            model.dirichlet_component(),
            4,
        );

        let full = approx_bound(&corpus, &gamma, &model, None);
        let scaled = approx_bound(&corpus, &gamma, &model, Some(30.0));
        assert_abs_diff_eq!(
            scaled - topic_word_part,
            10.0 * (full - topic_word_part),
            epsilon = 1e-8
        );
        assert_eq!(effective_word_count(&corpus, Some(30.0)), 130.0);
    }
}
