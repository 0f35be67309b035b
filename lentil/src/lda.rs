//! Latent Dirichlet Allocation estimator with batch and online
//! variational Bayes.
//!
//! Batch learning alternates one E-step over the whole corpus with a
//! full replacement of the topic-word parameters. Online learning
//! walks mini-batches and blends each mini-batch estimate into the
//! running parameters with a decaying step size (Hoffman, Blei & Bach,
//! 2010).

use crate::bound::{approx_bound, effective_word_count, perplexity_from_bound};
use crate::config::{LdaConfig, LearningMethod};
use crate::corpus::CountMatrix;
use crate::doc_inference::{DocControls, InferenceMode};
use crate::error::LdaError;
use crate::estep::{e_step, e_step_with_stats, EStepControls};
use crate::model::{MStep, TopicWordModel};

use indicatif::{ProgressBar, ProgressDrawTarget};
use log::{debug, info};
use matrix_util::traits::MatOps;
use matrix_util::utils::generate_minibatch_intervals;
use ndarray::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub struct LatentDirichletAllocation {
    config: LdaConfig,
    model: Option<TopicWordModel>,
    rng: SmallRng,
    perplexity_trace: Vec<f64>,
}

fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

impl LatentDirichletAllocation {
    pub fn new(config: LdaConfig) -> Self {
        let rng = seeded_rng(config.seed);
        Self {
            config,
            model: None,
            rng,
            perplexity_trace: vec![],
        }
    }

    pub fn with_topics(n_topics: usize) -> Self {
        Self::new(LdaConfig::with_topics(n_topics))
    }

    /// Start from a topic-word model estimated elsewhere, e.g., to
    /// `transform` new documents or continue with `partial_fit`.
    /// The number of topics follows the model.
    pub fn from_model(mut config: LdaConfig, model: TopicWordModel) -> Self {
        config.n_topics = model.n_topics();
        let mut ret = Self::new(config);
        ret.model = Some(model);
        ret
    }

    /// Learn the topic-word model from scratch.
    ///
    /// Online learning takes `max_iter` passes over mini-batches of
    /// `batch_size` documents, batch learning `max_iter` full updates.
    /// With `evaluate_every > 0`, perplexity of the corpus is checked
    /// every that many passes, and training stops once it changes by
    /// less than `perp_tol`.
    pub fn fit<C>(&mut self, corpus: &C) -> Result<&mut Self, LdaError>
    where
        C: CountMatrix,
    {
        self.config.validate()?;
        corpus.check_nonnegative("LatentDirichletAllocation.fit")?;
        let ndocs = corpus.num_docs();
        if ndocs == 0 {
            return Err(LdaError::EmptyCorpus("LatentDirichletAllocation.fit"));
        }
        // perplexity is undefined without words
        let word_count = corpus.total_count();
        if self.config.evaluate_every > 0 && !(word_count > 0.0) {
            return Err(LdaError::EmptyCorpus("LatentDirichletAllocation.fit"));
        }

        self.init_model(corpus.num_words())?;
        self.perplexity_trace.clear();

        let config = self.config.clone();
        let batches = generate_minibatch_intervals(ndocs, config.batch_size);

        let pb = ProgressBar::new(config.max_iter as u64);
        if !config.show_progress || config.verbose {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }

        let mut last_perplexity: Option<f64> = None;

        for epoch in 0..config.max_iter {
            match config.learning_method {
                LearningMethod::Online => {
                    for &(lb, ub) in batches.iter() {
                        let doc_ratio = config.doc_ratio(ndocs as f64, ub - lb);
                        self.em_step(&corpus.docs(lb, ub), MStep::Online { doc_ratio })?;
                    }
                }
                LearningMethod::Batch => {
                    self.em_step(corpus, MStep::Batch)?;
                }
            }
            pb.inc(1);

            if config.evaluate_every > 0 && (epoch + 1) % config.evaluate_every == 0 {
                let model = self.model.as_ref().ok_or(LdaError::NotFitted)?;
                let doc_topic = e_step(
                    corpus,
                    model,
                    &self.estep_controls(),
                    InferenceMode::Deterministic,
                );
                let bound = approx_bound(corpus, &doc_topic, model, None);
                let perplexity = perplexity_from_bound(bound, word_count);
                self.perplexity_trace.push(perplexity);

                if config.verbose {
                    info!("iteration: {}, perplexity: {:.4}", epoch + 1, perplexity);
                }

                if let Some(last) = last_perplexity {
                    if (last - perplexity).abs() < config.perp_tol {
                        debug!("converged after {} passes", epoch + 1);
                        break;
                    }
                }
                last_perplexity = Some(perplexity);
            }
        }

        pb.finish_and_clear();
        Ok(self)
    }

    /// One online pass over mini-batches of the corpus, treating it as
    /// a sample of `total_samples` documents. The model is created on
    /// the first call and kept across calls.
    pub fn partial_fit<C>(&mut self, corpus: &C) -> Result<&mut Self, LdaError>
    where
        C: CountMatrix,
    {
        self.config.validate()?;
        corpus.check_nonnegative("LatentDirichletAllocation.partial_fit")?;
        let ndocs = corpus.num_docs();
        if ndocs == 0 {
            return Err(LdaError::EmptyCorpus("LatentDirichletAllocation.partial_fit"));
        }

        match self.model.as_ref() {
            Some(model) if model.n_words() != corpus.num_words() => {
                return Err(LdaError::dimension_mismatch(
                    model.n_words(),
                    corpus.num_words(),
                ));
            }
            Some(_) => {}
            None => self.init_model(corpus.num_words())?,
        }

        let total_samples = self.config.total_samples;
        for (lb, ub) in generate_minibatch_intervals(ndocs, self.config.batch_size) {
            let doc_ratio = self.config.doc_ratio(total_samples, ub - lb);
            self.em_step(&corpus.docs(lb, ub), MStep::Online { doc_ratio })?;
        }

        if self.config.verbose {
            let n_iter = self.model.as_ref().map(|m| m.n_iter()).unwrap_or_default();
            info!("partial fit on {} documents, n_iter: {}", ndocs, n_iter);
        }
        Ok(self)
    }

    /// Unnormalized document-topic distribution γ, `N x K`
    pub fn transform<C>(&self, corpus: &C) -> Result<Array2<f64>, LdaError>
    where
        C: CountMatrix,
    {
        let model = self.fitted_model()?;
        corpus.check_nonnegative("LatentDirichletAllocation.transform")?;
        if corpus.num_words() != model.n_words() {
            return Err(LdaError::dimension_mismatch(
                model.n_words(),
                corpus.num_words(),
            ));
        }
        Ok(e_step(
            corpus,
            model,
            &self.estep_controls(),
            InferenceMode::Deterministic,
        ))
    }

    pub fn fit_transform<C>(&mut self, corpus: &C) -> Result<Array2<f64>, LdaError>
    where
        C: CountMatrix,
    {
        self.fit(corpus)?;
        self.transform(corpus)
    }

    /// Approximate log-likelihood (variational bound) of the corpus
    pub fn score<C>(&self, corpus: &C) -> Result<f64, LdaError>
    where
        C: CountMatrix,
    {
        corpus.check_nonnegative("LatentDirichletAllocation.score")?;
        let doc_topic = self.transform(corpus)?;
        Ok(approx_bound(corpus, &doc_topic, self.fitted_model()?, None))
    }

    /// `exp(-bound / word count)`
    /// * `corpus` - `N x V` counts
    /// * `doc_topic` - γ (`N x K`); inferred by `transform` if `None`
    /// * `sub_sampling` - treat the corpus as a sample of
    ///   `total_samples` documents
    pub fn perplexity<C>(
        &self,
        corpus: &C,
        doc_topic: Option<&Array2<f64>>,
        sub_sampling: bool,
    ) -> Result<f64, LdaError>
    where
        C: CountMatrix,
    {
        let model = self.fitted_model()?;
        corpus.check_nonnegative("LatentDirichletAllocation.perplexity")?;

        let inferred;
        let doc_topic = match doc_topic {
            Some(doc_topic) => {
                if doc_topic.nrows() != corpus.num_docs() {
                    return Err(LdaError::ShapeMismatch(format!(
                        "Number of samples in the corpus ({}) and doc_topic ({}) does not match",
                        corpus.num_docs(),
                        doc_topic.nrows()
                    )));
                }
                if doc_topic.ncols() != model.n_topics() {
                    return Err(LdaError::ShapeMismatch(format!(
                        "Number of topics does not match: {} vs. {}",
                        doc_topic.ncols(),
                        model.n_topics()
                    )));
                }
                doc_topic
            }
            None => {
                inferred = self.transform(corpus)?;
                &inferred
            }
        };

        if corpus.num_words() != model.n_words() {
            return Err(LdaError::dimension_mismatch(
                model.n_words(),
                corpus.num_words(),
            ));
        }

        let sub_sampling = sub_sampling.then_some(self.config.total_samples);
        let word_count = effective_word_count(corpus, sub_sampling);
        if !(word_count > 0.0) {
            return Err(LdaError::EmptyCorpus("LatentDirichletAllocation.perplexity"));
        }

        let bound = approx_bound(corpus, doc_topic, model, sub_sampling);
        Ok(perplexity_from_bound(bound, word_count))
    }

    /// λ, `K x V`
    pub fn components(&self) -> Result<&Array2<f64>, LdaError> {
        Ok(self.fitted_model()?.components())
    }

    /// `exp(E[log β])`, `K x V`
    pub fn exp_dirichlet_component(&self) -> Result<&Array2<f64>, LdaError> {
        Ok(self.fitted_model()?.exp_dirichlet_component())
    }

    /// Number of M-steps taken plus one
    pub fn n_iter(&self) -> Result<usize, LdaError> {
        Ok(self.fitted_model()?.n_iter())
    }

    pub fn n_topics(&self) -> usize {
        self.config.n_topics
    }

    /// Perplexity at each evaluation of the last `fit`
    pub fn perplexity_trace(&self) -> &[f64] {
        &self.perplexity_trace
    }

    pub fn model(&self) -> Option<&TopicWordModel> {
        self.model.as_ref()
    }

    pub fn config(&self) -> &LdaConfig {
        &self.config
    }

    /// `E[β]`: each topic's word distribution, rows summing to one
    pub fn topic_word_distribution(&self) -> Result<Array2<f64>, LdaError> {
        Ok(self.components()?.sum_to_one_rows())
    }

    /// Indices of the `n` heaviest words of each topic, heaviest first
    pub fn top_words(&self, n: usize) -> Result<Vec<Vec<usize>>, LdaError> {
        let components = self.components()?;
        Ok(components
            .rows()
            .into_iter()
            .map(|lambda_k| {
                let mut words: Vec<usize> = (0..lambda_k.len()).collect();
                words.sort_by(|&a, &b| lambda_k[b].total_cmp(&lambda_k[a]));
                words.truncate(n);
                words
            })
            .collect())
    }

    fn fitted_model(&self) -> Result<&TopicWordModel, LdaError> {
        self.model.as_ref().ok_or(LdaError::NotFitted)
    }

    fn estep_controls(&self) -> EStepControls {
        EStepControls {
            doc: DocControls {
                max_iters: self.config.max_doc_update_iter,
                mean_change_tol: self.config.mean_change_tol,
            },
            n_jobs: self.config.n_jobs,
        }
    }

    /// Fresh generator and random `Gamma(100, 0.01)` topic-word
    /// parameters
    fn init_model(&mut self, n_words: usize) -> Result<(), LdaError> {
        self.rng = seeded_rng(self.config.seed);
        let model = TopicWordModel::random(
            self.config.n_topics,
            n_words,
            self.config.priors(),
            self.config.schedule(),
            &mut self.rng,
        )
        .map_err(|e| LdaError::invalid_parameter("components", e))?;
        debug!(
            "initialized {} topics over {} words",
            model.n_topics(),
            model.n_words()
        );
        self.model = Some(model);
        Ok(())
    }

    /// E-step in training mode and M-step
    fn em_step<C>(&mut self, corpus: &C, step: MStep) -> Result<(), LdaError>
    where
        C: CountMatrix + ?Sized,
    {
        let mode = InferenceMode::training(self.rng.random())?;
        let controls = self.estep_controls();
        let model = self.model.as_mut().ok_or(LdaError::NotFitted)?;
        let (_, suff_stats) = e_step_with_stats(corpus, model, &controls, mode);
        model.update(suff_stats, step);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_corpus() -> Array2<f64> {
        array![[2., 0., 1., 0.], [0., 3., 0., 1.], [1., 1., 1., 1.]]
    }

    #[test]
    fn top_words_are_sorted() -> anyhow::Result<()> {
        let mut lda = LatentDirichletAllocation::new(LdaConfig {
            n_topics: 2,
            seed: Some(1),
            ..Default::default()
        });
        lda.fit(&toy_corpus())?;
        let top = lda.top_words(3)?;
        let components = lda.components()?;
        assert_eq!(top.len(), 2);
        for (k, words) in top.iter().enumerate() {
            assert_eq!(words.len(), 3);
            for pair in words.windows(2) {
                assert!(components[(k, pair[0])] >= components[(k, pair[1])]);
            }
        }
        Ok(())
    }

    #[test]
    fn topic_word_distribution_rows_sum_to_one() -> anyhow::Result<()> {
        let mut lda = LatentDirichletAllocation::with_topics(3);
        lda.fit(&toy_corpus())?;
        for row_sum in lda.topic_word_distribution()?.sum_axis(Axis(1)) {
            assert!((row_sum - 1.0).abs() < 1e-10);
        }
        Ok(())
    }

    #[test]
    fn from_model_takes_the_number_of_topics() -> anyhow::Result<()> {
        let mut fitted = LatentDirichletAllocation::with_topics(3);
        fitted.fit(&toy_corpus())?;
        let model = fitted.model().cloned().ok_or(LdaError::NotFitted)?;

        let lda = LatentDirichletAllocation::from_model(LdaConfig::with_topics(7), model);
        assert_eq!(lda.n_topics(), 3);
        assert_eq!(lda.config().n_topics, 3);
        assert_eq!(lda.transform(&toy_corpus())?.ncols(), 3);
        Ok(())
    }

    #[test]
    fn accessors_fail_before_fit() {
        let lda = LatentDirichletAllocation::with_topics(2);
        assert_eq!(lda.components().err(), Some(LdaError::NotFitted));
        assert_eq!(lda.n_iter().err(), Some(LdaError::NotFitted));
        assert!(lda.model().is_none());
        assert!(lda.perplexity_trace().is_empty());
    }
}
