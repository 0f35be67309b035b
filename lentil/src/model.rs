//! The global topic-word model and its M-step.

use crate::dirichlet::DirichletOps;
use crate::error::LdaError;
use matrix_util::traits::SampleOps;
use ndarray::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Initial `components ~ Gamma(shape, scale)`
const INIT_GAMMA_SHAPE: f64 = 100.0;
const INIT_GAMMA_SCALE: f64 = 0.01;

/// Concentrations of the two Dirichlet priors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Priors {
    /// α: document-topic concentration
    pub doc_topic: f64,
    /// η: topic-word concentration
    pub topic_word: f64,
}

/// Step size of the online update, `ρ(t) = (offset + t)^(-decay)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningSchedule {
    /// κ, should be in `(0.5, 1]` for convergence
    pub decay: f64,
    /// τ0, down-weights early iterations
    pub offset: f64,
}

impl LearningSchedule {
    pub fn weight(&self, n_iter: usize) -> f64 {
        (self.offset + n_iter as f64).powf(-self.decay)
    }
}

/// How to fold sufficient statistics into the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MStep {
    /// `λ ← η + S`; `S` must cover the entire corpus
    Batch,
    /// `λ ← (1 - ρ) λ + ρ (η + doc_ratio * S)`
    Online { doc_ratio: f64 },
}

/// Variational topic-word parameters (λ) together with the derived
/// expectations that the E-step reads
#[derive(Debug, Clone)]
pub struct TopicWordModel {
    components: Array2<f64>,
    dirichlet_component: Array2<f64>,
    exp_dirichlet_component: Array2<f64>,
    priors: Priors,
    schedule: LearningSchedule,
    n_iter: usize,
}

impl TopicWordModel {
    /// Start from a random `K x V` matrix of `Gamma(100, 0.01)`
    /// * `n_topics` - number of topics `K`
    /// * `n_words` - vocabulary size `V`
    /// * `priors` - Dirichlet concentrations
    /// * `schedule` - online learning schedule
    /// * `rng` - random number generator
    pub fn random<R: Rng + ?Sized>(
        n_topics: usize,
        n_words: usize,
        priors: Priors,
        schedule: LearningSchedule,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        let components = Array2::<f64>::rgamma(
            n_topics,
            n_words,
            (INIT_GAMMA_SHAPE, INIT_GAMMA_SCALE),
            rng,
        )?;
        Ok(Self::new(components, priors, schedule))
    }

    /// Wrap given topic-word parameters, e.g., estimated elsewhere
    pub fn from_components(
        components: Array2<f64>,
        priors: Priors,
        schedule: LearningSchedule,
    ) -> Result<Self, LdaError> {
        if components.is_empty() {
            return Err(LdaError::ShapeMismatch(format!(
                "components must be non-empty, got {:?}",
                components.dim()
            )));
        }
        if let Some(x) = components.iter().find(|&&x| !(x.is_finite() && x > 0.0)) {
            return Err(LdaError::invalid_parameter("components", x));
        }
        Ok(Self::new(components, priors, schedule))
    }

    fn new(components: Array2<f64>, priors: Priors, schedule: LearningSchedule) -> Self {
        let dirichlet_component = components.log_dirichlet_expectation();
        let exp_dirichlet_component = dirichlet_component.mapv(f64::exp);
        Self {
            components,
            dirichlet_component,
            exp_dirichlet_component,
            priors,
            schedule,
            n_iter: 1,
        }
    }

    /// Fold the sufficient statistics of one E-step round into λ,
    /// refresh `E[log β]` and `exp(E[log β])`, and count the
    /// iteration.
    pub fn update(&mut self, suff_stats: Array2<f64>, step: MStep) {
        debug_assert_eq!(suff_stats.dim(), self.components.dim());
        let eta = self.priors.topic_word;

        match step {
            MStep::Batch => {
                let mut lambda = suff_stats;
                lambda += eta;
                self.components = lambda;
            }
            MStep::Online { doc_ratio } => {
                let rho = self.schedule.weight(self.n_iter);
                self.components
                    .zip_mut_with(&suff_stats, |lambda, &s| {
                        *lambda = (1.0 - rho) * *lambda + rho * (eta + doc_ratio * s);
                    });
            }
        }

        self.dirichlet_component = self.components.log_dirichlet_expectation();
        self.exp_dirichlet_component = self.dirichlet_component.mapv(f64::exp);
        self.n_iter += 1;
    }

    /// λ, `K x V`
    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    /// `E[log β]`, `K x V`
    pub fn dirichlet_component(&self) -> &Array2<f64> {
        &self.dirichlet_component
    }

    /// `exp(E[log β])`, `K x V`
    pub fn exp_dirichlet_component(&self) -> &Array2<f64> {
        &self.exp_dirichlet_component
    }

    pub fn priors(&self) -> Priors {
        self.priors
    }

    pub fn schedule(&self) -> LearningSchedule {
        self.schedule
    }

    /// Starts at 1 and counts the M-steps taken since then
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn n_topics(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_words(&self) -> usize {
        self.components.ncols()
    }
}
