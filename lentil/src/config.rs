//! Hyperparameters of the estimator.

use crate::error::LdaError;
use crate::model::{LearningSchedule, Priors};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[clap(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LearningMethod {
    /// Use all the documents in every update
    Batch,
    /// Update on mini-batches of documents
    #[default]
    Online,
}

impl FromStr for LearningMethod {
    type Err = LdaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "batch" => Ok(Self::Batch),
            "online" => Ok(Self::Online),
            _ => Err(LdaError::invalid_parameter("learning_method", s)),
        }
    }
}

/// Which count divides `total_samples` in the online update
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocRatio {
    /// Number of documents in the current mini-batch; the short last
    /// mini-batch of an epoch gets a larger ratio
    #[default]
    BatchRows,
    /// The configured `batch_size`, whatever the mini-batch holds,
    /// capped at the number of samples so that a single mini-batch
    /// covering the whole corpus gets a ratio of one
    BatchSize,
}

/// All the knobs of [`crate::lda::LatentDirichletAllocation`].
///
/// Missing fields of a JSON configuration take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LdaConfig {
    pub n_topics: usize,
    /// α; `1 / n_topics` if not given
    pub doc_topic_prior: Option<f64>,
    /// η; `1 / n_topics` if not given
    pub topic_word_prior: Option<f64>,
    pub learning_method: LearningMethod,
    pub learning_decay: f64,
    pub learning_offset: f64,
    /// number of passes over the data in `fit`
    pub max_iter: usize,
    pub batch_size: usize,
    /// evaluate perplexity every this many epochs in `fit` (0: never)
    pub evaluate_every: usize,
    /// corpus size assumed by `partial_fit`
    pub total_samples: f64,
    pub perp_tol: f64,
    pub mean_change_tol: f64,
    pub max_doc_update_iter: usize,
    /// number of row slices of an E-step; the rayon pool size if not given
    pub n_jobs: Option<usize>,
    pub seed: Option<u64>,
    pub verbose: bool,
    pub show_progress: bool,
    pub doc_ratio: DocRatio,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            n_topics: 10,
            doc_topic_prior: None,
            topic_word_prior: None,
            learning_method: LearningMethod::Online,
            learning_decay: 0.7,
            learning_offset: 10.0,
            max_iter: 10,
            batch_size: 128,
            evaluate_every: 0,
            total_samples: 1e6,
            perp_tol: 1e-1,
            mean_change_tol: 1e-3,
            max_doc_update_iter: 100,
            n_jobs: None,
            seed: None,
            verbose: false,
            show_progress: false,
            doc_ratio: DocRatio::BatchRows,
        }
    }
}

impl LdaConfig {
    pub fn with_topics(n_topics: usize) -> Self {
        Self {
            n_topics,
            ..Default::default()
        }
    }

    /// Read a JSON file, e.g., `{"n_topics": 20, "learning_method": "batch"}`
    pub fn from_json_file(json_file: &str) -> anyhow::Result<Self> {
        let reader = matrix_util::common_io::open_buf_reader(json_file)?;
        let config: Self = serde_json::from_reader(reader)
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", json_file, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file(&self, json_file: &str) -> anyhow::Result<()> {
        let mut writer = matrix_util::common_io::open_buf_writer(json_file)?;
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Check every hyperparameter before touching any model state
    pub fn validate(&self) -> Result<(), LdaError> {
        if self.n_topics == 0 {
            return Err(LdaError::invalid_parameter("n_topics", self.n_topics));
        }
        if !(self.total_samples.is_finite() && self.total_samples > 0.0) {
            return Err(LdaError::invalid_parameter(
                "total_samples",
                self.total_samples,
            ));
        }
        if !(self.learning_offset >= 0.0) {
            return Err(LdaError::invalid_parameter(
                "learning_offset",
                self.learning_offset,
            ));
        }
        if !self.learning_decay.is_finite() {
            return Err(LdaError::invalid_parameter(
                "learning_decay",
                self.learning_decay,
            ));
        }
        if self.batch_size == 0 {
            return Err(LdaError::invalid_parameter("batch_size", self.batch_size));
        }
        if self.n_jobs == Some(0) {
            return Err(LdaError::invalid_parameter("n_jobs", 0));
        }
        for (name, prior) in [
            ("doc_topic_prior", self.doc_topic_prior),
            ("topic_word_prior", self.topic_word_prior),
        ] {
            if let Some(x) = prior {
                if !(x.is_finite() && x > 0.0) {
                    return Err(LdaError::invalid_parameter(name, x));
                }
            }
        }
        for (name, tol) in [
            ("perp_tol", self.perp_tol),
            ("mean_change_tol", self.mean_change_tol),
        ] {
            if !(tol >= 0.0) {
                return Err(LdaError::invalid_parameter(name, tol));
            }
        }
        Ok(())
    }

    /// Resolve the priors, `1/K` for the unspecified ones
    pub fn priors(&self) -> Priors {
        let default_prior = 1.0 / self.n_topics.max(1) as f64;
        Priors {
            doc_topic: self.doc_topic_prior.unwrap_or(default_prior),
            topic_word: self.topic_word_prior.unwrap_or(default_prior),
        }
    }

    pub fn schedule(&self) -> LearningSchedule {
        LearningSchedule {
            decay: self.learning_decay,
            offset: self.learning_offset,
        }
    }

    /// `total_samples / (rows of the mini-batch)`, or the nominal
    /// batch size, per [`DocRatio`]
    pub fn doc_ratio(&self, total_samples: f64, batch_rows: usize) -> f64 {
        let denom = match self.doc_ratio {
            DocRatio::BatchRows => batch_rows as f64,
            DocRatio::BatchSize => (self.batch_size as f64).min(total_samples),
        };
        total_samples / denom.max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = LdaConfig::default();
        assert!(config.validate().is_ok());
        let priors = config.priors();
        assert_eq!(priors.doc_topic, 0.1);
        assert_eq!(priors.topic_word, 0.1);
        assert_eq!(config.learning_method, LearningMethod::Online);
    }

    #[test]
    fn invalid_parameters_are_named() {
        fn bad<F: Fn(&mut LdaConfig)>(f: F) -> &'static str {
            let mut config = LdaConfig::with_topics(3);
            f(&mut config);
            match config.validate() {
                Err(LdaError::InvalidParameter { name, .. }) => name,
                other => panic!("expected an error, got {:?}", other),
            }
        }

        assert_eq!(bad(|c| c.n_topics = 0), "n_topics");
        assert_eq!(bad(|c| c.total_samples = 0.0), "total_samples");
        assert_eq!(bad(|c| c.total_samples = f64::NAN), "total_samples");
        assert_eq!(bad(|c| c.learning_offset = -1.0), "learning_offset");
        assert_eq!(bad(|c| c.batch_size = 0), "batch_size");
        assert_eq!(bad(|c| c.doc_topic_prior = Some(0.0)), "doc_topic_prior");
        assert_eq!(bad(|c| c.topic_word_prior = Some(-0.1)), "topic_word_prior");
        assert_eq!(bad(|c| c.perp_tol = -1.0), "perp_tol");
        assert_eq!(bad(|c| c.n_jobs = Some(0)), "n_jobs");
    }

    #[test]
    fn learning_method_from_str() {
        assert_eq!("batch".parse::<LearningMethod>(), Ok(LearningMethod::Batch));
        assert_eq!("Online".parse::<LearningMethod>(), Ok(LearningMethod::Online));
        assert!(matches!(
            "gibbs".parse::<LearningMethod>(),
            Err(LdaError::InvalidParameter {
                name: "learning_method",
                ..
            })
        ));
    }

    #[test]
    fn doc_ratio_denominator() {
        let mut config = LdaConfig::with_topics(2);
        config.batch_size = 4;
        assert_eq!(config.doc_ratio(10.0, 2), 5.0);
        config.doc_ratio = DocRatio::BatchSize;
        assert_eq!(config.doc_ratio(10.0, 2), 2.5);

        // one mini-batch larger than the corpus holds all of it
        config.batch_size = 128;
        assert_eq!(config.doc_ratio(3.0, 3), 1.0);
        assert_eq!(config.doc_ratio(1000.0, 128), 1000.0 / 128.0);
    }

    #[test]
    fn json_fills_in_defaults() -> anyhow::Result<()> {
        let config: LdaConfig = serde_json::from_str(
            r#"{"n_topics": 3, "learning_method": "batch", "doc_ratio": "batch_size", "seed": 7}"#,
        )?;
        assert_eq!(config.n_topics, 3);
        assert_eq!(config.learning_method, LearningMethod::Batch);
        assert_eq!(config.doc_ratio, DocRatio::BatchSize);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_iter, 10);

        let json_file = matrix_util::common_io::create_temp_dir_file(".json")?;
        let json_file = json_file.to_str().unwrap();
        config.to_json_file(json_file)?;
        assert_eq!(LdaConfig::from_json_file(json_file)?, config);
        matrix_util::common_io::remove_file(json_file)?;
        Ok(())
    }
}
