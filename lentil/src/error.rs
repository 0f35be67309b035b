//! Error types of the topic model estimator.

use thiserror::Error;

/// Errors returned by [`crate::lda::LatentDirichletAllocation`].
///
/// All of them are detected before any model state is touched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LdaError {
    /// A hyperparameter is out of its domain.
    #[error("Invalid '{name}' parameter: {value}")]
    InvalidParameter {
        /// Name of the parameter
        name: &'static str,
        /// Offending value, formatted
        value: String,
    },

    /// Count data must be nonnegative and finite.
    #[error("Negative values in data passed to {whom}: ({row}, {col}) = {value}")]
    NegativeCount {
        /// Operation that received the data
        whom: &'static str,
        /// Document (row) index
        row: usize,
        /// Word (column) index
        col: usize,
        /// Offending count
        value: f64,
    },

    /// Vocabulary size differs from the fitted model.
    #[error("The provided data has {actual} dimensions while the model was trained with feature size {expected}")]
    DimensionMismatch {
        /// Vocabulary size of the model
        expected: usize,
        /// Vocabulary size of the data
        actual: usize,
    },

    /// A document-topic matrix does not line up with the corpus or model.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Nothing to learn from or to score.
    #[error("Empty corpus passed to {0}")]
    EmptyCorpus(&'static str),

    /// Inference or scoring before any model exists.
    #[error("no topic-word model yet; fit the model first")]
    NotFitted,
}

impl LdaError {
    pub fn invalid_parameter(name: &'static str, value: impl std::fmt::Display) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
        }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = LdaError::invalid_parameter("n_topics", 0);
        assert_eq!(err.to_string(), "Invalid 'n_topics' parameter: 0");

        let err = LdaError::dimension_mismatch(4, 5);
        assert!(err.to_string().contains("5 dimensions"));
        assert!(err.to_string().contains("feature size 4"));

        let err: anyhow::Error = LdaError::NotFitted.into();
        assert!(err.to_string().contains("fit the model first"));
    }
}
