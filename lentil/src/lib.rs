//! Latent Dirichlet Allocation fitted by batch and online variational
//! Bayes.

pub mod bound;
pub mod config;
pub mod corpus;
pub mod corpus_io;
pub mod dirichlet;
pub mod doc_inference;
pub mod error;
pub mod estep;
pub mod lda;
pub mod model;
pub mod simulate;

pub use config::{DocRatio, LdaConfig, LearningMethod};
pub use corpus::CountMatrix;
pub use error::LdaError;
pub use lda::LatentDirichletAllocation;
