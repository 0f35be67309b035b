//! Synthetic corpora drawn from the LDA generative model.

use indicatif::ParallelProgressIterator;
use log::info;
use matrix_util::mtx_io::write_mtx_triplets;
use matrix_util::traits::*;
use nalgebra_sparse::CsrMatrix;
use ndarray::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Poisson};
use rayon::prelude::*;

pub struct SimArgs {
    pub docs: usize,
    pub words: usize,
    pub topics: usize,
    /// expected number of words per document
    pub depth: usize,
    /// document-topic concentration
    pub alpha: f64,
    /// topic-word concentration
    pub eta: f64,
    pub rseed: u64,
}

pub struct SimOut {
    /// β, `K x V`, rows sum to one
    pub topic_word: Array2<f64>,
    /// θ, `N x K`, rows sum to one
    pub doc_topic: Array2<f64>,
    /// 0-based `(doc, word, count)` sorted by document, then word
    pub triplets: Vec<(u64, u64, f64)>,
}

impl SimOut {
    pub fn to_corpus(&self, args: &SimArgs) -> anyhow::Result<CsrMatrix<f64>> {
        CsrMatrix::<f64>::from_nonzero_triplets(args.docs, args.words, self.triplets.clone())
    }
}

/// Sample a corpus
///
/// ```text
/// β(k,·) ~ Dirichlet(η)
/// θ(d,·) ~ Dirichlet(α)
/// Y(d,w) ~ Poisson( depth * Σ_k θ(d,k) β(k,w) )
/// ```
///
/// Dirichlet draws are normalized `Gamma(concentration, 1)` vectors.
pub fn generate_lda_data(args: &SimArgs) -> anyhow::Result<SimOut> {
    let (nn, vv, kk) = (args.docs, args.words, args.topics);
    if kk == 0 || vv == 0 {
        return Err(anyhow::anyhow!("need at least one topic and one word"));
    }

    let mut rng = StdRng::seed_from_u64(args.rseed);
    let topic_word = Array2::<f64>::rgamma(kk, vv, (args.eta, 1.0), &mut rng)?.sum_to_one_rows();
    let doc_topic = Array2::<f64>::rgamma(nn, kk, (args.alpha, 1.0), &mut rng)?.sum_to_one_rows();

    let depth = args.depth as f64;
    let rseed = args.rseed;

    let mut triplets = (0..nn)
        .into_par_iter()
        .progress_count(nn as u64)
        .map(|d| {
            let mut rng = StdRng::seed_from_u64(rseed.wrapping_add(d as u64 + 1));
            let lambda_d = doc_topic.row(d).dot(&topic_word) * depth;
            lambda_d
                .iter()
                .enumerate()
                .filter_map(|(w, &l_dw)| {
                    let y_dw: f64 = Poisson::new(l_dw).ok()?.sample(&mut rng);
                    (y_dw > 0.0).then_some((d as u64, w as u64, y_dw))
                })
                .collect::<Vec<_>>()
        })
        .flatten()
        .collect::<Vec<_>>();

    triplets.sort_by_key(|&(d, w, _)| (d, w));

    info!(
        "sampled {} documents with {} non-zero elements",
        nn,
        triplets.len()
    );

    Ok(SimOut {
        topic_word,
        doc_topic,
        triplets,
    })
}

/// Sample a corpus and write it down
/// * `mtx_file` - documents by words (.mtx.gz recommended)
/// * `topic_word_file` - true β
/// * `doc_topic_file` - true θ
pub fn generate_lda_data_mtx(
    args: &SimArgs,
    mtx_file: &str,
    topic_word_file: &str,
    doc_topic_file: &str,
) -> anyhow::Result<()> {
    let sim = generate_lda_data(args)?;

    sim.topic_word.to_tsv(topic_word_file)?;
    sim.doc_topic.to_tsv(doc_topic_file)?;
    info!(
        "wrote parameter files: {}, {}",
        topic_word_file, doc_topic_file
    );

    write_mtx_triplets(&sim.triplets, args.docs, args.words, mtx_file)?;
    info!("wrote the count matrix: {}", mtx_file);
    Ok(())
}
