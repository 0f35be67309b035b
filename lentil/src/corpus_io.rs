//! Load document-term count matrices from files.

use crate::corpus::{CountMatrix, DocWords};
use log::info;
use matrix_util::common_io::{file_ext, Delimiter};
use matrix_util::mtx_io::{read_mtx_triplets, write_mtx_triplets};
use matrix_util::traits::{IoOps, MatTriplets};
use nalgebra_sparse::CsrMatrix;
use ndarray::prelude::*;

/// A corpus loaded from a file: sparse from `.mtx`, dense from
/// delimited text
pub enum CorpusData {
    Sparse(CsrMatrix<f64>),
    Dense(Array2<f64>),
}

impl CorpusData {
    /// Read a corpus, documents in rows unless `docs_in_columns`
    /// * `data_file` - `.mtx`, `.tsv`, `.csv` or `.txt`, possibly gzipped
    /// * `docs_in_columns` - the file holds a word by document matrix
    pub fn read_file(data_file: &str, docs_in_columns: bool) -> anyhow::Result<Self> {
        let ext = file_ext(data_file)?;
        let ret = match ext.as_ref() {
            "mtx" => {
                let (triplets, (nrow, ncol, _)) = read_mtx_triplets(data_file)?;
                let (nrow, ncol, triplets) = if docs_in_columns {
                    let flipped = triplets.into_iter().map(|(i, j, x)| (j, i, x)).collect();
                    (ncol, nrow, flipped)
                } else {
                    (nrow, ncol, triplets)
                };
                CorpusData::Sparse(CsrMatrix::<f64>::from_nonzero_triplets(nrow, ncol, triplets)?)
            }
            "tsv" | "csv" | "txt" => {
                let delim: Delimiter = match ext.as_ref() {
                    "tsv" => "\t".into(),
                    "csv" => ",".into(),
                    _ => Delimiter::Whitespace,
                };
                let xx = Array2::<f64>::read_file_delim(data_file, delim, None)?;
                let xx = if docs_in_columns {
                    xx.t().as_standard_layout().into_owned()
                } else {
                    xx
                };
                CorpusData::Dense(xx)
            }
            _ => {
                return Err(anyhow::anyhow!(
                    "unknown corpus format: {} (expected mtx, tsv, csv or txt)",
                    data_file
                ))
            }
        };

        info!(
            "read {} documents x {} words from {}",
            ret.num_docs(),
            ret.num_words(),
            data_file
        );
        Ok(ret)
    }

    /// Write the documents (rows) as a MatrixMarket file
    pub fn to_mtx(&self, mtx_file: &str) -> anyhow::Result<()> {
        let (nrow, ncol, triplets) = match self {
            CorpusData::Sparse(x) => x.to_nonzero_triplets()?,
            CorpusData::Dense(x) => x.to_nonzero_triplets()?,
        };
        let triplets = triplets
            .into_iter()
            .map(|(i, j, x)| (i as u64, j as u64, x))
            .collect::<Vec<_>>();
        write_mtx_triplets(&triplets, nrow, ncol, mtx_file)
    }
}

impl CountMatrix for CorpusData {
    fn num_docs(&self) -> usize {
        match self {
            CorpusData::Sparse(x) => x.num_docs(),
            CorpusData::Dense(x) => x.num_docs(),
        }
    }

    fn num_words(&self) -> usize {
        match self {
            CorpusData::Sparse(x) => x.num_words(),
            CorpusData::Dense(x) => x.num_words(),
        }
    }

    fn doc_words(&self, d: usize) -> DocWords {
        match self {
            CorpusData::Sparse(x) => x.doc_words(d),
            CorpusData::Dense(x) => x.doc_words(d),
        }
    }

    fn find_invalid_count(&self) -> Option<(usize, usize, f64)> {
        match self {
            CorpusData::Sparse(x) => x.find_invalid_count(),
            CorpusData::Dense(x) => x.find_invalid_count(),
        }
    }

    fn total_count(&self) -> f64 {
        match self {
            CorpusData::Sparse(x) => x.total_count(),
            CorpusData::Dense(x) => x.total_count(),
        }
    }
}
