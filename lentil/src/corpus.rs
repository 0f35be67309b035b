//! Read access to document-term count matrices.
//!
//! Documents are rows and words (vocabulary) are columns. Both dense
//! `ndarray` matrices and compressed sparse row matrices work, and so
//! does any contiguous range of rows of them.

use crate::error::LdaError;
use nalgebra_sparse::CsrMatrix;
use ndarray::prelude::*;
use ndarray::Data;

/// Nonzero words of a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocWords {
    pub ids: Vec<usize>,
    pub counts: Vec<f64>,
}

impl DocWords {
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }
}

/// A document by word count matrix that can be shared across
/// threads during inference
pub trait CountMatrix: Sync {
    fn num_docs(&self) -> usize;

    fn num_words(&self) -> usize;

    /// nonzero word indices and counts of the document `d`
    fn doc_words(&self, d: usize) -> DocWords;

    /// The first entry `(row, col, value)` that is negative or not
    /// finite, if any
    fn find_invalid_count(&self) -> Option<(usize, usize, f64)>;

    /// Sum of all the counts
    fn total_count(&self) -> f64 {
        (0..self.num_docs()).map(|d| self.doc_words(d).total()).sum()
    }

    /// Rows `[lb, ub)` as another count matrix
    fn docs(&self, lb: usize, ub: usize) -> DocRange<'_, Self>
    where
        Self: Sized,
    {
        DocRange::new(self, lb, ub)
    }

    /// Fail with a domain error naming `whom` if any count is negative
    fn check_nonnegative(&self, whom: &'static str) -> Result<(), LdaError> {
        match self.find_invalid_count() {
            Some((row, col, value)) => Err(LdaError::NegativeCount {
                whom,
                row,
                col,
                value,
            }),
            None => Ok(()),
        }
    }
}

fn is_invalid(x: f64) -> bool {
    !(x.is_finite() && x >= 0.0)
}

impl<S> CountMatrix for ArrayBase<S, Ix2>
where
    S: Data<Elem = f64> + Sync,
{
    fn num_docs(&self) -> usize {
        self.nrows()
    }

    fn num_words(&self) -> usize {
        self.ncols()
    }

    fn doc_words(&self, d: usize) -> DocWords {
        let (ids, counts) = self
            .row(d)
            .indexed_iter()
            .filter(|(_, &x)| x != 0.0)
            .map(|(w, &x)| (w, x))
            .unzip();
        DocWords { ids, counts }
    }

    fn find_invalid_count(&self) -> Option<(usize, usize, f64)> {
        self.indexed_iter()
            .find(|(_, &x)| is_invalid(x))
            .map(|((i, j), &x)| (i, j, x))
    }

    fn total_count(&self) -> f64 {
        self.sum()
    }
}

impl CountMatrix for CsrMatrix<f64> {
    fn num_docs(&self) -> usize {
        self.nrows()
    }

    fn num_words(&self) -> usize {
        self.ncols()
    }

    fn doc_words(&self, d: usize) -> DocWords {
        let row = self.row(d);
        let (ids, counts) = row
            .col_indices()
            .iter()
            .zip(row.values())
            .filter(|(_, &x)| x != 0.0)
            .map(|(&w, &x)| (w, x))
            .unzip();
        DocWords { ids, counts }
    }

    fn find_invalid_count(&self) -> Option<(usize, usize, f64)> {
        self.triplet_iter()
            .find(|(_, _, &x)| is_invalid(x))
            .map(|(i, j, &x)| (i, j, x))
    }

    fn total_count(&self) -> f64 {
        self.values().iter().sum()
    }
}

/// A contiguous range of documents `[lb, ub)` of another count
/// matrix. Row `d` of the range is row `lb + d` of the source.
pub struct DocRange<'a, X: ?Sized> {
    source: &'a X,
    lb: usize,
    ub: usize,
}

impl<'a, X> DocRange<'a, X>
where
    X: CountMatrix + ?Sized,
{
    pub fn new(source: &'a X, lb: usize, ub: usize) -> Self {
        let ub = ub.min(source.num_docs());
        let lb = lb.min(ub);
        Self { source, lb, ub }
    }
}

impl<X> CountMatrix for DocRange<'_, X>
where
    X: CountMatrix + ?Sized,
{
    fn num_docs(&self) -> usize {
        self.ub - self.lb
    }

    fn num_words(&self) -> usize {
        self.source.num_words()
    }

    fn doc_words(&self, d: usize) -> DocWords {
        debug_assert!(self.lb + d < self.ub);
        self.source.doc_words(self.lb + d)
    }

    fn find_invalid_count(&self) -> Option<(usize, usize, f64)> {
        (0..self.num_docs()).find_map(|d| {
            let doc = self.doc_words(d);
            doc.ids
                .iter()
                .zip(doc.counts.iter())
                .find(|(_, &x)| is_invalid(x))
                .map(|(&w, &x)| (d, w, x))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_util::traits::MatTriplets;

    fn toy_dense() -> Array2<f64> {
        array![[2., 0., 1., 0.], [0., 3., 0., 1.], [1., 1., 1., 1.]]
    }

    #[test]
    fn dense_and_sparse_agree() -> anyhow::Result<()> {
        let dense = toy_dense();
        let (nr, nc, triplets) = dense.to_nonzero_triplets()?;
        let sparse = CsrMatrix::<f64>::from_nonzero_triplets(nr, nc, triplets)?;

        assert_eq!(dense.num_docs(), sparse.num_docs());
        assert_eq!(dense.num_words(), sparse.num_words());
        for d in 0..dense.num_docs() {
            assert_eq!(dense.doc_words(d), sparse.doc_words(d));
        }
        assert_eq!(dense.total_count(), 13.0);
        assert_eq!(sparse.total_count(), 13.0);
        Ok(())
    }

    #[test]
    fn doc_range_shifts_rows() {
        let dense = toy_dense();
        let range = dense.docs(1, 3);
        assert_eq!(range.num_docs(), 2);
        assert_eq!(
            range.doc_words(0),
            DocWords {
                ids: vec![1, 3],
                counts: vec![3., 1.]
            }
        );
        assert_eq!(range.total_count(), 8.0);

        let nested = range.docs(1, 10);
        assert_eq!(nested.num_docs(), 1);
        assert_eq!(nested.doc_words(0).total(), 4.0);
    }

    #[test]
    fn negative_counts_are_reported() {
        let mut dense = toy_dense();
        assert!(dense.check_nonnegative("test").is_ok());

        dense[(2, 1)] = -1.0;
        match dense.check_nonnegative("test") {
            Err(LdaError::NegativeCount { row, col, .. }) => {
                assert_eq!((row, col), (2, 1));
            }
            other => panic!("unexpected {:?}", other),
        }

        let range = dense.docs(2, 3);
        assert_eq!(range.find_invalid_count(), Some((0, 1, -1.0)));

        dense[(0, 0)] = f64::NAN;
        assert!(dense.check_nonnegative("test").is_err());
    }
}
