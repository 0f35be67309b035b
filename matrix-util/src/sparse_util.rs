use crate::traits::MatTriplets;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

impl MatTriplets for CsrMatrix<f64> {
    type Mat = Self;
    type Scalar = f64;

    /// Build a compressed sparse row matrix. Duplicated `(i, j)`
    /// entries are summed up; explicit zeros are dropped.
    fn from_nonzero_triplets<I>(
        nrow: usize,
        ncol: usize,
        triplets: Vec<(I, I, Self::Scalar)>,
    ) -> anyhow::Result<Self::Mat>
    where
        I: TryInto<usize> + Copy,
        <I as TryInto<usize>>::Error: std::fmt::Debug,
    {
        let mut rows = Vec::with_capacity(triplets.len());
        let mut cols = Vec::with_capacity(triplets.len());
        let mut vals = Vec::with_capacity(triplets.len());

        for (ii, jj, x_ij) in triplets {
            if x_ij == 0.0 {
                continue;
            }
            rows.push(
                ii.try_into()
                    .map_err(|e| anyhow::anyhow!("bad row index: {:?}", e))?,
            );
            cols.push(
                jj.try_into()
                    .map_err(|e| anyhow::anyhow!("bad column index: {:?}", e))?,
            );
            vals.push(x_ij);
        }

        let coo = CooMatrix::try_from_triplets(nrow, ncol, rows, cols, vals)
            .map_err(|e| anyhow::anyhow!("failed to build a sparse matrix: {}", e))?;

        Ok(CsrMatrix::from(&coo))
    }

    fn to_nonzero_triplets(
        &self,
    ) -> anyhow::Result<(usize, usize, Vec<(usize, usize, Self::Scalar)>)> {
        Ok((
            self.nrows(),
            self.ncols(),
            self.triplet_iter()
                .filter(|(_, _, &x)| x != 0.0)
                .map(|(i, j, &x)| (i, j, x))
                .collect(),
        ))
    }
}
