use crate::traits::*;
use ndarray::prelude::*;
use num_traits::{Float, FromPrimitive};
use rand::Rng;
use rand_distr::{Distribution, Gamma};

impl<T> SampleOps for Array2<T>
where
    T: Float + FromPrimitive,
{
    type Mat = Self;
    type Scalar = T;

    fn rgamma<R: Rng + ?Sized>(
        dd: usize,
        nn: usize,
        param: (f64, f64),
        rng: &mut R,
    ) -> anyhow::Result<Self::Mat> {
        let (shape, scale) = param;
        let gamma = Gamma::new(shape, scale)
            .map_err(|e| anyhow::anyhow!("invalid gamma ({}, {}): {}", shape, scale, e))?;

        // fill in the row-major order, so a seeded `rng` gives the
        // same matrix every time
        let rvec = (0..(dd * nn))
            .map(|_| T::from_f64(gamma.sample(rng)).unwrap_or_else(T::zero))
            .collect::<Vec<T>>();

        Ok(Array2::from_shape_vec((dd, nn), rvec)?)
    }
}

impl<T> MatOps for Array2<T>
where
    T: Float + FromPrimitive + std::iter::Sum,
{
    type Mat = Self;
    type Scalar = T;

    fn sum_to_one_rows(&self) -> Self::Mat {
        let mut xx = self.clone();
        xx.sum_to_one_rows_inplace();
        xx
    }

    fn sum_to_one_rows_inplace(&mut self) {
        for mut x_i in self.rows_mut() {
            let denom: T = x_i.iter().copied().sum();
            if denom > T::zero() {
                x_i.mapv_inplace(|x| x / denom);
            }
        }
    }
}

impl<T> MatTriplets for Array2<T>
where
    T: Float,
{
    type Mat = Self;
    type Scalar = T;

    fn from_nonzero_triplets<I>(
        nrow: usize,
        ncol: usize,
        triplets: Vec<(I, I, Self::Scalar)>,
    ) -> anyhow::Result<Self::Mat>
    where
        I: TryInto<usize> + Copy,
        <I as TryInto<usize>>::Error: std::fmt::Debug,
    {
        let mut array = Array2::<T>::zeros((nrow, ncol));
        for (ii, jj, x_ij) in triplets {
            let ii: usize = ii
                .try_into()
                .map_err(|e| anyhow::anyhow!("bad row index: {:?}", e))?;
            let jj: usize = jj
                .try_into()
                .map_err(|e| anyhow::anyhow!("bad column index: {:?}", e))?;
            if ii >= nrow || jj >= ncol {
                anyhow::bail!("({}, {}) is out of ({}, {})", ii, jj, nrow, ncol);
            }
            array[(ii, jj)] = array[(ii, jj)] + x_ij;
        }
        Ok(array)
    }

    fn to_nonzero_triplets(
        &self,
    ) -> anyhow::Result<(usize, usize, Vec<(usize, usize, Self::Scalar)>)> {
        let (rows, cols) = self.dim();
        Ok((
            rows,
            cols,
            self.indexed_iter()
                .filter(|(_, &x)| x != T::zero())
                .map(|((i, j), &x)| (i, j, x))
                .collect(),
        ))
    }
}
