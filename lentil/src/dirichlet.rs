//! Expectations under Dirichlet distributions.

use ndarray::prelude::*;
use ndarray::Data;
use special::Gamma as SpecialGamma;

/// `E[log θ]` for `θ ~ Dirichlet(x)`, applied to a vector or to each
/// row of a matrix.
///
/// ```text
/// E[log θ(i)] = ψ(x(i)) - ψ(Σ_j x(j))
/// ```
///
/// Callers must hand in strictly positive parameters.
pub trait DirichletOps {
    type Out;

    fn log_dirichlet_expectation(&self) -> Self::Out;

    /// `exp(E[log θ])`; these are not normalized.
    fn exp_dirichlet_expectation(&self) -> Self::Out;
}

impl<S> DirichletOps for ArrayBase<S, Ix1>
where
    S: Data<Elem = f64>,
{
    type Out = Array1<f64>;

    fn log_dirichlet_expectation(&self) -> Self::Out {
        let psi_tot = self.sum().digamma();
        self.mapv(|x| x.digamma() - psi_tot)
    }

    fn exp_dirichlet_expectation(&self) -> Self::Out {
        let mut ret = self.log_dirichlet_expectation();
        ret.mapv_inplace(f64::exp);
        ret
    }
}

impl<S> DirichletOps for ArrayBase<S, Ix2>
where
    S: Data<Elem = f64>,
{
    type Out = Array2<f64>;

    fn log_dirichlet_expectation(&self) -> Self::Out {
        let mut ret = self.mapv(|x| x.digamma());
        for (mut ret_i, x_i) in ret.rows_mut().into_iter().zip(self.rows()) {
            let psi_tot = x_i.sum().digamma();
            ret_i -= psi_tot;
        }
        ret
    }

    fn exp_dirichlet_expectation(&self) -> Self::Out {
        let mut ret = self.log_dirichlet_expectation();
        ret.mapv_inplace(f64::exp);
        ret
    }
}

/// `ln Γ(x)`
#[inline]
pub fn ln_gamma(x: f64) -> f64 {
    SpecialGamma::ln_gamma(x).0
}

/// Mean absolute difference between two vectors of the same length
pub fn mean_change<S1, S2>(a: &ArrayBase<S1, Ix1>, b: &ArrayBase<S2, Ix1>) -> f64
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
{
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return 0.0;
    }
    let tot: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum();
    tot / a.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn uniform_dirichlet_expectation() {
        // Dirichlet(1, 1): E[log θ] = ψ(1) - ψ(2) = -1
        let x = array![1.0, 1.0];
        let e = x.log_dirichlet_expectation();
        assert_abs_diff_eq!(e, array![-1.0, -1.0], epsilon = 1e-10);
        assert_abs_diff_eq!(
            x.exp_dirichlet_expectation(),
            array![(-1.0f64).exp(), (-1.0f64).exp()],
            epsilon = 1e-10
        );
    }

    #[test]
    fn matrix_is_row_wise() {
        let xx = array![[1.0, 1.0], [2.0, 5.0], [0.3, 0.7]];
        let ee = xx.log_dirichlet_expectation();
        for (x_i, e_i) in xx.rows().into_iter().zip(ee.rows()) {
            assert_abs_diff_eq!(e_i, x_i.log_dirichlet_expectation(), epsilon = 1e-12);
        }
        // a large concentration approaches log of the mean
        let big = array![[1000.0, 3000.0]];
        let e = big.log_dirichlet_expectation();
        assert_abs_diff_eq!(e[(0, 0)], 0.25f64.ln(), epsilon = 1e-3);
        assert_abs_diff_eq!(e[(0, 1)], 0.75f64.ln(), epsilon = 1e-3);
    }

    #[test]
    fn exp_expectation_sums_below_one() {
        let x = array![0.1, 2.0, 7.5, 0.01];
        let tot = x.exp_dirichlet_expectation().sum();
        assert!(tot > 0.0 && tot < 1.0);
    }

    #[test]
    fn ln_gamma_and_mean_change() {
        assert_abs_diff_eq!(ln_gamma(1.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ln_gamma(5.0), 24f64.ln(), epsilon = 1e-10);
        assert_abs_diff_eq!(
            mean_change(&array![1.0, 2.0, 3.0], &array![1.5, 2.0, 2.0]),
            0.5,
            epsilon = 1e-12
        );
    }
}
