//! Fast algorithm for Independent Component Analysis (ICA)

use linfa_linalg::eigh::Eigh;
use ndarray::{s, Array, Array1, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use stdecomp::{
    linalg::{effective_rank, pinv_rows, thin_svd},
    traits::*,
    Float,
};

use crate::error::{FastIcaError, Result};
use crate::hyperparams::{FastIcaValidParams, WhitenStrategy};

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, FastIcaError> for FastIcaValidParams<F> {
    type Object = FastIca<F>;

    /// Fit the model
    ///
    /// Rows of `x` are samples and columns are the observed mixtures.
    ///
    /// # Errors
    ///
    /// If `ncomponents` is set to a number greater than the minimum of
    /// the number of rows and columns
    ///
    /// If the initial unmixing matrix does not have `ncomponents` rows and columns
    fn fit(&self, x: &ArrayBase<D, Ix2>) -> Result<Self::Object> {
        let (nsamples, nfeatures) = x.dim();
        if nsamples == 0 {
            return Err(FastIcaError::NotEnoughSamples);
        }

        let whiten = self.whiten() != WhitenStrategy::Disabled;

        // If the number of components is not set, we take the minimum of
        // the number of rows and columns
        let mut ncomponents = self
            .ncomponents()
            .unwrap_or_else(|| nsamples.min(nfeatures));
        if !whiten && ncomponents != nfeatures {
            log::warn!(
                "ignoring ncomponents = {} without whitening, using all {} features",
                ncomponents,
                nfeatures
            );
            ncomponents = nfeatures;
        }

        // The number of components cannot be greater than the minimum of
        // the number of rows and columns
        if whiten && ncomponents > nsamples.min(nfeatures) {
            return Err(FastIcaError::InvalidValue(format!(
                "ncomponents cannot be greater than the min({}, {}), got {}",
                nsamples, nfeatures, ncomponents
            )));
        }

        let w = match self.w_init() {
            Some(w_init) if w_init.dim() != (ncomponents, ncomponents) => {
                return Err(FastIcaError::InvalidValue(format!(
                    "w_init has shape {:?}, expected ({}, {})",
                    w_init.shape(),
                    ncomponents,
                    ncomponents
                )));
            }
            Some(w_init) => w_init.to_owned(),
            None => {
                // We initialize the de-mixing matrix with a uniform distribution
                let w: Array2<f64> = if let Some(seed) = self.random_state() {
                    let mut rng = Xoshiro256Plus::seed_from_u64(*seed);
                    let shape = (ncomponents, ncomponents);
                    Array::random_using(shape, Uniform::new(0., 1.), &mut rng)
                } else {
                    Array::random((ncomponents, ncomponents), Uniform::new(0., 1.))
                };
                w.mapv(F::cast)
            }
        };

        let (mean, k, xwhitened) = if whiten {
            // We center the input by subtracting the mean of its features
            let xmean = x.mean_axis(Axis(0)).ok_or(FastIcaError::NotEnoughSamples)?;
            let xcentered = x - &xmean.view().insert_axis(Axis(0));

            // We whiten the matrix to remove any potential correlation between
            // the components
            let svd = thin_svd(&xcentered, ncomponents)?;
            let rank = effective_rank(&svd.s, xcentered.dim());
            if rank == 0 {
                return Err(FastIcaError::SvdDecomposition);
            }
            if rank < ncomponents {
                log::warn!(
                    "centered data has rank {}, the remaining {} of {} components are zero",
                    rank,
                    ncomponents - rank,
                    ncomponents
                );
            }
            let k = svd.vt.slice(s![..rank, ..]).to_owned()
                / &svd.s.slice(s![..rank]).insert_axis(Axis(1));

            // We multiply the matrix with root of the number of records
            let nsamples_sqrt = F::cast(nsamples).sqrt();
            let xwhitened = k.dot(&xcentered.t()).mapv(|x| x * nsamples_sqrt);

            (xmean, Some(k), xwhitened)
        } else {
            (Array1::zeros(nfeatures), None, x.t().to_owned())
        };

        log::debug!(
            "running FastICA on {} samples with {} components",
            nsamples,
            ncomponents
        );

        // We find the optimized de-mixing matrix
        let rank = xwhitened.nrows();
        let w = w.slice(s![..rank, ..rank]).to_owned();
        let (w, n_iter, converged) = self.ica_parallel(&xwhitened, &w)?;
        if !converged {
            log::warn!(
                "FastICA did not converge within {} iterations",
                n_iter
            );
        }

        // We whiten the de-mixing matrix
        let mut components = Array2::<F>::zeros((ncomponents, nfeatures));
        match k {
            Some(k) => components.slice_mut(s![..rank, ..]).assign(&w.dot(&k)),
            None => components.assign(&w),
        }

        if self.whiten() == WhitenStrategy::UnitVariance {
            let sources = (x - &mean.view().insert_axis(Axis(0))).dot(&components.t());
            let std = sources.std_axis(Axis(0), F::zero());
            for (mut row, s) in components.outer_iter_mut().zip(std.iter()) {
                if *s > F::zero() {
                    row /= *s;
                }
            }
        }

        let mixing = pinv_rows(&components)?;

        Ok(FastIca {
            mean,
            components,
            mixing,
            n_iter,
            converged,
        })
    }
}

impl<F: Float> FastIcaValidParams<F> {
    // Parallel FastICA, Optimization step
    fn ica_parallel(&self, x: &Array2<F>, w: &Array2<F>) -> Result<(Array2<F>, usize, bool)> {
        let mut w = Self::sym_decorrelation(w)?;

        let p = x.ncols() as f64;

        for iteration in 1..=self.max_iter() {
            let (gwtx, g_wtx) = self.gfunc().exec(&w.dot(x));

            let lhs = gwtx.dot(&x.t()).mapv(|x| x / F::cast(p));
            let rhs = &w * &g_wtx.insert_axis(Axis(1));
            let wnew = Self::sym_decorrelation(&(lhs - rhs))?;

            // `lim` let us check for convergence between the old and
            // new weight values, we want their dot-product to almost equal one
            let lim = wnew
                .outer_iter()
                .zip(w.outer_iter())
                .map(|(a, b)| (a.dot(&b).abs() - F::one()).abs())
                .fold(F::zero(), F::max);

            w = wnew;

            if lim < self.tol() {
                return Ok((w, iteration, true));
            }
        }

        Ok((w, self.max_iter(), false))
    }

    // Symmetric decorrelation
    //
    // W <- (W * W.T)^{-1/2} * W
    fn sym_decorrelation(w: &Array2<F>) -> Result<Array2<F>> {
        let (eig_val, eig_vec) = w.dot(&w.t()).eigh()?;

        let tmp = &eig_vec
            * &(eig_val.mapv(|x| x.max(F::zero()).sqrt()).mapv(|x| {
                // We lower bound the float value at 1e-7 when taking the reciprocal
                let lower_bound = F::cast(1e-7);
                if x < lower_bound {
                    return lower_bound.recip();
                }
                x.recip()
            }))
            .insert_axis(Axis(0));

        Ok(tmp.dot(&eig_vec.t()).dot(w))
    }
}

/// Fitted FastICA model for recovering the sources
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct FastIca<F> {
    mean: Array1<F>,
    components: Array2<F>,
    mixing: Array2<F>,
    n_iter: usize,
    converged: bool,
}

impl<F: Float> FastIca<F> {
    /// Unmixing matrix, one row per component, applied to centered observations
    pub fn components(&self) -> &Array2<F> {
        &self.components
    }

    /// Mixing matrix of shape `(nfeatures, ncomponents)`, the pseudo-inverse of the components
    pub fn mixing(&self) -> &Array2<F> {
        &self.mixing
    }

    /// Mean of every feature, zero when whitening was disabled
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Number of fixed point iterations run
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Whether the unmixing matrix converged within the tolerance
    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array2<F>> for FastIca<F> {
    /// Recover the sources
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array2<F>) {
        assert_eq!(
            y.shape(),
            &[x.nrows(), self.components.nrows()],
            "The number of data points must match the number of output targets."
        );

        let xcentered = x - &self.mean.view().insert_axis(Axis(0));
        *y = xcentered.dot(&self.components.t());
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        Array2::zeros((x.nrows(), self.components.nrows()))
    }
}

/// Some standard non-linear functions
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub enum GFunc {
    /// `log(cosh(alpha * x)) / alpha` with `alpha` in `[1, 2]`
    Logcosh(f64),
    Exp,
    Cube,
}

impl GFunc {
    // Function to select the correct non-linear function and execute it
    // returning a tuple, consisting of the first and second derivatives of the
    // non-linear function
    fn exec<A: Float>(&self, x: &Array2<A>) -> (Array2<A>, Array1<A>) {
        match self {
            Self::Cube => Self::cube(x),
            Self::Exp => Self::exp(x),
            Self::Logcosh(alpha) => Self::logcosh(x, *alpha),
        }
    }

    fn row_mean<A: Float>(x: Array2<A>) -> Array1<A> {
        x.mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(x.nrows()))
    }

    fn cube<A: Float>(x: &Array2<A>) -> (Array2<A>, Array1<A>) {
        (
            x.mapv(|x| x.powi(3)),
            Self::row_mean(x.mapv(|x| A::cast(3.) * x.powi(2))),
        )
    }

    fn exp<A: Float>(x: &Array2<A>) -> (Array2<A>, Array1<A>) {
        let exp = x.mapv(|x| (-x.powi(2) / A::cast(2.)).exp());
        (
            x * &exp,
            Self::row_mean(x.mapv(|x| A::cast(1.) - x.powi(2)) * &exp),
        )
    }

    fn logcosh<A: Float>(x: &Array2<A>, alpha: f64) -> (Array2<A>, Array1<A>) {
        let alpha = A::cast(alpha);

        let gx = x.mapv(|x| (x * alpha).tanh());
        let g_x = gx.mapv(|x| alpha * (A::cast(1.) - x.powi(2)));

        (gx, Self::row_mean(g_x))
    }
}
