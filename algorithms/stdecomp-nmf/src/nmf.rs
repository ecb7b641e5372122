//! Non-negative Matrix Factorization
//!
//! NMF approximates a non-negative matrix `X` of shape `(n_samples, n_features)` by the product
//! `W H` of two non-negative factors, where `H` of shape `(n_components, n_features)` holds the
//! components and `W` the per-sample coefficients. The factors are found with the multiplicative
//! updates of Lee & Seung minimizing the Frobenius norm of `X - W H`.
//!
//! # Example
//!
//! ```
//! use ndarray::Array2;
//! use stdecomp::traits::Fit;
//! use stdecomp_nmf::Nmf;
//!
//! let records = Array2::from_shape_fn((12, 8), |(i, j)| ((i + 2 * j) % 5) as f64);
//!
//! let model = Nmf::params(3).random_state(0).fit(&records).unwrap();
//! assert_eq!(model.components().dim(), (3, 8));
//! assert!(model.components().iter().all(|&v| v >= 0.));
//! ```
use ndarray::{azip, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_rand::{rand::Rng, rand_distr::StandardNormal, RandomExt};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use stdecomp::{linalg::thin_svd, random::rng_from_seed, traits::Fit, Float};

use crate::error::{NmfError, Result};
use crate::hyperparams::{NmfInit, NmfValidParams};

/// The reconstruction error is only evaluated every this many iterations
const CHECK_INTERVAL: usize = 10;

fn check_non_negative<F: Float, D: Data<Elem = F>>(x: &ArrayBase<D, Ix2>) -> Result<()> {
    // NaN fails the comparison as well
    if let Some(value) = x.iter().find(|&&v| !(v >= F::zero())) {
        return Err(NmfError::NegativeInput(format!("{}", value)));
    }
    Ok(())
}

/// Frobenius norm of `X - W H`
fn frobenius_error<F: Float, D: Data<Elem = F>>(
    x: &ArrayBase<D, Ix2>,
    w: &Array2<F>,
    h: &Array2<F>,
) -> F {
    let residual = x - &w.dot(h);
    residual.iter().map(|v| *v * *v).sum::<F>().sqrt()
}

fn abs_normal<F: Float, R: Rng>(shape: (usize, usize), scale: F, rng: &mut R) -> Array2<F> {
    Array2::<f64>::random_using(shape, StandardNormal, rng).mapv(|v| scale * F::cast(v.abs()))
}

fn split_signs<F: Float>(v: &Array2<F>) -> (Array2<F>, Array2<F>) {
    (
        v.mapv(|x| x.max(F::zero())),
        v.mapv(|x| (-x).max(F::zero())),
    )
}

fn norm<F: Float>(v: &Array2<F>) -> F {
    v.iter().map(|x| *x * *x).sum::<F>().sqrt()
}

impl<F: Float> NmfValidParams<F> {
    /// Initial factors `(W, H)` for the data `x`
    fn initialize<D: Data<Elem = F>>(
        &self,
        x: &ArrayBase<D, Ix2>,
    ) -> Result<(Array2<F>, Array2<F>)> {
        let (n_samples, n_features) = x.dim();
        let k = self.n_components();
        let avg = x.mean().unwrap_or_else(F::zero);
        let mut rng = rng_from_seed(self.random_state());

        let init = self.init().resolve();
        if init == NmfInit::Random {
            let scale = (avg / F::cast(k)).sqrt();
            let h = abs_normal((k, n_features), scale, &mut rng);
            let w = abs_normal((n_samples, k), scale, &mut rng);
            return Ok((w, h));
        }

        let svd = thin_svd(x, k)?;
        let mut w = Array2::zeros((n_samples, k));
        let mut h = Array2::zeros((k, n_features));

        for j in 0..svd.s.len() {
            let x_col = svd.u.column(j).insert_axis(Axis(1)).to_owned();
            let y_row = svd.vt.row(j).insert_axis(Axis(0)).to_owned();

            // the leading singular pair of a non-negative matrix has a single sign
            let (x_part, y_part, sigma) = if j == 0 {
                (x_col.mapv(|v| v.abs()), y_row.mapv(|v| v.abs()), F::one())
            } else {
                let (x_pos, x_neg) = split_signs(&x_col);
                let (y_pos, y_neg) = split_signs(&y_row);
                let (xp_norm, yp_norm) = (norm(&x_pos), norm(&y_pos));
                let (xn_norm, yn_norm) = (norm(&x_neg), norm(&y_neg));

                let (m_pos, m_neg) = (xp_norm * yp_norm, xn_norm * yn_norm);
                if m_pos > m_neg {
                    (x_pos / xp_norm, y_pos / yp_norm, m_pos)
                } else if m_neg > F::zero() {
                    (x_neg / xn_norm, y_neg / yn_norm, m_neg)
                } else {
                    continue;
                }
            };

            let lambda = (svd.s[j] * sigma).sqrt();
            w.column_mut(j).assign(&x_part.column(0).mapv(|v| lambda * v));
            h.row_mut(j).assign(&y_part.row(0).mapv(|v| lambda * v));
        }

        let eps = F::epsilon();
        w.mapv_inplace(|v| if v < eps { F::zero() } else { v });
        h.mapv_inplace(|v| if v < eps { F::zero() } else { v });

        match init {
            NmfInit::Nndsvda => {
                w.mapv_inplace(|v| if v == F::zero() { avg } else { v });
                h.mapv_inplace(|v| if v == F::zero() { avg } else { v });
            }
            NmfInit::Nndsvdar => {
                let scale = avg / F::cast(100);
                let w_fill = abs_normal(w.dim(), scale, &mut rng);
                let h_fill = abs_normal(h.dim(), scale, &mut rng);
                w.zip_mut_with(&w_fill, |v, f| {
                    if *v == F::zero() {
                        *v = *f
                    }
                });
                h.zip_mut_with(&h_fill, |v, f| {
                    if *v == F::zero() {
                        *v = *f
                    }
                });
            }
            _ => {}
        }

        Ok((w, h))
    }

    /// Multiplicative updates of `W` and, if `update_h` is set, of `H`
    ///
    /// Returns the number of iterations and whether the relative decrease of the error fell
    /// below the tolerance.
    fn multiplicative_updates<D: Data<Elem = F>>(
        &self,
        x: &ArrayBase<D, Ix2>,
        w: &mut Array2<F>,
        h: &mut Array2<F>,
        update_h: bool,
    ) -> (usize, bool) {
        let eps = F::epsilon();
        let error_at_init = frobenius_error(x, w, h);
        if error_at_init == F::zero() {
            return (0, true);
        }
        let mut previous_error = error_at_init;

        for iteration in 1..=self.max_iter() {
            // W <- W * (X H^T) / (W H H^T)
            let numerator = x.dot(&h.t());
            let denominator = w.dot(&h.dot(&h.t()));
            azip!((wi in &mut *w, &n in &numerator, &d in &denominator) {
                *wi = *wi * n / d.max(eps)
            });

            if update_h {
                // H <- H * (W^T X) / (W^T W H)
                let numerator = w.t().dot(x);
                let denominator = w.t().dot(&*w).dot(&*h);
                azip!((hi in &mut *h, &n in &numerator, &d in &denominator) {
                    *hi = *hi * n / d.max(eps)
                });
            }

            if iteration % CHECK_INTERVAL == 0 {
                let error = frobenius_error(x, w, h);
                log::debug!("NMF iteration {} reconstruction error {}", iteration, error);
                if (previous_error - error) / error_at_init < self.tol() {
                    return (iteration, true);
                }
                previous_error = error;
            }
        }

        (self.max_iter(), false)
    }
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, NmfError> for NmfValidParams<F> {
    type Object = Nmf<F>;

    /// Factorize the non-negative matrix `x`
    ///
    /// # Errors
    ///
    /// If `x` contains negative values, which is checked before any iteration, or if the number
    /// of components exceeds the smaller dimension of `x`.
    fn fit(&self, x: &ArrayBase<D, Ix2>) -> Result<Self::Object> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(NmfError::NotEnoughSamples);
        }
        check_non_negative(x)?;

        let max_components = n_samples.min(n_features);
        if self.n_components() > max_components {
            return Err(NmfError::InvalidComponents(
                self.n_components(),
                max_components,
            ));
        }

        log::debug!(
            "fitting NMF with {} components on {}x{} records using {:?} initialization",
            self.n_components(),
            n_samples,
            n_features,
            self.init().resolve()
        );

        let (mut w, mut h) = self.initialize(x)?;
        let (n_iter, converged) = self.multiplicative_updates(x, &mut w, &mut h, true);
        if !converged {
            log::warn!(
                "NMF did not converge within {} iterations, increase max_iter to improve the fit",
                n_iter
            );
        }

        let reconstruction_err = frobenius_error(x, &w, &h);

        Ok(Nmf {
            components: h,
            coefficients: w,
            reconstruction_err,
            n_iter,
            converged,
            params: self.clone(),
        })
    }
}

/// Fitted non-negative matrix factorization
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Nmf<F> {
    components: Array2<F>,
    coefficients: Array2<F>,
    reconstruction_err: F,
    n_iter: usize,
    converged: bool,
    params: NmfValidParams<F>,
}

impl<F: Float> Nmf<F> {
    /// Factor `H` with one non-negative component per row
    pub fn components(&self) -> &Array2<F> {
        &self.components
    }

    /// Factor `W` of the training data, one row per sample
    pub fn coefficients(&self) -> &Array2<F> {
        &self.coefficients
    }

    /// Frobenius norm of the residual of the training data
    pub fn reconstruction_err(&self) -> F {
        self.reconstruction_err
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Whether the relative error decrease fell below the tolerance before `max_iter`
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Coefficients `W` of new data with the components held fixed
    pub fn transform<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Result<Array2<F>> {
        if x.ncols() != self.components.ncols() {
            return Err(stdecomp::Error::ShapeMismatch(format!(
                "expected {} features, got {}",
                self.components.ncols(),
                x.ncols()
            ))
            .into());
        }
        check_non_negative(x)?;

        let k = self.components.nrows();
        let avg = x.mean().unwrap_or_else(F::zero);
        let mut w = Array2::from_elem((x.nrows(), k), (avg / F::cast(k)).sqrt());
        let mut h = self.components.clone();

        let (n_iter, converged) = self.params.multiplicative_updates(x, &mut w, &mut h, false);
        if !converged {
            log::warn!("NMF transform did not converge within {} iterations", n_iter);
        }

        Ok(w)
    }
}
