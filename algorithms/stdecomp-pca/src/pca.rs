//! Principal Component Analysis
//!
//! Principal Component Analysis is a common technique for data and dimensionality reduction. It
//! reduces the dimensionality of the data while retaining most of the variance. This is done by
//! projecting the centered data onto its leading right singular vectors. Small problems are
//! decomposed exactly, large ones with a randomized range finder.
//!
//! # Example
//!
//! ```
//! use ndarray::Array2;
//! use stdecomp::traits::{Fit, Predict};
//! use stdecomp_pca::Pca;
//!
//! let records = Array2::from_shape_fn((20, 5), |(i, j)| ((i * j) % 7) as f64);
//!
//! // find the two directions with the largest spread of the data
//! let model = Pca::params(2).fit(&records).unwrap();
//!
//! // reduce dimensionality of the records
//! let embedding = model.predict(&records);
//! assert_eq!(embedding.dim(), (20, 2));
//! ```
//!
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use stdecomp::{
    linalg::{effective_rank, flip_signs, randomized_svd, thin_svd, Svd},
    random::rng_from_seed,
    traits::{Fit, PredictInplace},
    Float,
};

use crate::error::{PcaError, Result};
use crate::hyperparams::{PcaParams, PcaValidParams, SvdSolver};

/// Fit a PCA model given an observation matrix
///
/// Rows of the matrix are samples and columns features. The model keeps the mean of every feature
/// and `n_components` orthonormal directions sorted by decreasing explained variance.
impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, PcaError> for PcaValidParams {
    type Object = Pca<F>;

    fn fit(&self, x: &ArrayBase<D, Ix2>) -> Result<Self::Object> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(PcaError::NotEnoughSamples);
        }

        let max_components = n_samples.min(n_features);
        if self.n_components() > max_components {
            return Err(PcaError::InvalidComponents(
                self.n_components(),
                max_components,
            ));
        }

        // calculate mean of data and subtract it
        let mean = x.mean_axis(Axis(0)).ok_or(PcaError::NotEnoughSamples)?;
        let x = x - &mean.view().insert_axis(Axis(0));

        let solver = self.svd_solver().resolve(x.dim(), self.n_components());
        log::debug!(
            "fitting PCA with {} components on {}x{} records using {:?} solver",
            self.n_components(),
            n_samples,
            n_features,
            solver
        );

        let Svd { mut u, s, mut vt } = match solver {
            SvdSolver::Randomized => {
                let mut rng = rng_from_seed(self.random_state());
                randomized_svd(
                    &x,
                    self.n_components(),
                    self.n_oversamples(),
                    self.n_power_iter(max_components),
                    &mut rng,
                )?
            }
            _ => thin_svd(&x, self.n_components())?,
        };
        flip_signs(&mut u, &mut vt);

        let rank = effective_rank(&s, x.dim());
        if rank < self.n_components() {
            log::warn!(
                "centered records have rank {}, principal axes beyond it are zero",
                rank
            );
            vt.slice_mut(s![rank.., ..]).fill(F::zero());
        }

        let dof = F::cast(n_samples.saturating_sub(1).max(1));
        let total_variance = x.iter().map(|v| *v * *v).sum::<F>() / dof;

        Ok(Pca {
            components: vt,
            sigma: s,
            mean,
            whiten: self.whiten(),
            n_samples,
            total_variance,
        })
    }
}

/// Fitted Principal Component Analysis model
///
/// The model contains the mean and the principal axes for the projection of data.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Pca<F> {
    components: Array2<F>,
    sigma: Array1<F>,
    mean: Array1<F>,
    whiten: bool,
    n_samples: usize,
    total_variance: F,
}

impl Pca<f64> {
    /// Create default parameter set
    ///
    /// # Parameters
    ///
    ///  * `n_components`: the target dimensionality
    pub fn params(n_components: usize) -> PcaParams {
        PcaParams::new(n_components)
    }
}

impl<F: Float> Pca<F> {
    /// Principal axes, one unit norm row per component
    ///
    /// Centering removes one degree of freedom, so with as many components as samples the last
    /// axes exceed the rank of the data. Such axes are all zero.
    pub fn components(&self) -> &Array2<F> {
        &self.components
    }

    /// Mean of every feature of the training data
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Return the singular values
    pub fn singular_values(&self) -> &Array1<F> {
        &self.sigma
    }

    /// Return the amount of explained variance per component
    pub fn explained_variance(&self) -> Array1<F> {
        let dof = F::cast(self.n_samples.saturating_sub(1).max(1));
        self.sigma.mapv(|x| x * x / dof)
    }

    /// Return the fraction of the total variance explained by every component
    pub fn explained_variance_ratio(&self) -> Array1<F> {
        let ex_var = self.explained_variance();
        if self.total_variance > F::zero() {
            ex_var / self.total_variance
        } else {
            Array1::zeros(self.sigma.len())
        }
    }

    /// Whether projections are scaled to unit variance
    pub fn whitened(&self) -> bool {
        self.whiten
    }
}

/// Project a matrix to lower dimensional space
///
/// The projection first centers and then projects the data. With whitening enabled every
/// projected component is divided by the square root of its explained variance.
impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array2<F>> for Pca<F> {
    fn predict_inplace(&self, records: &ArrayBase<D, Ix2>, targets: &mut Array2<F>) {
        assert_eq!(
            targets.shape(),
            &[records.nrows(), self.components.nrows()],
            "The number of data points must match the number of output targets."
        );

        let mut projection = (records - &self.mean).dot(&self.components.t());

        if self.whiten {
            let scale = self
                .explained_variance()
                .mapv(|v| if v > F::zero() { v.sqrt().recip() } else { F::zero() });
            projection *= &scale.insert_axis(Axis(0));
        }

        *targets = projection;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        Array2::zeros((x.nrows(), self.components.nrows()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};
    use ndarray_rand::{
        rand::SeedableRng,
        rand_distr::{StandardNormal, Uniform},
        RandomExt,
    };
    use rand_xoshiro::Xoshiro256Plus;
    use stdecomp::traits::Predict;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<Pca<f64>>();
        has_autotraits::<PcaParams>();
        has_autotraits::<PcaValidParams>();
        has_autotraits::<PcaError>();
    }

    /// Small whitening test
    ///
    /// This test rotates 2-dimensional data by 45° and checks whether the whitening transformation
    /// creates a diagonal covariance matrix.
    #[test]
    fn test_whitening_small() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);

        // rotate data by 45°
        let tmp = Array2::random_using((300, 2), Uniform::new(-1.0f64, 1.), &mut rng);
        let q = array![[1., 1.], [-1., 1.]];
        let records = tmp.dot(&q);

        let model = Pca::params(2).whiten(true).fit(&records).unwrap();
        let proj = model.predict(&records);

        // check that the covariance is unit diagonal
        let cov = proj.t().dot(&proj);
        assert_abs_diff_eq!(cov / (300. - 1.), Array2::<f64>::eye(2), epsilon = 1e-5);
    }

    /// Random number whitening test
    ///
    /// This test creates a large number of uniformly distributed random numbers and asserts that
    /// the whitening routine is able to diagonalize the covariance matrix.
    #[test]
    fn test_whitening_rand() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);

        let records = Array2::random_using((300, 50), Uniform::new(-1.0f64, 1.), &mut rng);

        let model = Pca::params(10).whiten(true).fit(&records).unwrap();
        let proj = model.predict(&records);

        let cov = proj.t().dot(&proj);
        assert_abs_diff_eq!(cov / (300. - 1.), Array2::<f64>::eye(10), epsilon = 1e-5);
    }

    /// Eigenvalue structure in high dimensions
    ///
    /// Samples scattered along a single direction plus a small isotropic noise. The first
    /// component has to recover the direction and explain most of the variance.
    #[test]
    fn test_dominant_direction() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);

        let direction = Array::linspace(1f64, 2., 20);
        let direction = &direction / direction.dot(&direction).sqrt();
        let scores = Array1::random_using(200, StandardNormal, &mut rng).mapv(|x: f64| 10. * x);
        let noise = Array2::random_using((200, 20), Uniform::new(-0.01, 0.01), &mut rng);
        let records = scores
            .insert_axis(Axis(1))
            .dot(&direction.view().insert_axis(Axis(0)))
            + noise;

        let model = Pca::params(3).fit(&records).unwrap();

        assert_abs_diff_eq!(model.components().row(0), direction, epsilon = 1e-3);
        assert!(model.explained_variance_ratio()[0] > 0.99);
        assert!(model.singular_values()[0] > model.singular_values()[1]);
        // orthonormal principal axes
        assert_abs_diff_eq!(
            model.components().dot(&model.components().t()),
            Array2::<f64>::eye(3),
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_randomized_agrees_with_full() {
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let left = Array2::random_using((120, 4), Uniform::new(-1.0f64, 1.), &mut rng);
        let right = Array2::random_using((4, 80), Uniform::new(-1.0f64, 1.), &mut rng);
        let records = left.dot(&right);

        let full = Pca::params(4)
            .svd_solver(SvdSolver::Full)
            .fit(&records)
            .unwrap();
        let randomized = Pca::params(4)
            .svd_solver(SvdSolver::Randomized)
            .random_state(1)
            .fit(&records)
            .unwrap();

        assert_abs_diff_eq!(
            full.singular_values(),
            randomized.singular_values(),
            epsilon = 1e-6
        );
        // sign convention makes the axes comparable
        assert_abs_diff_eq!(full.components(), randomized.components(), epsilon = 1e-6);
    }

    #[test]
    fn test_too_many_components() {
        let records = Array2::<f64>::ones((4, 10));
        let res = Pca::params(5).fit(&records);

        assert!(matches!(res, Err(PcaError::InvalidComponents(5, 4))));
        assert!(Pca::params(0).fit(&records).is_err());
    }

    #[test]
    fn test_components_beyond_rank_are_zero() {
        let mut rng = Xoshiro256Plus::seed_from_u64(5);
        let records = Array2::random_using((5, 200), Uniform::new(-1.0f64, 1.), &mut rng);

        let model = Pca::params(5).fit(&records).unwrap();
        let components = model.components();

        assert_abs_diff_eq!(components.row(4), Array1::<f64>::zeros(200));
        let leading = components.slice(ndarray::s![..4, ..]);
        assert_abs_diff_eq!(leading.dot(&leading.t()), Array2::<f64>::eye(4), epsilon = 1e-8);

        // the zero axis projects onto zero instead of amplified noise
        let embedding = model.predict(&records);
        assert_abs_diff_eq!(embedding.column(4), Array1::<f64>::zeros(5));

        // more records than features, with one feature the sum of the others
        let base = Array2::random_using((200, 4), Uniform::new(-1.0f64, 1.), &mut rng);
        let sum = base.sum_axis(Axis(1)).insert_axis(Axis(1));
        let records = ndarray::concatenate![Axis(1), base, sum];

        let model = Pca::params(5).fit(&records).unwrap();
        assert_abs_diff_eq!(model.components().row(4), Array1::<f64>::zeros(5));
    }

    #[test]
    fn test_explained_variance() {
        // two features with variance 4 and 1, uncorrelated
        let records = array![[2., 1.], [-2., 1.], [2., -1.], [-2., -1.]];
        let model = Pca::params(2).fit(&records).unwrap();

        assert_abs_diff_eq!(
            model.explained_variance(),
            array![16. / 3., 4. / 3.],
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            model.explained_variance_ratio(),
            array![0.8, 0.2],
            epsilon = 1e-10
        );
    }
}
