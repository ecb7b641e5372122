//! Spatio-temporal Independent Component Analysis
//!
//! stICA looks for components which are independent both in space and in time. The stack is
//! reduced by a spatial and a temporal principal component analysis, both with `n_components`
//! components. The spatial components (images) and temporal components (time courses) are weighted
//! with `1 - mu` and `mu` and concatenated, so that every pixel and every frame becomes a sample
//! of the same FastICA problem. The recovered sources are split again into spatial filters and
//! temporal signals.
//!
//! # Example
//!
//! ```
//! use ndarray_rand::rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//! use stdecomp::traits::Fit;
//! use stdecomp_stica::StIca;
//!
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! let movie = stdecomp_datasets::movie(60, 16, 16, 3, 0.05, &mut rng);
//!
//! let model = StIca::params(3)
//!     .mu(0.3)
//!     .as_masks(true)
//!     .random_state(42)
//!     .fit(&movie.frames)
//!     .unwrap();
//!
//! assert_eq!(model.spatial().unwrap().dim(), (3, 16, 16));
//! assert_eq!(model.temporal().unwrap().dim(), (3, 60));
//! assert_eq!(model.masks().unwrap().dim(), (3, 16, 16));
//! ```
use ndarray::{concatenate, s, Array1, Array2, Array3, ArrayBase, Axis, Data, Ix3};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use stdecomp::{
    ordering::skewness_order,
    stack::{linearize, reshape, StackShape},
    traits::{Fit, Predict, Transformer},
    Float, ParamGuard,
};
use stdecomp_ica::fast_ica::FastIca;
use stdecomp_pca::stack::{double_center, spatial_components, temporal_pca};

use crate::error::{Result, StIcaError};
use crate::hyperparams::StIcaValidParams;

impl<F: Float, S: Data<Elem = F>> Fit<ArrayBase<S, Ix3>, StIcaError> for StIcaValidParams<F> {
    type Object = StIca<F>;

    fn fit(&self, stack: &ArrayBase<S, Ix3>) -> Result<Self::Object> {
        let (frames, height, width) = stack.dim();
        let shape = StackShape {
            frames,
            height,
            width,
        };
        let npixels = shape.npixels();

        let n = self.n_components();
        let max_components = frames.min(npixels);
        if n > max_components {
            return Err(StIcaError::InvalidComponents(n, max_components));
        }

        let mu = self.mu();
        let seed = self.random_state();
        log::debug!(
            "stICA with {} components and mu = {} on {} frames of {}x{} pixels",
            n,
            mu,
            frames,
            height,
            width
        );

        // rows are components, columns the pixels followed by the frames
        let (joint, n_spatial) = if mu == F::zero() {
            (spatial_components(stack, n, seed)?, npixels)
        } else if mu == F::one() {
            (temporal_pca(stack, n, seed)?, 0)
        } else {
            let spatial = spatial_components(stack, n, seed)?;
            let mut temporal = temporal_pca(stack, n, seed)?;
            align_signs(stack, &spatial, &mut temporal)?;

            let spatial = spatial * (F::one() - mu);
            let temporal = temporal * mu;
            let joint = concatenate(Axis(1), &[spatial.view(), temporal.view()])
                .map_err(stdecomp::Error::from)?;
            (joint, npixels)
        };

        let observations = joint.t();
        let ica: FastIca<F> = self
            .ica_params()
            .check()?
            .fit(&observations)
            .map_err(StIcaError::Ica)?;
        if !ica.converged() {
            log::warn!(
                "stICA unmixing stopped after {} iterations without converging",
                ica.n_iter()
            );
        }

        // one column per component
        let sources = ica.predict(&observations);

        let (order, skew) = skewness_order(&sources.t());
        let order = if self.order_by_skewness() {
            order
        } else {
            (0..n).collect()
        };
        let mut sources = sources.select(Axis(1), &order);
        let mut mixing = ica.mixing().select(Axis(1), &order);
        let mut skewness = skew.select(Axis(0), &order);

        // the sign of an independent component is arbitrary, make every source positively skewed
        for (i, skew) in skewness.iter_mut().enumerate() {
            if *skew < F::zero() {
                *skew = -*skew;
                sources.column_mut(i).mapv_inplace(|v| -v);
                mixing.column_mut(i).mapv_inplace(|v| -v);
            }
        }

        let spatial = if n_spatial > 0 {
            let filters = sources.slice(s![..n_spatial, ..]).reversed_axes();
            Some(reshape(&filters, n, &shape)?)
        } else {
            None
        };
        let temporal = if mu > F::zero() {
            Some(sources.slice(s![n_spatial.., ..]).t().to_owned())
        } else {
            None
        };

        let masks = match &spatial {
            Some(spatial) if self.as_masks() => {
                Some(self.mask_params().check_ref()?.transform(spatial))
            }
            _ => None,
        };

        Ok(StIca {
            spatial,
            temporal,
            masks,
            mixing,
            skewness,
            n_iter: ica.n_iter(),
            converged: ica.converged(),
        })
    }
}

/// Flip temporal components whose sign disagrees with their spatial partner
///
/// Both principal component analyses decompose the same double centered matrix `X`, so the
/// temporal component `i` is parallel to `X v_i` for the spatial component `v_i`. The two analyses
/// fix their signs independently, which is undone here.
fn align_signs<F: Float, S: Data<Elem = F>>(
    stack: &ArrayBase<S, Ix3>,
    spatial: &Array2<F>,
    temporal: &mut Array2<F>,
) -> Result<()> {
    let (observations, _) = linearize(stack)?;
    let projected = spatial.dot(&double_center(&observations)?.t());

    for (i, (mut component, projection)) in temporal
        .outer_iter_mut()
        .zip(projected.outer_iter())
        .enumerate()
    {
        if component.dot(&projection) < F::zero() {
            log::debug!("flipping temporal component {}", i);
            component.mapv_inplace(|v| -v);
        }
    }

    Ok(())
}

/// Fitted spatio-temporal ICA
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct StIca<F> {
    spatial: Option<Array3<F>>,
    temporal: Option<Array2<F>>,
    masks: Option<Array3<usize>>,
    mixing: Array2<F>,
    skewness: Array1<F>,
    n_iter: usize,
    converged: bool,
}

impl<F: Float> StIca<F> {
    /// Spatial filters of shape `(n_components, height, width)`, absent for `mu == 1`
    pub fn spatial(&self) -> Option<&Array3<F>> {
        self.spatial.as_ref()
    }

    /// Temporal signals of shape `(n_components, n_frames)`, absent for `mu == 0`
    pub fn temporal(&self) -> Option<&Array2<F>> {
        self.temporal.as_ref()
    }

    /// Labelled masks of the spatial filters, if requested
    pub fn masks(&self) -> Option<&Array3<usize>> {
        self.masks.as_ref()
    }

    /// Mixing matrix of the FastICA step, columns in component order
    pub fn mixing(&self) -> &Array2<F> {
        &self.mixing
    }

    /// Skewness of every joint source, in component order
    ///
    /// Sources are sign corrected so that all values are non-negative.
    pub fn skewness(&self) -> &Array1<F> {
        &self.skewness
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Spatial filters, temporal signals and masks
    #[allow(clippy::type_complexity)]
    pub fn into_parts(self) -> (Option<Array3<F>>, Option<Array2<F>>, Option<Array3<usize>>) {
        (self.spatial, self.temporal, self.masks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StIcaParams;
    use approx::assert_abs_diff_eq;
    use ndarray::Array;
    use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
    use rand_xoshiro::Xoshiro256Plus;
    use stdecomp::ordering::skewness;

    fn random_stack() -> Array3<f64> {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        Array::random_using((10, 20, 20), Uniform::new(0., 1.), &mut rng)
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<StIca<f64>>();
        has_autotraits::<StIcaParams<f64>>();
        has_autotraits::<StIcaValidParams<f64>>();
        has_autotraits::<StIcaError>();
    }

    #[test]
    fn mu_selects_the_parts() {
        let stack = random_stack();

        let space = StIca::params(3).mu(0.).random_state(1).fit(&stack).unwrap();
        assert_eq!(space.spatial().unwrap().dim(), (3, 20, 20));
        assert!(space.temporal().is_none());

        let time = StIca::params(3).mu(1.).random_state(1).fit(&stack).unwrap();
        assert!(time.spatial().is_none());
        assert_eq!(time.temporal().unwrap().dim(), (3, 10));

        let both = StIca::params(3).mu(0.5).random_state(1).fit(&stack).unwrap();
        assert_eq!(both.spatial().unwrap().dim(), (3, 20, 20));
        assert_eq!(both.temporal().unwrap().dim(), (3, 10));
        assert_eq!(both.mixing().dim(), (3, 3));
    }

    #[test]
    fn sources_are_ordered_by_skewness() {
        let stack = random_stack();
        let model = StIca::params(4).random_state(7).fit(&stack).unwrap();

        let skew = model.skewness();
        assert!(skew.iter().all(|&v| v >= 0.));
        for pair in skew.windows(2) {
            assert!(pair[0] >= pair[1]);
        }

        // the reported skewness belongs to the concatenated source
        let spatial = model.spatial().unwrap();
        let temporal = model.temporal().unwrap();
        for i in 0..4 {
            let filter = spatial.index_axis(Axis(0), i).iter().copied().collect::<Array1<_>>();
            let joint = concatenate(Axis(0), &[filter.view(), temporal.row(i)]).unwrap();
            assert_abs_diff_eq!(skewness(&joint), model.skewness()[i], epsilon = 1e-8);
        }
    }

    #[test]
    fn native_order_keeps_the_sources() {
        let stack = random_stack();
        let ordered = StIca::params(3).random_state(5).fit(&stack).unwrap();
        let native = StIca::params(3)
            .random_state(5)
            .order_by_skewness(false)
            .fit(&stack)
            .unwrap();

        // same sources, possibly permuted
        let native_temporal = native.temporal().unwrap();
        for row in ordered.temporal().unwrap().outer_iter() {
            assert!(native_temporal
                .outer_iter()
                .any(|other| (&other - &row).iter().all(|d| d.abs() < 1e-10)));
        }
    }

    #[test]
    fn masks_are_labelled() {
        let stack = random_stack();
        let model = StIca::params(3)
            .as_masks(true)
            .random_state(3)
            .fit(&stack)
            .unwrap();

        let masks = model.masks().unwrap();
        assert_eq!(masks.dim(), (3, 20, 20));
        for (i, mask) in masks.outer_iter().enumerate() {
            assert!(mask.iter().all(|&v| v == 0 || v == i + 1));
        }

        // no spatial filters, no masks
        let model = StIca::params(3)
            .mu(1.)
            .as_masks(true)
            .random_state(3)
            .fit(&stack)
            .unwrap();
        assert!(model.masks().is_none());
    }

    #[test]
    fn one_component_per_frame() {
        let stack = random_stack();

        for mu in [0., 0.5] {
            let model = StIca::params(10).mu(mu).random_state(4).fit(&stack).unwrap();
            let spatial = model.spatial().unwrap();
            let filters = spatial
                .outer_iter()
                .map(|f| f.iter().copied().collect::<Array1<f64>>())
                .collect::<Vec<_>>();

            // the data has one direction less than components, that source is zero and last
            assert!(filters[9].iter().all(|&v| v == 0.));
            assert_eq!(model.skewness()[9], 0.);
            if let Some(temporal) = model.temporal() {
                assert!(temporal.row(9).iter().all(|&v| v == 0.));
            }

            // the remaining sources are distinct
            for i in 0..9 {
                for j in 0..i {
                    let (a, b) = (&filters[i], &filters[j]);
                    let (a, b) = (a - a.mean().unwrap(), b - b.mean().unwrap());
                    let corr = a.dot(&b) / (a.dot(&a) * b.dot(&b)).sqrt();
                    assert!(corr.abs() < 0.5, "sources {} and {} correlate by {}", i, j, corr);
                }
            }
        }
    }

    #[test]
    fn invalid_parameters() {
        let stack = random_stack();

        assert!(matches!(
            StIca::params(11).fit(&stack),
            Err(StIcaError::InvalidComponents(11, 10))
        ));
        assert!(matches!(
            StIca::params(3).mu(1.2).fit(&stack),
            Err(StIcaError::InvalidMu(_))
        ));
    }

    #[test]
    fn seeded_fits_agree() {
        let stack = random_stack();
        let params = StIca::params(3).random_state(11);

        assert_eq!(params.fit(&stack).unwrap(), params.fit(&stack).unwrap());
    }
}
