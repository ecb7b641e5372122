//! Spatial and temporal PCA of frame stacks
//!
//! Both variants remove the mean of every column of the (possibly transposed) observation matrix
//! and afterwards the mean of every row, then extract the leading principal axes with the
//! randomized solver and whitening enabled.
//!
//! * spatial PCA treats frames as samples and pixels as features, its components are images
//! * temporal PCA treats pixels as samples and frames as features, its components are time
//!   courses
use ndarray::{Array2, Array3, ArrayBase, Axis, Data, Dimension};

use stdecomp::{
    stack::{linearize, reshape},
    traits::Fit,
    Float,
};

use crate::error::{PcaError, Result};
use crate::hyperparams::{PcaParams, SvdSolver};
use crate::pca::Pca;

/// Subtract the column means and afterwards the row means of a matrix
pub fn double_center<F: Float, S: Data<Elem = F>>(
    matrix: &ArrayBase<S, ndarray::Ix2>,
) -> Result<Array2<F>> {
    let column_mean = matrix
        .mean_axis(Axis(0))
        .ok_or(PcaError::NotEnoughSamples)?;
    let mut centered = matrix - &column_mean.insert_axis(Axis(0));

    let row_mean = centered
        .mean_axis(Axis(1))
        .ok_or(PcaError::NotEnoughSamples)?;
    centered -= &row_mean.insert_axis(Axis(1));

    Ok(centered)
}

fn check_components(n_components: usize, shape: (usize, usize)) -> Result<()> {
    let max_components = shape.0.min(shape.1);
    if n_components == 0 || n_components > max_components {
        return Err(PcaError::InvalidComponents(n_components, max_components));
    }
    Ok(())
}

fn principal_axes<F: Float>(
    observations: Array2<F>,
    n_components: usize,
    random_state: Option<u64>,
) -> Result<Array2<F>> {
    let mut params = PcaParams::new(n_components)
        .whiten(true)
        .svd_solver(SvdSolver::Randomized);
    if let Some(seed) = random_state {
        params = params.random_state(seed);
    }

    let model: Pca<F> = params.fit(&observations)?;
    Ok(model.components().to_owned())
}

/// Spatial principal axes as rows of a `(n_components, n_pixels)` matrix
pub fn spatial_components<F: Float, S: Data<Elem = F>, D: Dimension>(
    stack: &ArrayBase<S, D>,
    n_components: usize,
    random_state: Option<u64>,
) -> Result<Array2<F>> {
    let (observations, shape) = linearize(stack)?;
    check_components(n_components, observations.dim())?;
    log::debug!(
        "spatial PCA with {} components on {} frames of {}x{} pixels",
        n_components,
        shape.frames,
        shape.height,
        shape.width
    );

    principal_axes(double_center(&observations)?, n_components, random_state)
}

/// Spatial PCA with components reshaped to `(n_components, height, width)`
pub fn spatial_pca<F: Float, S: Data<Elem = F>, D: Dimension>(
    stack: &ArrayBase<S, D>,
    n_components: usize,
    random_state: Option<u64>,
) -> Result<Array3<F>> {
    let components = spatial_components(stack, n_components, random_state)?;
    let (_, shape) = linearize(stack)?;

    Ok(reshape(&components, n_components, &shape)?)
}

/// Temporal principal axes as rows of a `(n_components, n_frames)` matrix
pub fn temporal_pca<F: Float, S: Data<Elem = F>, D: Dimension>(
    stack: &ArrayBase<S, D>,
    n_components: usize,
    random_state: Option<u64>,
) -> Result<Array2<F>> {
    let (observations, _) = linearize(stack)?;
    let observations = observations.t();
    check_components(n_components, observations.dim())?;
    log::debug!(
        "temporal PCA with {} components on {} pixels of {} frames",
        n_components,
        observations.nrows(),
        observations.ncols()
    );

    principal_axes(double_center(&observations)?, n_components, random_state)
}
