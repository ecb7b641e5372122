//! Single method decompositions of frame stacks
//!
//! Every frame is a sample and every pixel a feature. The fitted components live in pixel space
//! and are returned as images of shape `(n_components, height, width)`.
use ndarray::{Array3, ArrayBase, CowArray, Data, Ix2, Ix3};

use stdecomp::{
    stack::{linearize, reshape, StackShape},
    traits::Fit,
    Float, ParamGuard,
};
use stdecomp_ica::{fast_ica::FastIca, FastIcaParams};
use stdecomp_nmf::{Nmf, NmfParams};
use stdecomp_pca::{Pca, PcaParams};

use crate::error::{Result, StIcaError};

/// Spatial components of a frame stack and the convergence report of the solver
#[derive(Debug, Clone, PartialEq)]
pub struct StackComponents<F> {
    pub components: Array3<F>,
    /// Iterations of iterative solvers, `None` for direct ones
    pub n_iter: Option<usize>,
    pub converged: bool,
}

/// Decomposition of a frame stack into spatial components
pub trait StackDecomposer<F: Float> {
    fn decompose_stack<S: Data<Elem = F>>(
        &self,
        stack: &ArrayBase<S, Ix3>,
    ) -> Result<StackComponents<F>>;
}

/// Observation matrix of the stack, after checking that `n_components` lies in
/// `1..=min(frames, pixels)`
fn observations<F: Float, S: Data<Elem = F>>(
    stack: &ArrayBase<S, Ix3>,
    n_components: usize,
) -> Result<(CowArray<'_, F, Ix2>, StackShape)> {
    let (observations, shape) = linearize(stack)?;
    let max_components = shape.frames.min(shape.npixels());
    if n_components == 0 || n_components > max_components {
        return Err(StIcaError::InvalidComponents(n_components, max_components));
    }
    log::debug!(
        "decomposing {} frames of {}x{} pixels into {} components",
        shape.frames,
        shape.height,
        shape.width,
        n_components
    );

    Ok((observations, shape))
}

impl<F: Float> StackDecomposer<F> for PcaParams {
    fn decompose_stack<S: Data<Elem = F>>(
        &self,
        stack: &ArrayBase<S, Ix3>,
    ) -> Result<StackComponents<F>> {
        let params = self.check_ref()?;
        let (observations, shape) = observations(stack, params.n_components())?;

        let model: Pca<F> = params.fit(&observations).map_err(StIcaError::Pca)?;

        Ok(StackComponents {
            components: reshape(model.components(), params.n_components(), &shape)?,
            n_iter: None,
            converged: true,
        })
    }
}

impl<F: Float> StackDecomposer<F> for FastIcaParams<F> {
    fn decompose_stack<S: Data<Elem = F>>(
        &self,
        stack: &ArrayBase<S, Ix3>,
    ) -> Result<StackComponents<F>> {
        let params = self.check_ref()?;
        let (frames, height, width) = stack.dim();
        let n_components = params
            .ncomponents()
            .unwrap_or_else(|| frames.min(height * width));
        let (observations, shape) = observations(stack, n_components)?;

        let model: FastIca<F> = params.fit(&observations).map_err(StIcaError::Ica)?;
        let components = model.components();

        Ok(StackComponents {
            components: reshape(components, components.nrows(), &shape)?,
            n_iter: Some(model.n_iter()),
            converged: model.converged(),
        })
    }
}

impl<F: Float> StackDecomposer<F> for NmfParams<F> {
    fn decompose_stack<S: Data<Elem = F>>(
        &self,
        stack: &ArrayBase<S, Ix3>,
    ) -> Result<StackComponents<F>> {
        let params = self.check_ref()?;
        let (observations, shape) = observations(stack, params.n_components())?;

        let model: Nmf<F> = params.fit(&observations).map_err(StIcaError::Nmf)?;

        Ok(StackComponents {
            components: reshape(model.components(), params.n_components(), &shape)?,
            n_iter: Some(model.n_iter()),
            converged: model.converged(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;
    use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
    use paste::paste;
    use rand_xoshiro::Xoshiro256Plus;
    use stdecomp_nmf::NmfError;

    fn random_stack() -> Array3<f64> {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        Array::random_using((10, 20, 20), Uniform::new(0., 1.), &mut rng)
    }

    macro_rules! component_range_tests {
        ($($name:ident: $params:expr,)*) => {
            paste! {
                $(
                    #[test]
                    fn [<$name _component_range>]() {
                        let stack = random_stack();

                        let res = $params(0).decompose_stack(&stack);
                        assert!(res.is_err());

                        let res = $params(11).decompose_stack(&stack);
                        assert!(matches!(res, Err(StIcaError::InvalidComponents(11, 10))));

                        let res = $params(3).decompose_stack(&stack).unwrap();
                        assert_eq!(res.components.dim(), (3, 20, 20));
                    }
                )*
            }
        }
    }

    component_range_tests! {
        pca: |n| PcaParams::new(n).random_state(0),
        fast_ica: |n| FastIcaParams::<f64>::new().ncomponents(n).random_state(0),
        nmf: |n| NmfParams::<f64>::new(n).random_state(0),
    }

    #[test]
    fn nmf_rejects_negative_stacks() {
        let stack = random_stack() - 0.5;
        let res = NmfParams::new(3).decompose_stack(&stack);

        assert!(matches!(
            res,
            Err(StIcaError::Nmf(NmfError::NegativeInput(_)))
        ));
    }

    #[test]
    fn pca_is_direct() {
        let res = PcaParams::new(2).decompose_stack(&random_stack()).unwrap();
        assert!(res.converged);
        assert_eq!(res.n_iter, None);
    }
}
