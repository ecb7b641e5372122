//! Temporal traces of masked regions
//!
//! The trace of a component is the mean intensity of the pixels inside its mask, evaluated for
//! every frame of the stack.
use ndarray::{Array2, ArrayBase, Axis, Data, Ix3};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stack::linearize;
use crate::Float;

/// Handling of masks which select no pixel
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EmptyMaskPolicy {
    /// Fail with [`Error::EmptyMask`]
    #[default]
    Abort,
    /// Report a trace of zeros for the component
    ZeroFill,
}

/// Derive one trace per mask, aborting on empty masks
pub fn derive_traces<F: Float, S: Data<Elem = F>, M: Data<Elem = usize>>(
    stack: &ArrayBase<S, Ix3>,
    masks: &ArrayBase<M, Ix3>,
) -> Result<Array2<F>> {
    derive_traces_with(stack, masks, EmptyMaskPolicy::Abort)
}

/// Derive one trace per mask
///
/// `stack` has shape `(frames, height, width)` and `masks` `(n_components, height, width)`. Any
/// non-zero value marks a pixel as part of the mask. The result has shape
/// `(n_components, frames)`.
pub fn derive_traces_with<F: Float, S: Data<Elem = F>, M: Data<Elem = usize>>(
    stack: &ArrayBase<S, Ix3>,
    masks: &ArrayBase<M, Ix3>,
    policy: EmptyMaskPolicy,
) -> Result<Array2<F>> {
    let (_, height, width) = stack.dim();
    let (ncomponents, mask_height, mask_width) = masks.dim();
    if (height, width) != (mask_height, mask_width) {
        return Err(Error::ShapeMismatch(format!(
            "masks of {}x{} pixels do not fit frames of {}x{} pixels",
            mask_height, mask_width, height, width
        )));
    }

    let (observations, shape) = linearize(stack)?;
    let mut traces = Array2::zeros((ncomponents, shape.frames));

    for (i, (mask, mut trace)) in masks
        .outer_iter()
        .zip(traces.outer_iter_mut())
        .enumerate()
    {
        // masks may be stored in any layout, walk them in logical order
        let pixels = mask
            .iter()
            .enumerate()
            .filter(|&(_, &label)| label != 0)
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();

        if pixels.is_empty() {
            match policy {
                EmptyMaskPolicy::Abort => return Err(Error::EmptyMask(i)),
                EmptyMaskPolicy::ZeroFill => {
                    log::debug!("mask {} is empty, its trace is set to zero", i);
                    continue;
                }
            }
        }

        let mean = observations
            .select(Axis(1), &pixels)
            .mean_axis(Axis(1))
            .ok_or(Error::NotEnoughSamples)?;
        trace.assign(&mean);
    }

    Ok(traces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array, Array3};

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<EmptyMaskPolicy>();
    }

    fn ramp_stack() -> Array3<f64> {
        // pixel value grows with the frame and the column
        Array::from_shape_fn((4, 3, 3), |(f, _, c)| (f * 10 + c) as f64)
    }

    #[test]
    fn traces_average_inside_masks() {
        let stack = ramp_stack();
        let masks: Array3<usize> = array![
            [[1, 0, 0], [1, 0, 0], [0, 0, 0]],
            [[0, 0, 2], [0, 2, 2], [0, 0, 0]]
        ];

        let traces = derive_traces(&stack, &masks).unwrap();

        assert_eq!(traces.dim(), (2, 4));
        assert_abs_diff_eq!(traces.row(0), array![0., 10., 20., 30.]);
        let expected = array![5. / 3., 35. / 3., 65. / 3., 95. / 3.];
        assert_abs_diff_eq!(traces.row(1), expected, epsilon = 1e-12);
    }

    #[test]
    fn empty_mask_policies() {
        let stack = ramp_stack();
        let masks: Array3<usize> = array![
            [[0, 0, 0], [0, 0, 0], [0, 0, 0]],
            [[0, 2, 0], [0, 0, 0], [0, 0, 0]]
        ];

        assert!(matches!(
            derive_traces(&stack, &masks),
            Err(Error::EmptyMask(0))
        ));

        let traces = derive_traces_with(&stack, &masks, EmptyMaskPolicy::ZeroFill).unwrap();
        assert_abs_diff_eq!(traces.row(0), array![0., 0., 0., 0.]);
        assert_abs_diff_eq!(traces.row(1), array![1., 11., 21., 31.]);
    }

    #[test]
    fn spatial_shapes_must_agree() {
        let stack = ramp_stack();
        let masks = Array3::<usize>::ones((1, 3, 4));

        assert!(matches!(
            derive_traces(&stack, &masks),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn transposed_masks_follow_logical_order() {
        let stack = ramp_stack();
        let mut masks: Array3<usize> = array![[[1, 1, 1], [0, 0, 0], [0, 0, 0]]];
        masks.swap_axes(1, 2);

        // the mask now covers the first column
        let traces = derive_traces(&stack, &masks).unwrap();
        assert_abs_diff_eq!(traces.row(0), array![0., 10., 20., 30.]);
    }
}
