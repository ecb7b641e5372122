//! Conversion between frame stacks and observation matrices
//!
//! A frame stack with shape `(frames, height, width)` becomes a matrix of shape
//! `(frames, height * width)` where each row holds one frame in row-major pixel order. The
//! reverse direction turns the rows of a component matrix back into images.
use ndarray::{ArrayBase, CowArray, Data, Dimension, Ix2, Ix3};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Spatial and temporal extent of a frame stack
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StackShape {
    pub frames: usize,
    pub height: usize,
    pub width: usize,
}

impl StackShape {
    /// Number of pixels in one frame
    pub fn npixels(&self) -> usize {
        self.height * self.width
    }
}

/// Flatten a frame stack into its observation matrix
///
/// The input may have any dimensionality, but anything other than three axes is rejected with
/// [`Error::ShapeMismatch`]. When the stack is stored in standard layout the returned matrix
/// borrows its memory, otherwise a copy is made.
pub fn linearize<F: Clone, S: Data<Elem = F>, D: Dimension>(
    stack: &ArrayBase<S, D>,
) -> Result<(CowArray<'_, F, Ix2>, StackShape)> {
    if stack.ndim() != 3 {
        return Err(Error::ShapeMismatch(format!(
            "a frame stack needs three axes (frame, row, column), got shape {:?}",
            stack.shape()
        )));
    }

    let stack = stack.view().into_dimensionality::<Ix3>()?;
    let (frames, height, width) = stack.dim();
    let shape = StackShape {
        frames,
        height,
        width,
    };

    let matrix = if stack.is_standard_layout() {
        CowArray::from(stack.into_shape((frames, height * width))?)
    } else {
        CowArray::from(
            stack
                .as_standard_layout()
                .into_owned()
                .into_shape((frames, height * width))?,
        )
    };

    Ok((matrix, shape))
}

/// Restore the images of a component matrix
///
/// Every row of `matrix` is one component with `shape.npixels()` entries, the result has shape
/// `(n_components, height, width)`.
pub fn reshape<F: Clone, S: Data<Elem = F>>(
    matrix: &ArrayBase<S, Ix2>,
    n_components: usize,
    shape: &StackShape,
) -> Result<ndarray::Array3<F>> {
    if matrix.nrows() != n_components || matrix.ncols() != shape.npixels() {
        return Err(Error::ShapeMismatch(format!(
            "cannot reshape a {}x{} matrix into {} images of {}x{}",
            matrix.nrows(),
            matrix.ncols(),
            n_components,
            shape.height,
            shape.width
        )));
    }

    let images = matrix
        .as_standard_layout()
        .into_owned()
        .into_shape((n_components, shape.height, shape.width))?;

    Ok(images)
}
