//! `stdecomp` provides the building blocks to factorize multi-frame image data (for example
//! calcium imaging or other microscopy time series) into spatial components and temporal
//! signals.
//!
//! A frame stack is a three dimensional array with axes `(frame, row, column)`. The decomposition
//! algorithms operate on its matrix form, the observation matrix, where every frame is flattened
//! into a row. This crate contains the pieces shared by every decomposition method:
//!
//! * [`stack`]: conversion between frame stacks and observation matrices
//! * [`masks`]: conversion of continuous spatial filters into labelled binary masks
//! * [`traces`]: temporal traces obtained by averaging the frames inside each mask
//! * [`ordering`]: ranking of components by the absolute skewness of their values
//! * [`linalg`]: truncated singular value decompositions used by PCA, ICA and NMF
//!
//! The decomposition algorithms themselves live in the `stdecomp-pca`, `stdecomp-ica`,
//! `stdecomp-nmf` and `stdecomp-stica` crates of this workspace. All of them follow the same
//! pattern: a set of unchecked hyperparameters is validated through [`ParamGuard`] and then
//! fitted with the [`traits::Fit`] trait.
//!
//! ```
//! use ndarray::Array3;
//! use stdecomp::{masks::extract_masks, stack::{linearize, reshape}};
//!
//! let stack = Array3::<f64>::from_shape_fn((4, 8, 8), |(f, r, c)| (f + r * c) as f64);
//! let (matrix, shape) = linearize(&stack).unwrap();
//! assert_eq!(matrix.dim(), (4, 64));
//!
//! let filters = reshape(&matrix, 4, &shape).unwrap();
//! let masks = extract_masks(&filters);
//! assert_eq!(masks.dim(), (4, 8, 8));
//! ```

pub mod error;
mod float;
pub mod linalg;
pub mod masks;
pub mod ordering;
pub mod param_guard;
pub mod prelude;
pub mod random;
pub mod stack;
pub mod traces;
pub mod traits;

pub use error::{Error, Result};
pub use float::Float;
pub use param_guard::ParamGuard;
