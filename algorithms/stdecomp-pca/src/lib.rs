//! # Principal Component Analysis
//!
//! `stdecomp-pca` provides a pure Rust implementation of principal component analysis with an
//! exact and a randomized solver, together with the spatial and temporal variants used on frame
//! stacks.
//!
//! PCA finds the orthonormal directions of largest variance of an observation matrix. On a frame
//! stack the spatial variant yields images (eigen-images) and the temporal variant time courses,
//! both serve as the reduced input of the spatio-temporal ICA in `stdecomp-stica`.
//!
//! ## Current state
//!
//! `stdecomp-pca` currently provides an implementation of the following methods:
//!
//! - Principal Component Analysis ([`Pca`]) with exact and randomized SVD
//! - Spatial and temporal PCA of frame stacks ([`stack`])

pub mod error;
mod hyperparams;
mod pca;
pub mod stack;

pub use error::{PcaError, Result};
pub use hyperparams::{PcaParams, PcaValidParams, SvdSolver};
pub use pca::Pca;
