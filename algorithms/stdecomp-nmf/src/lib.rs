//! # Non-negative Matrix Factorization
//!
//! `stdecomp-nmf` factorizes a non-negative observation matrix into two non-negative factors.
//! In a frame stack the rows are frames and the columns pixels, so the components are
//! non-negative images and the coefficients their intensity over time.
//!
//! Parameters are set through [`NmfParams`], fitting returns an [`Nmf`] model with the
//! components, the reconstruction error and the convergence report.

pub mod error;
mod hyperparams;
mod nmf;

pub use error::{NmfError, Result};
pub use hyperparams::{NmfInit, NmfParams, NmfValidParams};
pub use nmf::Nmf;
