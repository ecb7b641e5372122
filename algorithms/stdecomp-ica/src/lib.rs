//! # Independent Component Analysis (ICA)
//!
//! `stdecomp-ica` aims to provide pure Rust implementations of ICA algorithms.
//!
//! ICA separates mutivariate signals into their additive, independent subcomponents.
//! ICA is primarily used for separating superimposed signals and not for dimensionality
//! reduction.
//!
//! Input data is whitened (remove underlying correlation) before modeling, unless whitening is
//! disabled with [`WhitenStrategy::Disabled`].
//!
//! ## The Big Picture
//!
//! `stdecomp-ica` is a crate in the `stdecomp` workspace, which decomposes multi-frame image
//! data into spatial components and temporal signals. The spatio-temporal ICA of
//! `stdecomp-stica` runs FastICA on the output of spatial and temporal PCA.
//!
//! ## Current state
//!
//! `stdecomp-ica` currently provides an implementation of the following methods:
//!
//! - Fast Independent Component Analysis (Fast ICA)

pub mod error;
pub mod fast_ica;
mod hyperparams;

pub use hyperparams::{FastIcaParams, FastIcaValidParams, WhitenStrategy};
