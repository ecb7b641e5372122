//! Error types of the decompositions
//!
//! [`StIcaError`] is returned by the stICA model and the frame stack decomposers.
//! [`DecompositionError`] is the error of the [`decompose`](crate::decompose()) entry point, it
//! groups every failure of the workspace into a small set of categories.
use stdecomp::Float;
use stdecomp_ica::error::FastIcaError;
use stdecomp_nmf::NmfError;
use stdecomp_pca::PcaError;
use thiserror::Error;

use crate::decompose::Decomposition;

pub type Result<T> = std::result::Result<T, StIcaError>;

#[derive(Error, Debug)]
pub enum StIcaError {
    /// The weight of the temporal part lies outside of `[0, 1]`
    #[error("mu must lie in [0, 1], got {0}")]
    InvalidMu(f32),
    #[error("number of components must be in 1..={1}, got {0}")]
    InvalidComponents(usize, usize),
    #[error("Invalid value encountered: {0}")]
    InvalidValue(String),
    #[error(transparent)]
    Pca(#[from] PcaError),
    #[error(transparent)]
    Ica(#[from] FastIcaError),
    #[error(transparent)]
    Nmf(#[from] NmfError),
    #[error(transparent)]
    StdecompError(#[from] stdecomp::Error),
}

/// Failure of a decomposition request
#[derive(Error, Debug)]
pub enum DecompositionError<F: Float> {
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("mask of component {0} selects no pixels")]
    EmptyMask(usize),
    /// The iterative solver stopped at its iteration limit
    ///
    /// `partial` holds the complete result computed from the last iterate.
    #[error("decomposition did not converge within {iterations} iterations")]
    NotConverged {
        iterations: usize,
        partial: Box<Decomposition<F>>,
    },
    #[error("numerical failure: {0}")]
    Numerical(String),
}

impl<F: Float> DecompositionError<F> {
    /// Best effort result of a run that did not converge
    pub fn partial(&self) -> Option<&Decomposition<F>> {
        match self {
            DecompositionError::NotConverged { partial, .. } => Some(partial),
            _ => None,
        }
    }

    pub fn into_partial(self) -> Option<Decomposition<F>> {
        match self {
            DecompositionError::NotConverged { partial, .. } => Some(*partial),
            _ => None,
        }
    }
}

impl<F: Float> From<stdecomp::Error> for DecompositionError<F> {
    fn from(err: stdecomp::Error) -> Self {
        use stdecomp::Error::*;

        match err {
            ShapeMismatch(msg) => DecompositionError::ShapeMismatch(msg),
            NdShape(err) => DecompositionError::ShapeMismatch(err.to_string()),
            Parameters(msg) => DecompositionError::InvalidParameter(msg),
            InvalidInput(msg) => DecompositionError::InvalidInput(msg),
            EmptyMask(idx) => DecompositionError::EmptyMask(idx),
            NotEnoughSamples => DecompositionError::InvalidInput(NotEnoughSamples.to_string()),
            Linalg(err) => DecompositionError::Numerical(err.to_string()),
        }
    }
}

impl<F: Float> From<PcaError> for DecompositionError<F> {
    fn from(err: PcaError) -> Self {
        match err {
            PcaError::StdecompError(err) => err.into(),
            err @ PcaError::NotEnoughSamples => DecompositionError::InvalidInput(err.to_string()),
            err @ (PcaError::InvalidComponents(..) | PcaError::InvalidValue(_)) => {
                DecompositionError::InvalidParameter(err.to_string())
            }
            err => DecompositionError::Numerical(err.to_string()),
        }
    }
}

impl<F: Float> From<FastIcaError> for DecompositionError<F> {
    fn from(err: FastIcaError) -> Self {
        match err {
            FastIcaError::StdecompError(err) => err.into(),
            err @ FastIcaError::NotEnoughSamples => {
                DecompositionError::InvalidInput(err.to_string())
            }
            err @ (FastIcaError::InvalidValue(_) | FastIcaError::InvalidTolerance(_)) => {
                DecompositionError::InvalidParameter(err.to_string())
            }
            err @ (FastIcaError::SvdDecomposition | FastIcaError::Linalg(_)) => {
                DecompositionError::Numerical(err.to_string())
            }
        }
    }
}

impl<F: Float> From<NmfError> for DecompositionError<F> {
    fn from(err: NmfError) -> Self {
        match err {
            NmfError::StdecompError(err) => err.into(),
            err @ (NmfError::NegativeInput(_) | NmfError::NotEnoughSamples) => {
                DecompositionError::InvalidInput(err.to_string())
            }
            err @ (NmfError::InvalidComponents(..) | NmfError::InvalidValue(_)) => {
                DecompositionError::InvalidParameter(err.to_string())
            }
            err => DecompositionError::Numerical(err.to_string()),
        }
    }
}

impl<F: Float> From<StIcaError> for DecompositionError<F> {
    fn from(err: StIcaError) -> Self {
        match err {
            err @ (StIcaError::InvalidMu(_)
            | StIcaError::InvalidComponents(..)
            | StIcaError::InvalidValue(_)) => DecompositionError::InvalidParameter(err.to_string()),
            StIcaError::Pca(err) => err.into(),
            StIcaError::Ica(err) => err.into(),
            StIcaError::Nmf(err) => err.into(),
            StIcaError::StdecompError(err) => err.into(),
        }
    }
}
