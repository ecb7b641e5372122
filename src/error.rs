//! Error types of the core crate
//!

use linfa_linalg::LinalgError;
use ndarray::ShapeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// An array does not have the shape required by an operation
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("invalid parameter {0}")]
    Parameters(String),
    /// The values of the input are not supported, for example negative intensities
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A mask selects no pixel, so no trace can be averaged from it
    #[error("mask of component {0} selects no pixels")]
    EmptyMask(usize),
    #[error("Not enough samples to compute the mean")]
    NotEnoughSamples,
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}
