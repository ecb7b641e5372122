use thiserror::Error;

pub type Result<T> = std::result::Result<T, NmfError>;

/// An error when factorizing a matrix into non-negative factors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NmfError {
    #[error("At least 1 sample needed")]
    NotEnoughSamples,
    /// The input has negative or NaN entries, found before any update is applied
    #[error("negative values in data passed to NMF, found {0}")]
    NegativeInput(String),
    #[error("number of components must be in 1..={1}, got {0}")]
    InvalidComponents(usize, usize),
    #[error("Invalid value encountered: {0}")]
    InvalidValue(String),
    #[error(transparent)]
    StdecompError(#[from] stdecomp::error::Error),
}
