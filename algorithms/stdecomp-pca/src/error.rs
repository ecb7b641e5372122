use thiserror::Error;

pub type Result<T> = std::result::Result<T, PcaError>;

/// An error when fitting a principal component analysis
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PcaError {
    #[error("At least 1 sample needed")]
    NotEnoughSamples,
    /// The number of components is zero or exceeds the rank bound `min(n_samples, n_features)`
    #[error("number of components must be in 1..={1}, got {0}")]
    InvalidComponents(usize, usize),
    #[error("Invalid value encountered: {0}")]
    InvalidValue(String),
    #[error(transparent)]
    StdecompError(#[from] stdecomp::error::Error),
}
