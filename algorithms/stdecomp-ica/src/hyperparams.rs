use crate::{error::FastIcaError, fast_ica::FastIca, fast_ica::GFunc};
use ndarray::Array2;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use stdecomp::{Float, ParamGuard};

/// Whitening applied to the centered data before the unmixing matrix is estimated
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum WhitenStrategy {
    /// Whiten and rescale the recovered sources to unit variance
    #[default]
    UnitVariance,
    /// Whiten, but leave the variance of the recovered sources arbitrary
    ArbitraryVariance,
    /// The data is already white, neither centering nor whitening is applied
    Disabled,
}

/// Fast Independent Component Analysis (ICA)
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct FastIcaValidParams<F: Float> {
    ncomponents: Option<usize>,
    gfunc: GFunc,
    max_iter: usize,
    tol: F,
    whiten: WhitenStrategy,
    w_init: Option<Array2<F>>,
    random_state: Option<u64>,
}

impl<F: Float> FastIcaValidParams<F> {
    pub fn ncomponents(&self) -> &Option<usize> {
        &self.ncomponents
    }

    pub fn gfunc(&self) -> &GFunc {
        &self.gfunc
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn tol(&self) -> F {
        self.tol
    }

    pub fn whiten(&self) -> WhitenStrategy {
        self.whiten
    }

    pub fn w_init(&self) -> Option<&Array2<F>> {
        self.w_init.as_ref()
    }

    pub fn random_state(&self) -> &Option<u64> {
        &self.random_state
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct FastIcaParams<F: Float>(FastIcaValidParams<F>);

impl<F: Float> Default for FastIcaParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> FastIca<F> {
    pub fn params() -> FastIcaParams<F> {
        FastIcaParams::new()
    }
}

impl<F: Float> FastIcaParams<F> {
    /// Create new FastICA algorithm with default values for its parameters
    pub fn new() -> Self {
        Self(FastIcaValidParams {
            ncomponents: None,
            gfunc: GFunc::Logcosh(1.),
            max_iter: 200,
            tol: F::cast(1e-4),
            whiten: WhitenStrategy::UnitVariance,
            w_init: None,
            random_state: None,
        })
    }

    /// Set the number of components to use, if not set all are used
    pub fn ncomponents(mut self, ncomponents: usize) -> Self {
        self.0.ncomponents = Some(ncomponents);
        self
    }

    /// G function used in the approximation to neg-entropy, refer [`GFunc`]
    pub fn gfunc(mut self, gfunc: GFunc) -> Self {
        self.0.gfunc = gfunc;
        self
    }

    /// Set maximum number of iterations during fit
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Set tolerance on update at each iteration
    pub fn tol(mut self, tol: F) -> Self {
        self.0.tol = tol;
        self
    }

    /// Set the whitening strategy, refer [`WhitenStrategy`]
    pub fn whiten(mut self, whiten: WhitenStrategy) -> Self {
        self.0.whiten = whiten;
        self
    }

    /// Initial unmixing matrix of shape `(ncomponents, ncomponents)`
    ///
    /// If unset a matrix with uniformly distributed entries is drawn.
    pub fn w_init(mut self, w_init: Array2<F>) -> Self {
        self.0.w_init = Some(w_init);
        self
    }

    /// Set seed for random number generator for reproducible results.
    ///
    /// Without a seed the initial unmixing matrix differs between fits.
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }
}

impl<F: Float> ParamGuard for FastIcaParams<F> {
    type Checked = FastIcaValidParams<F>;
    type Error = FastIcaError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if !(self.0.tol >= F::zero()) {
            return Err(FastIcaError::InvalidTolerance(
                self.0.tol.to_f32().unwrap_or(f32::NAN),
            ));
        }
        if self.0.max_iter == 0 {
            return Err(FastIcaError::InvalidValue(
                "max_iter must be positive".to_string(),
            ));
        }
        if self.0.ncomponents == Some(0) {
            return Err(FastIcaError::InvalidValue(
                "ncomponents must be positive".to_string(),
            ));
        }
        if let GFunc::Logcosh(alpha) = self.0.gfunc {
            if !(1.0..=2.0).contains(&alpha) {
                return Err(FastIcaError::InvalidValue(format!(
                    "alpha must be between 1 and 2 inclusive, got {}",
                    alpha
                )));
            }
        }
        if let Some(w_init) = &self.0.w_init {
            if !w_init.is_square() {
                return Err(FastIcaError::InvalidValue(format!(
                    "w_init must be a square matrix, got shape {:?}",
                    w_init.shape()
                )));
            }
        }

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
