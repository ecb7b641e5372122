#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use stdecomp::{Float, ParamGuard};

use crate::error::NmfError;
use crate::nmf::Nmf;

/// Initialization of the two factors before the multiplicative updates
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum NmfInit {
    /// Currently the same as `Nndsvda`
    #[default]
    Auto,
    /// Scaled absolute values of standard normal draws
    Random,
    /// Non-negative double singular value decomposition, zeros are kept
    Nndsvd,
    /// NNDSVD with zeros replaced by the mean of the data
    Nndsvda,
    /// NNDSVD with zeros replaced by small random values
    Nndsvdar,
}

impl NmfInit {
    pub fn resolve(self) -> NmfInit {
        match self {
            NmfInit::Auto => NmfInit::Nndsvda,
            init => init,
        }
    }
}

/// Non-negative matrix factorization parameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct NmfValidParams<F> {
    n_components: usize,
    init: NmfInit,
    tol: F,
    max_iter: usize,
    random_state: Option<u64>,
}

impl<F: Float> NmfValidParams<F> {
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn init(&self) -> NmfInit {
        self.init
    }

    pub fn tol(&self) -> F {
        self.tol
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct NmfParams<F>(NmfValidParams<F>);

impl<F: Float> Nmf<F> {
    /// Create default parameter set for `n_components` components
    pub fn params(n_components: usize) -> NmfParams<F> {
        NmfParams::new(n_components)
    }
}

impl<F: Float> NmfParams<F> {
    pub fn new(n_components: usize) -> Self {
        Self(NmfValidParams {
            n_components,
            init: NmfInit::Auto,
            tol: F::cast(1e-4),
            max_iter: 200,
            random_state: None,
        })
    }

    /// Set the initialization of the factors, refer [`NmfInit`]
    pub fn init(mut self, init: NmfInit) -> Self {
        self.0.init = init;
        self
    }

    /// Set the tolerance on the relative decrease of the reconstruction error
    pub fn tol(mut self, tol: F) -> Self {
        self.0.tol = tol;
        self
    }

    /// Set maximum number of iterations during fit
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Set seed for random number generator for reproducible results.
    ///
    /// Only the `Random` and `Nndsvdar` initializations draw random numbers. Without a seed they
    /// differ between fits.
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }
}

impl<F: Float> ParamGuard for NmfParams<F> {
    type Checked = NmfValidParams<F>;
    type Error = NmfError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.n_components == 0 {
            Err(NmfError::InvalidValue(
                "number of components must be positive".to_string(),
            ))
        } else if !(self.0.tol >= F::zero()) {
            Err(NmfError::InvalidValue(format!(
                "tolerance must be non-negative, got {}",
                self.0.tol
            )))
        } else if self.0.max_iter == 0 {
            Err(NmfError::InvalidValue(
                "max_iter must be positive".to_string(),
            ))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
