#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use stdecomp::ParamGuard;

use crate::error::PcaError;

/// Method used to compute the singular value decomposition
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SvdSolver {
    /// Exact decomposition for small inputs or many components, randomized otherwise
    #[default]
    Auto,
    /// Exact decomposition through the Gram matrix
    Full,
    /// Randomized range finder with power iterations
    Randomized,
}

impl SvdSolver {
    /// Resolve `Auto` into a concrete solver for a `(n_samples, n_features)` matrix
    pub fn resolve(self, shape: (usize, usize), n_components: usize) -> SvdSolver {
        match self {
            SvdSolver::Auto => {
                let (n, p) = shape;
                let smallest = n.min(p) as f64;
                if n.max(p) <= 500 || n_components as f64 >= 0.8 * smallest {
                    SvdSolver::Full
                } else {
                    SvdSolver::Randomized
                }
            }
            solver => solver,
        }
    }
}

/// Principal Component Analysis parameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct PcaValidParams {
    n_components: usize,
    whiten: bool,
    svd_solver: SvdSolver,
    n_oversamples: usize,
    n_power_iter: Option<usize>,
    random_state: Option<u64>,
}

impl PcaValidParams {
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn whiten(&self) -> bool {
        self.whiten
    }

    pub fn svd_solver(&self) -> SvdSolver {
        self.svd_solver
    }

    pub fn n_oversamples(&self) -> usize {
        self.n_oversamples
    }

    /// Number of power iterations of the randomized solver for a matrix with smallest dimension
    /// `min_dim`
    pub fn n_power_iter(&self, min_dim: usize) -> usize {
        self.n_power_iter.unwrap_or_else(|| {
            if (self.n_components as f64) < 0.1 * min_dim as f64 {
                7
            } else {
                4
            }
        })
    }

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }
}

/// Unchecked Principal Component Analysis parameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct PcaParams(PcaValidParams);

impl PcaParams {
    /// Create default parameter set for `n_components` components
    pub fn new(n_components: usize) -> Self {
        Self(PcaValidParams {
            n_components,
            whiten: false,
            svd_solver: SvdSolver::Auto,
            n_oversamples: 10,
            n_power_iter: None,
            random_state: None,
        })
    }

    /// Apply whitening to the projection
    ///
    /// Whitening scales the projected data such that every component has unit variance on the
    /// training data. The components themselves keep unit norm.
    pub fn whiten(mut self, apply: bool) -> Self {
        self.0.whiten = apply;
        self
    }

    pub fn svd_solver(mut self, solver: SvdSolver) -> Self {
        self.0.svd_solver = solver;
        self
    }

    /// Number of additional random vectors of the randomized solver
    pub fn n_oversamples(mut self, n_oversamples: usize) -> Self {
        self.0.n_oversamples = n_oversamples;
        self
    }

    /// Number of power iterations of the randomized solver, chosen from the input shape if unset
    pub fn n_power_iter(mut self, n_power_iter: usize) -> Self {
        self.0.n_power_iter = Some(n_power_iter);
        self
    }

    /// Set seed for random number generator for reproducible results.
    ///
    /// Without a seed the randomized solver draws a new test matrix on every fit.
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }
}

impl ParamGuard for PcaParams {
    type Checked = PcaValidParams;
    type Error = PcaError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.n_components == 0 {
            Err(PcaError::InvalidValue(
                "number of components must be positive".to_string(),
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
