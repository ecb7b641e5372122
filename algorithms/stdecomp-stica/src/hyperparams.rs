#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use stdecomp::{masks::MaskParams, Float, ParamGuard};
use stdecomp_ica::{fast_ica::GFunc, FastIcaParams, WhitenStrategy};

use crate::error::StIcaError;
use crate::stica::StIca;

/// Spatio-temporal ICA parameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct StIcaValidParams<F: Float> {
    n_components: usize,
    mu: F,
    whiten: WhitenStrategy,
    gfunc: GFunc,
    max_iter: usize,
    tol: F,
    random_state: Option<u64>,
    as_masks: bool,
    mask_params: MaskParams<F>,
    order_by_skewness: bool,
}

impl<F: Float> StIcaValidParams<F> {
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn mu(&self) -> F {
        self.mu
    }

    pub fn whiten(&self) -> WhitenStrategy {
        self.whiten
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

    pub fn random_state(&self) -> Option<u64> {
        self.random_state
    }

    pub fn as_masks(&self) -> bool {
        self.as_masks
    }

    pub fn mask_params(&self) -> &MaskParams<F> {
        &self.mask_params
    }

    pub fn order_by_skewness(&self) -> bool {
        self.order_by_skewness
    }

    /// FastICA parameters applied to the joint spatio-temporal matrix
    pub fn ica_params(&self) -> FastIcaParams<F> {
        let params = FastIcaParams::new()
            .ncomponents(self.n_components)
            .whiten(self.whiten)
            .gfunc(self.gfunc)
            .max_iter(self.max_iter)
            .tol(self.tol);

        match self.random_state {
            Some(seed) => params.random_state(seed),
            None => params,
        }
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct StIcaParams<F: Float>(StIcaValidParams<F>);

impl<F: Float> StIca<F> {
    /// Create default parameter set for `n_components` components
    pub fn params(n_components: usize) -> StIcaParams<F> {
        StIcaParams::new(n_components)
    }
}

impl<F: Float> StIcaParams<F> {
    pub fn new(n_components: usize) -> Self {
        Self(StIcaValidParams {
            n_components,
            mu: F::cast(0.5),
            whiten: WhitenStrategy::UnitVariance,
            gfunc: GFunc::Logcosh(1.0),
            max_iter: 200,
            tol: F::cast(1e-4),
            random_state: None,
            as_masks: false,
            mask_params: MaskParams::new(),
            order_by_skewness: true,
        })
    }

    /// Weight of the temporal part in `[0, 1]`
    ///
    /// Zero decomposes the spatial components only, one the temporal components only.
    pub fn mu(mut self, mu: F) -> Self {
        self.0.mu = mu;
        self
    }

    /// Whitening of the FastICA step, refer [`WhitenStrategy`]
    pub fn whiten(mut self, whiten: WhitenStrategy) -> Self {
        self.0.whiten = whiten;
        self
    }

    /// G function of the FastICA step, refer [`GFunc`]
    pub fn gfunc(mut self, gfunc: GFunc) -> Self {
        self.0.gfunc = gfunc;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    pub fn tol(mut self, tol: F) -> Self {
        self.0.tol = tol;
        self
    }

    /// Set seed for random number generator for reproducible results.
    ///
    /// The seed is shared by both principal component analyses and FastICA. Without a seed the
    /// result differs between fits.
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }

    /// Convert the spatial filters into labelled masks
    pub fn as_masks(mut self, as_masks: bool) -> Self {
        self.0.as_masks = as_masks;
        self
    }

    pub fn mask_params(mut self, mask_params: MaskParams<F>) -> Self {
        self.0.mask_params = mask_params;
        self
    }

    /// Sort the components by descending absolute skewness, enabled by default
    pub fn order_by_skewness(mut self, order: bool) -> Self {
        self.0.order_by_skewness = order;
        self
    }
}

impl<F: Float> ParamGuard for StIcaParams<F> {
    type Checked = StIcaValidParams<F>;
    type Error = StIcaError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.n_components == 0 {
            return Err(StIcaError::InvalidValue(
                "number of components must be positive".to_string(),
            ));
        }
        if !(self.0.mu >= F::zero() && self.0.mu <= F::one()) {
            return Err(StIcaError::InvalidMu(
                self.0.mu.to_f32().unwrap_or(f32::NAN),
            ));
        }
        self.0.ica_params().check_ref()?;
        self.0.mask_params.check_ref()?;

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
