//! Single entry point for every decomposition method
//!
//! A [`Method`] carries the parameters of one of the supported methods. [`decompose`] runs it on
//! a frame stack and post-processes the components as requested by [`OutputOptions`]: ordering
//! by skewness, conversion into masks and extraction of the temporal traces inside every mask.
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, Array3, ArrayBase, Data, Ix3};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use stdecomp::{
    masks::MaskParams,
    ordering::{order_by_skewness, skewness_order},
    traces::{derive_traces_with, EmptyMaskPolicy},
    traits::{Fit, Transformer},
    Float, ParamGuard,
};
use stdecomp_ica::FastIcaParams;
use stdecomp_nmf::NmfParams;
use stdecomp_pca::PcaParams;

use crate::decomposers::{StackComponents, StackDecomposer};
use crate::error::{DecompositionError, StIcaError};
use crate::hyperparams::StIcaParams;
use crate::stica::StIca;

/// Number of components of the default parameter sets
pub const DEFAULT_COMPONENTS: usize = 6;

/// Name of a decomposition method
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Pca,
    FastIca,
    Nmf,
    StIca,
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            MethodKind::Pca => "PCA",
            MethodKind::FastIca => "ICA",
            MethodKind::Nmf => "NMF",
            MethodKind::StIca => "stICA",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for MethodKind {
    type Err = StIcaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pca" => Ok(MethodKind::Pca),
            "ica" | "fastica" => Ok(MethodKind::FastIca),
            "nmf" => Ok(MethodKind::Nmf),
            "stica" => Ok(MethodKind::StIca),
            _ => Err(StIcaError::InvalidValue(format!(
                "unknown decomposition method {:?}",
                s
            ))),
        }
    }
}

/// A decomposition method together with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Method<F: Float> {
    Pca(PcaParams),
    FastIca(FastIcaParams<F>),
    Nmf(NmfParams<F>),
    StIca(StIcaParams<F>),
}

impl<F: Float> Method<F> {
    /// Default parameters of a method with [`DEFAULT_COMPONENTS`] components
    ///
    /// PCA whitens its projection, the other methods keep the defaults of their parameter sets.
    pub fn default_for(kind: MethodKind) -> Self {
        match kind {
            MethodKind::Pca => Method::Pca(PcaParams::new(DEFAULT_COMPONENTS).whiten(true)),
            MethodKind::FastIca => {
                Method::FastIca(FastIcaParams::new().ncomponents(DEFAULT_COMPONENTS))
            }
            MethodKind::Nmf => Method::Nmf(NmfParams::new(DEFAULT_COMPONENTS)),
            MethodKind::StIca => Method::StIca(StIcaParams::new(DEFAULT_COMPONENTS)),
        }
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            Method::Pca(_) => MethodKind::Pca,
            Method::FastIca(_) => MethodKind::FastIca,
            Method::Nmf(_) => MethodKind::Nmf,
            Method::StIca(_) => MethodKind::StIca,
        }
    }
}

/// Order of the returned components
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ComponentOrder {
    /// The order produced by the method
    Native,
    /// Descending absolute skewness
    Skewness,
}

/// Post-processing of the components
#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions<F> {
    order: Option<ComponentOrder>,
    masks: bool,
    traces: bool,
    mask_params: MaskParams<F>,
    empty_mask: EmptyMaskPolicy,
}

impl<F: Float> Default for OutputOptions<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> OutputOptions<F> {
    /// Spatial components only, in the default order of the method
    pub fn new() -> Self {
        OutputOptions {
            order: None,
            masks: false,
            traces: false,
            mask_params: MaskParams::new(),
            empty_mask: EmptyMaskPolicy::Abort,
        }
    }

    /// Override the component order
    ///
    /// Without an override stICA sorts by skewness and every other method keeps its own order.
    pub fn order(mut self, order: ComponentOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Convert the spatial components into labelled masks
    pub fn masks(mut self, masks: bool) -> Self {
        self.masks = masks;
        self
    }

    /// Derive one temporal trace per mask, implies masks
    pub fn traces(mut self, traces: bool) -> Self {
        self.traces = traces;
        self
    }

    /// Smoothing and thresholding of the masks
    ///
    /// These parameters apply to every method. When stICA parameters ask for masks as well, the
    /// masks are still built with these parameters and the mask settings of the stICA
    /// parameters are ignored.
    pub fn mask_params(mut self, mask_params: MaskParams<F>) -> Self {
        self.mask_params = mask_params;
        self
    }

    /// Handling of masks without any pixel while deriving traces
    pub fn empty_mask(mut self, policy: EmptyMaskPolicy) -> Self {
        self.empty_mask = policy;
        self
    }

    fn order_for(&self, kind: MethodKind) -> ComponentOrder {
        self.order.unwrap_or(match kind {
            MethodKind::StIca => ComponentOrder::Skewness,
            _ => ComponentOrder::Native,
        })
    }
}

/// Result of a decomposition
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition<F> {
    spatial: Option<Array3<F>>,
    temporal: Option<Array2<F>>,
    masks: Option<Array3<usize>>,
    traces: Option<Array2<F>>,
    skewness: Array1<F>,
    n_iter: Option<usize>,
    converged: bool,
}

impl<F: Float> Decomposition<F> {
    /// Spatial components `(n_components, height, width)`, absent for stICA with `mu == 1`
    pub fn spatial(&self) -> Option<&Array3<F>> {
        self.spatial.as_ref()
    }

    /// Temporal signals `(n_components, n_frames)` of stICA
    pub fn temporal(&self) -> Option<&Array2<F>> {
        self.temporal.as_ref()
    }

    pub fn masks(&self) -> Option<&Array3<usize>> {
        self.masks.as_ref()
    }

    /// Mean intensity inside every mask, `(n_components, n_frames)`
    pub fn traces(&self) -> Option<&Array2<F>> {
        self.traces.as_ref()
    }

    /// Skewness of every returned component, in the returned order
    pub fn skewness(&self) -> &Array1<F> {
        &self.skewness
    }

    /// Iterations of the solver, `None` for PCA
    pub fn n_iter(&self) -> Option<usize> {
        self.n_iter
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}

type Parts<F> = (
    Option<Array3<F>>,
    Option<Array2<F>>,
    Option<Array3<usize>>,
    Array1<F>,
    Option<usize>,
    bool,
);

/// Order the components of a single method and compute their skewness
fn single_method<F: Float>(
    result: StackComponents<F>,
    order: ComponentOrder,
) -> Result<Parts<F>, DecompositionError<F>> {
    let StackComponents {
        components,
        n_iter,
        converged,
    } = result;

    let (components, skewness) = match order {
        ComponentOrder::Skewness => {
            let ordered = order_by_skewness(&components, None::<&Array2<F>>)?;
            (ordered.components, ordered.skewness)
        }
        ComponentOrder::Native => {
            let (_, skewness) = skewness_order(&components);
            (components, skewness)
        }
    };

    Ok((Some(components), None, None, skewness, n_iter, converged))
}

/// Decompose a frame stack with the given method
///
/// # Errors
///
/// Beside invalid parameters or inputs, an iterative method that stops at its iteration limit
/// returns [`DecompositionError::NotConverged`] with the complete result computed from its last
/// iterate.
///
/// Masks are produced when the options ask for masks or traces, or when stICA parameters ask
/// for masks. They are always thresholded with the mask parameters of the options.
pub fn decompose<F: Float, S: Data<Elem = F>>(
    method: &Method<F>,
    stack: &ArrayBase<S, Ix3>,
    options: &OutputOptions<F>,
) -> Result<Decomposition<F>, DecompositionError<F>> {
    let kind = method.kind();
    let order = options.order_for(kind);
    let mask_params = options.mask_params.check_ref()?;
    let want_masks = options.masks
        || options.traces
        || match method {
            Method::StIca(params) => params.check_ref()?.as_masks(),
            _ => false,
        };
    log::debug!("{} decomposition with {:?} component order", kind, order);

    let (spatial, temporal, masks, skewness, n_iter, converged) = match method {
        Method::Pca(params) => single_method(params.decompose_stack(stack)?, order)?,
        Method::FastIca(params) => single_method(params.decompose_stack(stack)?, order)?,
        Method::Nmf(params) => single_method(params.decompose_stack(stack)?, order)?,
        Method::StIca(params) => {
            // masks are thresholded below with the mask parameters of the options
            let params = params
                .clone()
                .order_by_skewness(order == ComponentOrder::Skewness)
                .as_masks(false);
            let model: Result<StIca<F>, StIcaError> = params.fit(stack);
            let model = model?;

            let skewness = model.skewness().clone();
            let (n_iter, converged) = (model.n_iter(), model.converged());
            let (spatial, temporal, masks) = model.into_parts();

            (spatial, temporal, masks, skewness, Some(n_iter), converged)
        }
    };

    let masks = match (masks, &spatial) {
        (None, Some(spatial)) if want_masks => Some(mask_params.transform(spatial)),
        (masks, _) => masks,
    };

    let traces = if options.traces {
        let masks = masks.as_ref().ok_or_else(|| {
            DecompositionError::InvalidParameter(
                "traces need spatial components, stICA with mu = 1 has none".to_string(),
            )
        })?;
        Some(derive_traces_with(stack, masks, options.empty_mask)?)
    } else {
        None
    };

    let decomposition = Decomposition {
        spatial,
        temporal,
        masks,
        traces,
        skewness,
        n_iter,
        converged,
    };

    if !converged {
        return Err(DecompositionError::NotConverged {
            iterations: n_iter.unwrap_or(0),
            partial: Box::new(decomposition),
        });
    }

    Ok(decomposition)
}
