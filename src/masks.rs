//! Conversion of continuous spatial filters into labelled binary masks
//!
//! Every filter is smoothed with a Gaussian kernel and thresholded with Otsu's method. The pixels
//! above the threshold form the mask of the component, labelled with the component's position
//! plus one so that zero always means background.
use ndarray::{Array1, Array2, Array3, ArrayBase, ArrayView2, Axis, Data, Ix2, Ix3, Zip};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::param_guard::ParamGuard;
use crate::traits::Transformer;
use crate::Float;

/// Which side of the Otsu threshold becomes the mask
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Foreground {
    /// Pixels strictly brighter than the threshold
    #[default]
    Bright,
    /// The smaller of the two sides, preferring the bright side on a tie
    Minority,
}

/// Checked parameters of the mask extraction
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaskValidParams<F> {
    sigma: F,
    truncate: F,
    nbins: usize,
    foreground: Foreground,
}

impl<F: Float> MaskValidParams<F> {
    pub fn sigma(&self) -> F {
        self.sigma
    }

    pub fn truncate(&self) -> F {
        self.truncate
    }

    pub fn nbins(&self) -> usize {
        self.nbins
    }

    pub fn foreground(&self) -> Foreground {
        self.foreground
    }

    /// Threshold a single filter and return its boolean mask
    pub fn mask<S: Data<Elem = F>>(&self, filter: &ArrayBase<S, Ix2>) -> Array2<bool> {
        let blurred = gaussian_filter(filter, self.sigma, self.truncate);
        let threshold = otsu_threshold(blurred.iter().copied(), self.nbins);
        let mut mask = blurred.mapv(|x| x > threshold);

        if self.foreground == Foreground::Minority {
            let inside = mask.iter().filter(|x| **x).count();
            if inside > mask.len() - inside {
                mask.mapv_inplace(|x| !x);
            }
        }

        mask
    }
}

/// Mask extraction parameters
///
/// Defaults follow the usual image processing conventions: a Gaussian blur with standard
/// deviation 1 truncated at 4 standard deviations, followed by Otsu's threshold over 256 bins.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaskParams<F>(MaskValidParams<F>);

impl<F: Float> Default for MaskParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> MaskParams<F> {
    pub fn new() -> Self {
        Self(MaskValidParams {
            sigma: F::one(),
            truncate: F::cast(4.0),
            nbins: 256,
            foreground: Foreground::Bright,
        })
    }

    /// Standard deviation of the smoothing kernel in pixels
    pub fn sigma(mut self, sigma: F) -> Self {
        self.0.sigma = sigma;
        self
    }

    /// Kernel radius in multiples of `sigma`
    pub fn truncate(mut self, truncate: F) -> Self {
        self.0.truncate = truncate;
        self
    }

    /// Number of histogram bins of the Otsu threshold
    pub fn nbins(mut self, nbins: usize) -> Self {
        self.0.nbins = nbins;
        self
    }

    pub fn foreground(mut self, foreground: Foreground) -> Self {
        self.0.foreground = foreground;
        self
    }
}

impl<F: Float> ParamGuard for MaskParams<F> {
    type Checked = MaskValidParams<F>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if !(self.0.sigma > F::zero()) {
            Err(Error::Parameters(format!(
                "sigma must be positive, got {}",
                self.0.sigma
            )))
        } else if !(self.0.truncate > F::zero()) {
            Err(Error::Parameters(format!(
                "truncate must be positive, got {}",
                self.0.truncate
            )))
        } else if self.0.nbins < 2 {
            Err(Error::Parameters(format!(
                "Otsu's method needs at least two bins, got {}",
                self.0.nbins
            )))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<'a, F: Float, S: Data<Elem = F>> Transformer<&'a ArrayBase<S, Ix3>, Array3<usize>>
    for MaskValidParams<F>
{
    /// Turn every filter of `(n_components, height, width)` into a mask with the same shape,
    /// filled with `i + 1` inside mask `i` and zero elsewhere
    fn transform(&self, filters: &'a ArrayBase<S, Ix3>) -> Array3<usize> {
        let mut masks = Array3::zeros(filters.raw_dim());

        for (i, (filter, mut labels)) in filters
            .outer_iter()
            .zip(masks.outer_iter_mut())
            .enumerate()
        {
            let mask = self.mask(&filter);
            Zip::from(&mut labels).and(&mask).for_each(|l, &m| {
                if m {
                    *l = i + 1;
                }
            });
        }

        masks
    }
}

/// Extract masks with the default parameters
pub fn extract_masks<F: Float, S: Data<Elem = F>>(filters: &ArrayBase<S, Ix3>) -> Array3<usize> {
    MaskParams::<F>::new().0.transform(filters)
}

/// Normalized one dimensional Gaussian kernel with radius `round(truncate * sigma)`
fn gaussian_kernel<F: Float>(sigma: F, truncate: F) -> Array1<F> {
    let radius = (truncate * sigma + F::cast(0.5)).floor().to_usize().unwrap_or(0);
    let two_var = F::cast(2.0) * sigma * sigma;

    let kernel = Array1::from_shape_fn(2 * radius + 1, |i| {
        let x = F::cast(i as isize - radius as isize);
        (-x * x / two_var).exp()
    });
    let total = kernel.sum();

    kernel / total
}

fn convolve_lanes<F: Float>(image: ArrayView2<F>, kernel: &Array1<F>, axis: Axis) -> Array2<F> {
    let radius = kernel.len() / 2;
    let mut output = Array2::zeros(image.raw_dim());

    for (lane, mut out) in image.lanes(axis).into_iter().zip(output.lanes_mut(axis)) {
        let len = lane.len() as isize;
        for (j, o) in out.iter_mut().enumerate() {
            let mut sum = F::zero();
            for (k, &w) in kernel.iter().enumerate() {
                // nearest edge value outside of the image
                let src = (j as isize + k as isize - radius as isize).clamp(0, len - 1);
                sum += lane[src as usize] * w;
            }
            *o = sum;
        }
    }

    output
}

/// Separable Gaussian blur of an image
///
/// Values beyond the border repeat the nearest edge pixel. The kernel is truncated at
/// `truncate` standard deviations.
pub fn gaussian_filter<F: Float, S: Data<Elem = F>>(
    image: &ArrayBase<S, Ix2>,
    sigma: F,
    truncate: F,
) -> Array2<F> {
    if image.is_empty() {
        return image.to_owned();
    }

    let kernel = gaussian_kernel(sigma, truncate);
    let rows = convolve_lanes(image.view(), &kernel, Axis(0));

    convolve_lanes(rows.view(), &kernel, Axis(1))
}

/// Otsu's threshold of a set of values
///
/// The histogram has `nbins` equally wide bins between the minimum and maximum value. The
/// returned threshold is the centre of the bin which maximizes the variance between the two
/// classes, the first one on ties. A constant input returns its value and an empty one zero.
pub fn otsu_threshold<F: Float, I: IntoIterator<Item = F>>(values: I, nbins: usize) -> F {
    let values: Vec<F> = values.into_iter().collect();
    if values.is_empty() || nbins == 0 {
        return F::zero();
    }

    let (min, max) = values
        .iter()
        .fold((values[0], values[0]), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if max <= min {
        return min;
    }

    let width = (max - min) / F::cast(nbins);
    let mut histogram = vec![0usize; nbins];
    for &v in &values {
        let bin = ((v - min) / width).floor().to_usize().unwrap_or(0);
        histogram[bin.min(nbins - 1)] += 1;
    }
    let centers: Vec<F> = (0..nbins)
        .map(|i| min + width * (F::cast(i) + F::cast(0.5)))
        .collect();

    let total = F::cast(values.len());
    let sum_total = histogram
        .iter()
        .zip(&centers)
        .map(|(&count, &c)| F::cast(count) * c)
        .sum::<F>();

    let mut weight_low = F::zero();
    let mut sum_low = F::zero();
    let mut best = (F::neg_infinity(), 0);

    // the split after the last bin leaves the upper class empty
    for (t, (&count, &c)) in histogram.iter().zip(&centers).take(nbins - 1).enumerate() {
        weight_low += F::cast(count);
        sum_low += F::cast(count) * c;

        let weight_high = total - weight_low;
        if weight_low == F::zero() || weight_high == F::zero() {
            continue;
        }

        let mean_low = sum_low / weight_low;
        let mean_high = (sum_total - sum_low) / weight_high;
        let variance = weight_low * weight_high * (mean_low - mean_high).powi(2);

        if variance > best.0 {
            best = (variance, t);
        }
    }

    centers[best.1]
}
