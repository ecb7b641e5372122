//! Utility functions for randomly generating frame stacks

use ndarray::{Array1, Array2, Array3, Axis};
use ndarray_rand::{
    rand::Rng,
    rand_distr::{Bernoulli, Uniform},
    RandomExt,
};

/// Offset added to every pixel of a generated movie
pub const BASELINE: f64 = 1.0;

/// A generated movie together with the sources it is composed of
#[derive(Debug, Clone)]
pub struct SyntheticMovie {
    /// Frame stack of shape `(n_frames, height, width)`
    pub frames: Array3<f64>,
    /// Spatial footprint of every source, shape `(n_sources, height, width)`, peak value one
    pub footprints: Array3<f64>,
    /// Activity of every source, shape `(n_sources, n_frames)`
    pub traces: Array2<f64>,
}

/// Isotropic Gaussian blob with peak one at `center` (row, column)
pub fn footprint(height: usize, width: usize, center: (f64, f64), sigma: f64) -> Array2<f64> {
    let denom = 2.0 * sigma * sigma;
    Array2::from_shape_fn((height, width), |(i, j)| {
        let (di, dj) = (i as f64 - center.0, j as f64 - center.1);
        (-(di * di + dj * dj) / denom).exp()
    })
}

/// Spike trains convolved with an exponential decay of time constant `tau` (in frames)
///
/// Every frame spikes with probability `rate` and an amplitude drawn from `[0.5, 1.5)`. A source
/// that did not spike at all gets one spike at a random frame, so no trace is flat.
///
/// # Panics
///
/// If `rate` is not a probability.
pub fn spike_trains(
    n_sources: usize,
    n_frames: usize,
    rate: f64,
    tau: f64,
    rng: &mut impl Rng,
) -> Array2<f64> {
    let bernoulli = Bernoulli::new(rate).expect("rate must lie in [0, 1]");
    let spikes = Array2::random_using((n_sources, n_frames), bernoulli, rng);
    let amplitudes = Array2::random_using((n_sources, n_frames), Uniform::new(0.5, 1.5), rng);
    let decay = (-1.0 / tau).exp();

    let mut traces = Array2::zeros((n_sources, n_frames));
    for ((mut trace, spikes), amplitudes) in traces
        .outer_iter_mut()
        .zip(spikes.outer_iter())
        .zip(amplitudes.outer_iter())
    {
        let mut drive: Array1<f64> = spikes
            .iter()
            .zip(amplitudes.iter())
            .map(|(&spike, &amplitude)| if spike { amplitude } else { 0.0 })
            .collect();
        if n_frames > 0 && drive.iter().all(|&v| v == 0.0) {
            drive[rng.gen_range(0..n_frames)] = 1.0;
        }

        let mut level = 0.0;
        for (value, input) in trace.iter_mut().zip(drive.iter()) {
            level = level * decay + input;
            *value = level;
        }
    }

    traces
}

/// Generate a movie of `n_sources` non-overlapping sources
///
/// The image is divided into a grid with one cell per source and every source is centered in its
/// cell with a small random jitter. Uniform noise from `[0, noise)` is added on top of the
/// baseline, so every pixel is positive.
pub fn movie(
    n_frames: usize,
    height: usize,
    width: usize,
    n_sources: usize,
    noise: f64,
    rng: &mut impl Rng,
) -> SyntheticMovie {
    let columns = (n_sources as f64).sqrt().ceil().max(1.0) as usize;
    let rows = (n_sources + columns - 1) / columns;
    let cell = (
        height as f64 / rows.max(1) as f64,
        width as f64 / columns as f64,
    );
    let sigma = cell.0.min(cell.1) / 6.0;

    let mut footprints = Array3::zeros((n_sources, height, width));
    for (idx, mut fp) in footprints.outer_iter_mut().enumerate() {
        let jitter = (
            rng.gen_range(-0.1..0.1) * cell.0,
            rng.gen_range(-0.1..0.1) * cell.1,
        );
        let center = (
            ((idx / columns) as f64 + 0.5) * cell.0 + jitter.0,
            ((idx % columns) as f64 + 0.5) * cell.1 + jitter.1,
        );
        fp.assign(&footprint(height, width, center, sigma));
    }

    let traces = spike_trains(n_sources, n_frames, 0.05, 4.0, rng);

    let mut frames = Array3::random_using((n_frames, height, width), Uniform::new(0.0, 1.0), rng)
        .mapv(|v| BASELINE + noise * v);
    for (fp, trace) in footprints.outer_iter().zip(traces.outer_iter()) {
        for (mut frame, &activity) in frames.axis_iter_mut(Axis(0)).zip(trace.iter()) {
            frame.scaled_add(activity, &fp);
        }
    }

    SyntheticMovie {
        frames,
        footprints,
        traces,
    }
}
