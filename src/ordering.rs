//! Ranking of components by the absolute skewness of their values
//!
//! Sparse, localized components (a cell body on a dark background, a spiking trace) have a
//! strongly skewed value distribution while noise components are roughly symmetric. Sorting by
//! descending absolute skewness moves the interesting components to the front.
use ndarray::{Array, Array1, Array2, ArrayBase, Axis, Data, Dimension, RemoveAxis};
use ndarray_stats::SummaryStatisticsExt;

use crate::error::{Error, Result};
use crate::Float;

/// Components reordered by descending absolute skewness
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered<F, D: Dimension> {
    pub components: Array<F, D>,
    pub traces: Option<Array2<F>>,
    /// Skewness of every component, in the new order
    pub skewness: Array1<F>,
}

/// Biased sample skewness (third standardized central moment)
///
/// Constant or empty inputs have no defined skewness and return zero.
pub fn skewness<F: Float, S: Data<Elem = F>, D: Dimension>(values: &ArrayBase<S, D>) -> F {
    match SummaryStatisticsExt::skewness(values) {
        Ok(skew) if skew.is_finite() => skew,
        _ => F::zero(),
    }
}

/// Permutation which sorts the components along the first axis by descending absolute skewness
///
/// Returns the permutation together with the skewness of every component in its original
/// position. Components with equal absolute skewness keep their relative order.
pub fn skewness_order<F: Float, S: Data<Elem = F>, D: RemoveAxis>(
    components: &ArrayBase<S, D>,
) -> (Vec<usize>, Array1<F>) {
    let skew = components
        .outer_iter()
        .map(|component| skewness(&component))
        .collect::<Array1<F>>();

    let mut order = (0..skew.len()).collect::<Vec<_>>();
    // `sort_by` is stable, NaN never occurs as `skewness` maps it to zero
    order.sort_by(|&a, &b| {
        skew[b]
            .abs()
            .partial_cmp(&skew[a].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    (order, skew)
}

/// Reorder components, and optionally their paired traces, by descending absolute skewness
///
/// The traces must contain one row per component. Applying the ordering twice does not change
/// the result of the first application.
pub fn order_by_skewness<F: Float, S: Data<Elem = F>, D: RemoveAxis, T: Data<Elem = F>>(
    components: &ArrayBase<S, D>,
    traces: Option<&ArrayBase<T, ndarray::Ix2>>,
) -> Result<Ordered<F, D>> {
    let ncomponents = components.len_of(Axis(0));
    if let Some(traces) = traces {
        if traces.nrows() != ncomponents {
            return Err(Error::ShapeMismatch(format!(
                "{} traces cannot be paired with {} components",
                traces.nrows(),
                ncomponents
            )));
        }
    }

    let (order, skew) = skewness_order(components);

    Ok(Ordered {
        components: components.select(Axis(0), &order),
        traces: traces.map(|t| t.select(Axis(0), &order)),
        skewness: skew.select(Axis(0), &order),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array3};

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<Ordered<f64, ndarray::Ix3>>();
    }

    #[test]
    fn skewness_matches_third_moment() {
        // mean 1, deviations (-1, -1, -1, 3): m2 = 3, m3 = 6
        let values = array![0., 0., 0., 4.];
        let expected = 6. / 3f64.powf(1.5);
        assert_abs_diff_eq!(skewness(&values), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(skewness(&values.mapv(|x| -x)), -expected, epsilon = 1e-12);
    }

    #[test]
    fn skewness_of_degenerate_inputs() {
        assert_eq!(skewness(&array![2.0f64, 2.0, 2.0]), 0.0);
        assert_eq!(skewness(&Array1::<f64>::zeros(0)), 0.0);
    }

    #[test]
    fn orders_by_absolute_skewness() {
        let components = array![
            [0., 1., 0., 1.],  // symmetric
            [0., 0., 0., -4.], // strongly left skewed
            [0., 0., 1., 3.],  // right skewed
        ];
        let traces = array![[1., 1.], [2., 2.], [3., 3.]];

        let ordered = order_by_skewness(&components, Some(&traces)).unwrap();

        assert_eq!(ordered.components.row(0), components.row(1));
        assert_eq!(ordered.components.row(1), components.row(2));
        assert_eq!(ordered.components.row(2), components.row(0));
        assert_eq!(ordered.traces.unwrap().column(0), array![2., 3., 1.]);
        assert!(ordered.skewness[0] < 0.0);
        assert_abs_diff_eq!(ordered.skewness[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn ordering_is_stable_and_idempotent() {
        let components = Array3::from_shape_fn((4, 3, 3), |(i, r, c)| match i {
            0 | 2 => (r * 3 + c) as f64,
            _ => {
                if r == 1 && c == 1 {
                    5.0
                } else {
                    0.0
                }
            }
        });

        let (order, _) = skewness_order(&components);
        assert_eq!(order, vec![1, 3, 0, 2]);

        let first = order_by_skewness(&components, None::<&Array2<f64>>).unwrap();
        let second = order_by_skewness(&first.components, None::<&Array2<f64>>).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn trace_count_must_match() {
        let components = Array2::<f64>::zeros((3, 5));
        let traces = Array2::<f64>::zeros((2, 7));

        assert!(matches!(
            order_by_skewness(&components, Some(&traces)),
            Err(Error::ShapeMismatch(_))
        ));
    }
}
