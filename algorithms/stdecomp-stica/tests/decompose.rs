use ndarray::{Array, Array1, Array2, Array3, ArrayView1, Axis};
use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
use rand_xoshiro::Xoshiro256Plus;

use stdecomp::{masks::MaskParams, ordering::order_by_skewness, traces::EmptyMaskPolicy};
use stdecomp_ica::FastIcaParams;
use stdecomp_nmf::NmfParams;
use stdecomp_pca::PcaParams;
use stdecomp_stica::{
    decompose, ComponentOrder, Decomposition, DecompositionError, Method, MethodKind,
    OutputOptions, StIcaParams,
};

fn random_stack() -> Array3<f64> {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    Array::random_using((10, 20, 20), Uniform::new(0., 1.), &mut rng)
}

/// Run a decomposition, accepting the best effort result of a run that hit its iteration limit
fn run(
    method: &Method<f64>,
    stack: &Array3<f64>,
    options: &OutputOptions<f64>,
) -> Decomposition<f64> {
    best_effort(decompose(method, stack, options))
}

fn best_effort(
    res: Result<Decomposition<f64>, DecompositionError<f64>>,
) -> Decomposition<f64> {
    match res {
        Ok(result) => result,
        Err(err @ DecompositionError::NotConverged { .. }) => err.into_partial().unwrap(),
        Err(err) => panic!("decomposition failed: {}", err),
    }
}

fn correlation(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let a = &a - a.mean().unwrap();
    let b = &b - b.mean().unwrap();
    a.dot(&b) / (a.dot(&a).sqrt() * b.dot(&b).sqrt())
}

fn flatten(images: &Array3<f64>, i: usize) -> Array1<f64> {
    images.index_axis(Axis(0), i).iter().copied().collect()
}

#[test]
fn mu_selects_spatial_or_temporal_output() {
    let stack = random_stack();
    let options = OutputOptions::new();

    let spatial_only = Method::StIca(StIcaParams::new(3).mu(0.).random_state(0));
    let result = run(&spatial_only, &stack, &options);
    assert_eq!(result.spatial().unwrap().dim(), (3, 20, 20));
    assert!(result.temporal().is_none());

    let temporal_only = Method::StIca(StIcaParams::new(3).mu(1.).random_state(0));
    let result = run(&temporal_only, &stack, &options);
    assert!(result.spatial().is_none());
    assert_eq!(result.temporal().unwrap().dim(), (3, 10));

    let both = Method::StIca(StIcaParams::new(3).mu(0.5).random_state(0));
    let result = run(&both, &stack, &options);
    assert_eq!(result.spatial().unwrap().dim(), (3, 20, 20));
    assert_eq!(result.temporal().unwrap().dim(), (3, 10));
}

#[test]
fn component_count_is_validated_for_every_method() {
    let stack = random_stack();
    let options = OutputOptions::new();

    for n_components in [0, 11] {
        let methods = [
            Method::Pca(PcaParams::new(n_components)),
            Method::FastIca(FastIcaParams::new().ncomponents(n_components)),
            Method::Nmf(NmfParams::new(n_components)),
            Method::StIca(StIcaParams::new(n_components)),
        ];
        for method in methods.iter() {
            let res = decompose(method, &stack, &options);
            assert!(
                matches!(res, Err(DecompositionError::InvalidParameter(_))),
                "{} with {} components: {:?}",
                method.kind(),
                n_components,
                res.map(|_| ())
            );
        }
    }
}

#[test]
fn invalid_mu_is_rejected() {
    let method = Method::StIca(StIcaParams::new(3).mu(-0.5));
    let res = decompose(&method, &random_stack(), &OutputOptions::new());

    assert!(matches!(res, Err(DecompositionError::InvalidParameter(_))));
}

#[test]
fn nmf_rejects_negative_values() {
    let mut stack = random_stack();
    stack[[3, 4, 5]] = -1.;

    let method = Method::Nmf(NmfParams::new(3));
    let res = decompose(&method, &stack, &OutputOptions::new());

    assert!(matches!(res, Err(DecompositionError::InvalidInput(_))));
}

#[test]
fn wrong_stack_shape_is_rejected() {
    let stack = Array3::<f64>::zeros((0, 4, 4));
    let method = Method::default_for(MethodKind::Pca);

    assert!(decompose(&method, &stack, &OutputOptions::new()).is_err());
}

#[test]
fn seeded_decompositions_are_reproducible() {
    let stack = random_stack();
    let options = OutputOptions::new().masks(true);

    let methods = [
        Method::Pca(PcaParams::new(3).random_state(4)),
        Method::FastIca(FastIcaParams::new().ncomponents(3).random_state(4)),
        Method::Nmf(NmfParams::new(3).random_state(4)),
        Method::StIca(StIcaParams::new(3).random_state(4)),
    ];
    for method in methods.iter() {
        assert_eq!(
            run(method, &stack, &options),
            run(method, &stack, &options),
            "{} is not reproducible",
            method.kind()
        );
    }
}

#[test]
fn masks_and_traces_have_matching_shapes() {
    let stack = random_stack();
    let options = OutputOptions::new()
        .traces(true)
        .empty_mask(EmptyMaskPolicy::ZeroFill);

    for kind in [MethodKind::Pca, MethodKind::FastIca, MethodKind::Nmf, MethodKind::StIca] {
        let method = match Method::default_for(kind) {
            Method::Pca(params) => Method::Pca(params.random_state(1)),
            Method::FastIca(params) => Method::FastIca(params.random_state(1)),
            Method::Nmf(params) => Method::Nmf(params.random_state(1)),
            Method::StIca(params) => Method::StIca(params.random_state(1)),
        };
        let result = run(&method, &stack, &options);

        let masks = result.masks().unwrap();
        assert_eq!(masks.dim(), (6, 20, 20));
        for (i, mask) in masks.outer_iter().enumerate() {
            assert!(mask.iter().all(|&v| v == 0 || v == i + 1));
        }
        assert_eq!(result.traces().unwrap().dim(), (6, 10));
        assert_eq!(result.skewness().len(), 6);
    }
}

#[test]
fn skewness_order_is_opt_in() {
    let stack = random_stack();
    let method = Method::Pca(PcaParams::new(4).random_state(2));

    let native = run(&method, &stack, &OutputOptions::new());
    let ordered = run(
        &method,
        &stack,
        &OutputOptions::new().order(ComponentOrder::Skewness),
    );

    let abs_skew = ordered.skewness().mapv(f64::abs);
    for pair in abs_skew.windows(2) {
        assert!(pair[0] >= pair[1]);
    }

    // both contain the same components
    let native_spatial = native.spatial().unwrap();
    let ordered_spatial = ordered.spatial().unwrap();
    for i in 0..4 {
        let component = ordered_spatial.index_axis(Axis(0), i);
        assert!(native_spatial.outer_iter().any(|other| other == component));
    }

    // ordering an ordered result changes nothing
    let again = order_by_skewness(ordered_spatial, None::<&Array2<f64>>).unwrap();
    assert_eq!(&again.components, ordered_spatial);
}

#[test]
fn traces_require_spatial_components() {
    let method = Method::StIca(StIcaParams::new(3).mu(1.).random_state(0));
    let res = decompose(&method, &random_stack(), &OutputOptions::new().traces(true));

    match res {
        Err(DecompositionError::InvalidParameter(_)) => {}
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }
}

#[test]
fn iteration_limit_returns_the_last_iterate() {
    let stack = random_stack();
    let options = OutputOptions::new().masks(true);

    let stica = Method::StIca(StIcaParams::new(3).max_iter(1).tol(0.).random_state(2));
    match decompose(&stica, &stack, &options) {
        Err(err @ DecompositionError::NotConverged { iterations: 1, .. }) => {
            let partial = err.into_partial().unwrap();
            assert!(!partial.converged());
            assert_eq!(partial.n_iter(), Some(1));
            assert_eq!(partial.spatial().unwrap().dim(), (3, 20, 20));
            assert_eq!(partial.temporal().unwrap().dim(), (3, 10));
            assert_eq!(partial.masks().unwrap().dim(), (3, 20, 20));
            assert_eq!(partial.skewness().len(), 3);
        }
        other => panic!("expected a non converged stICA result, got {:?}", other.map(|_| ())),
    }

    let nmf = Method::Nmf(NmfParams::new(3).max_iter(1).random_state(2));
    match decompose(&nmf, &stack, &OutputOptions::new()) {
        Err(err @ DecompositionError::NotConverged { iterations: 1, .. }) => {
            assert_eq!(err.partial().unwrap().n_iter(), Some(1));
            let partial = err.into_partial().unwrap();
            let spatial = partial.spatial().unwrap();
            assert_eq!(spatial.dim(), (3, 20, 20));
            assert!(spatial.iter().all(|&v| v >= 0.));
            assert!(partial.temporal().is_none());
        }
        other => panic!("expected a non converged NMF result, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn output_options_decide_the_masks() {
    let stack = random_stack();
    // a wider blur than the default
    let options = OutputOptions::new().mask_params(MaskParams::new().sigma(4.));

    let with_params_masks = Method::StIca(StIcaParams::new(3).as_masks(true).random_state(6));
    let plain = Method::StIca(StIcaParams::new(3).random_state(6));

    let requested_by_params = run(&with_params_masks, &stack, &options);
    let requested_by_options = run(&plain, &stack, &options.clone().masks(true));

    assert_eq!(requested_by_params.masks(), requested_by_options.masks());
    let default_masks = run(&plain, &stack, &OutputOptions::new().masks(true));
    assert_ne!(requested_by_params.masks(), default_masks.masks());
}

#[test]
fn empty_masks_abort_by_default() {
    // a constant stack has constant components and empty masks
    let stack = Array3::<f64>::from_elem((10, 8, 8), 2.);
    let method = Method::Nmf(NmfParams::new(2).random_state(0));

    let res = decompose(
        &method,
        &stack,
        &OutputOptions::new().traces(true).mask_params(MaskParams::new()),
    );
    assert!(matches!(res, Err(DecompositionError::EmptyMask(0))));

    let res = decompose(
        &method,
        &stack,
        &OutputOptions::new()
            .traces(true)
            .empty_mask(EmptyMaskPolicy::ZeroFill),
    );
    let result = best_effort(res);
    assert!(result.traces().unwrap().iter().all(|&v| v == 0.));
}

#[test]
fn stica_recovers_synthetic_footprints() {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let movie = stdecomp_datasets::movie(200, 24, 24, 3, 0.02, &mut rng);

    let method = Method::StIca(StIcaParams::new(3).max_iter(1000).random_state(42));
    let result = run(&method, &movie.frames, &OutputOptions::new().masks(true));
    let spatial = result.spatial().unwrap();

    for source in 0..3 {
        let footprint = flatten(&movie.footprints, source);
        let best = (0..3)
            .map(|i| correlation(flatten(spatial, i).view(), footprint.view()))
            .fold(f64::MIN, f64::max);
        assert!(best > 0.7, "footprint {} recovered with correlation {}", source, best);
    }
}
