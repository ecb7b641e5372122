use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array3;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use stdecomp::traits::Fit;
use stdecomp_stica::{decompose, Method, MethodKind, OutputOptions, StIca};

fn create_movie(frames: usize, size: usize) -> Array3<f64> {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    stdecomp_datasets::movie(frames, size, size, 6, 0.05, &mut rng).frames
}

fn stica_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("stICA");
    group.sample_size(10);

    for size in [32, 64, 128].iter() {
        let movie = create_movie(200, *size);
        for mu in [0.0, 0.5, 1.0].iter() {
            let name = format!("mu_{}", mu);
            group.bench_with_input(BenchmarkId::new(name, size), &movie, |b, movie| {
                b.iter(|| {
                    StIca::params(6)
                        .mu(*mu)
                        .random_state(42)
                        .fit(movie)
                        .unwrap()
                });
            });
        }
    }
    group.finish();
}

fn methods_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompose");
    group.sample_size(10);

    let movie = create_movie(200, 64);
    let options = OutputOptions::new().traces(true);
    for kind in [MethodKind::Pca, MethodKind::FastIca, MethodKind::Nmf, MethodKind::StIca].iter() {
        let method = Method::default_for(*kind);
        group.bench_function(kind.to_string(), |b| {
            b.iter(|| decompose(&method, &movie, &options))
        });
    }
    group.finish();
}

criterion_group!(benches, stica_bench, methods_bench);
criterion_main!(benches);
