use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vif::{compute_vif, filter, filter_xy, kernel, Convolver, KernelScale, Plane, VifConfig};

const WIDTH: usize = 1920;
const HEIGHT: usize = 1080;

fn random_plane(width: usize, height: usize, seed: u64) -> Plane {
    let mut rng = StdRng::seed_from_u64(seed);
    Plane::from_fn(width, height, |_, _| rng.gen_range(-128.0f32..128.0))
}

fn bench_filter(c: &mut Criterion) {
    let src = random_plane(WIDTH, HEIGHT, 1);
    let mut dst = Plane::new(WIDTH, HEIGHT);
    let mut convolver = Convolver::new(WIDTH);

    let mut group = c.benchmark_group("filter_1080p");
    for level in 0..4 {
        let k = kernel(KernelScale::Unit, level);
        group.bench_with_input(BenchmarkId::new("scalar", k.width), &k, |b, k| {
            b.iter(|| filter(k.coeffs, black_box(src.view()), &mut dst.view_mut()));
        });
        group.bench_with_input(BenchmarkId::new("dispatch", k.width), &k, |b, k| {
            b.iter(|| convolver.filter(k.coeffs, black_box(src.view()), &mut dst.view_mut()));
        });
    }
    group.finish();
}

fn bench_filter_xy(c: &mut Criterion) {
    let a = random_plane(WIDTH, HEIGHT, 2);
    let b = random_plane(WIDTH, HEIGHT, 3);
    let mut dst = Plane::new(WIDTH, HEIGHT);
    let mut convolver = Convolver::new(WIDTH);
    let k = kernel(KernelScale::Unit, 0);

    c.bench_function("filter_xy_17_scalar_1080p", |bench| {
        bench.iter(|| filter_xy(k.coeffs, black_box(a.view()), b.view(), &mut dst.view_mut()));
    });
    c.bench_function("filter_xy_17_dispatch_1080p", |bench| {
        bench.iter(|| {
            convolver.filter_xy(k.coeffs, black_box(a.view()), b.view(), &mut dst.view_mut())
        });
    });
}

fn bench_compute_vif(c: &mut Criterion) {
    let reference = random_plane(WIDTH, HEIGHT, 4);
    let distorted = Plane::from_fn(WIDTH, HEIGHT, |row, col| reference.get(row, col) * 0.9 + 2.0);

    let mut group = c.benchmark_group("compute_vif_1080p");
    group.sample_size(10);
    for (name, config) in [("scalar", VifConfig::scalar()), ("simd", VifConfig::simd())] {
        group.bench_function(name, |b| {
            b.iter(|| compute_vif(black_box(reference.view()), distorted.view(), &config));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_filter, bench_filter_xy, bench_compute_vif);
criterion_main!(benches);
