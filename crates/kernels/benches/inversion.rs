use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use egobox_kernels::{InversionMethod, Inverter};
use ndarray::Array2;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

fn spd_matrix(n: usize) -> Array2<f64> {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let a = Array2::random_using((n, n), Uniform::new(-1., 1.), &mut rng);
    a.dot(&a.t()) + Array2::<f64>::eye(n) * n as f64
}

fn bench_inversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("inversion");

    let n = 100;
    let a = spd_matrix(n);
    for method in InversionMethod::ALL {
        let inverter = Inverter::new(method);
        group.bench_function(BenchmarkId::new(method.name(), n), |b| {
            b.iter(|| inverter.invert(&a).expect("inversion"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_inversion);
criterion_main!(benches);
