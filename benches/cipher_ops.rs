use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use he_aggregate::{Approximate, Engine, Exact, Scheme};

fn keyed<S: Scheme>(ring_dim: usize) -> Engine<S> {
    let mut engine = Engine::<S>::with_params(S::default_params().with_ring_dim(ring_dim)).unwrap();
    engine.generate_keys().unwrap();
    engine
}

fn scheme_benchmark<S: Scheme>(c: &mut Criterion, value: f64) {
    let mut group = c.benchmark_group(format!("cipher_ops/{}", S::KIND));

    for ring_dim in [1024, 4096, 8192] {
        let engine = keyed::<S>(ring_dim);
        let a = engine.encrypt(value).unwrap();
        let b = engine.encrypt(value).unwrap();
        let batch: Vec<_> = (0..16).map(|_| engine.encrypt(value).unwrap()).collect();

        group.bench_with_input(BenchmarkId::new("encrypt", ring_dim), &ring_dim, |bench, _| {
            bench.iter(|| engine.encrypt(value).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("decrypt", ring_dim), &ring_dim, |bench, _| {
            bench.iter(|| engine.decrypt(&a).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("add", ring_dim), &ring_dim, |bench, _| {
            bench.iter(|| engine.add(&a, &b).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("sum_16", ring_dim), &ring_dim, |bench, _| {
            bench.iter(|| engine.sum(&batch).unwrap());
        });
    }

    group.finish();
}

fn keygen_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("keygen");
    group.sample_size(10);

    for ring_dim in [1024, 8192] {
        group.bench_with_input(BenchmarkId::new("exact", ring_dim), &ring_dim, |b, &n| {
            b.iter(|| keyed::<Exact>(n));
        });
        group.bench_with_input(BenchmarkId::new("approximate", ring_dim), &ring_dim, |b, &n| {
            b.iter(|| keyed::<Approximate>(n));
        });
    }

    group.finish();
}

fn exact_benchmark(c: &mut Criterion) {
    scheme_benchmark::<Exact>(c, 42.0);
}

fn approximate_benchmark(c: &mut Criterion) {
    scheme_benchmark::<Approximate>(c, 3.14159);
}

fn multiply_benchmark(c: &mut Criterion) {
    let engine = keyed::<Approximate>(8192);
    let ct = engine.encrypt(12.5).unwrap();
    c.bench_function("multiply_by_scalar/8192", |b| {
        b.iter(|| engine.multiply_by_scalar(&ct, 1.5).unwrap());
    });
}

criterion_group!(
    benches,
    keygen_benchmark,
    exact_benchmark,
    approximate_benchmark,
    multiply_benchmark
);
criterion_main!(benches);
