use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ntt64::{Dispatch, Layer, N, Poly};
use sampling::Source;

fn backends() -> Vec<Dispatch> {
    [Some(Dispatch::scalar()), Dispatch::avx2(), Dispatch::neon()]
        .into_iter()
        .flatten()
        .collect()
}

fn random_poly(source: &mut Source, layer: Layer) -> Poly {
    let mut a: Poly = [0u32; N];
    source.fill_uniform(&mut a, layer.modulus());
    a
}

fn forward(c: &mut Criterion) {
    let mut source: Source = Source::new([0u8; 32]);
    let mut group: criterion::BenchmarkGroup<'_, criterion::measurement::WallTime> = c.benchmark_group("forward");

    for ntt in backends() {
        for layer in Layer::ALL {
            let a: Poly = random_poly(&mut source, layer);
            let id: BenchmarkId = BenchmarkId::new(ntt.name(), format!("q={}", layer.modulus()));
            group.bench_with_input(id, &a, |b: &mut criterion::Bencher<'_>, a: &Poly| {
                let mut buf: Poly = *a;
                b.iter(|| ntt.forward(black_box(&mut buf), layer))
            });
        }
    }
}

fn inverse(c: &mut Criterion) {
    let mut source: Source = Source::new([1u8; 32]);
    let mut group: criterion::BenchmarkGroup<'_, criterion::measurement::WallTime> = c.benchmark_group("inverse");

    for ntt in backends() {
        for layer in Layer::ALL {
            let a: Poly = random_poly(&mut source, layer);
            let id: BenchmarkId = BenchmarkId::new(ntt.name(), format!("q={}", layer.modulus()));
            group.bench_with_input(id, &a, |b: &mut criterion::Bencher<'_>, a: &Poly| {
                let mut buf: Poly = *a;
                b.iter(|| ntt.inverse(black_box(&mut buf), layer))
            });
        }
    }
}

fn pointwise_mul(c: &mut Criterion) {
    let mut source: Source = Source::new([2u8; 32]);
    let mut group: criterion::BenchmarkGroup<'_, criterion::measurement::WallTime> =
        c.benchmark_group("pointwise_mul");

    for ntt in backends() {
        for layer in Layer::ALL {
            let a: Poly = random_poly(&mut source, layer);
            let b: Poly = random_poly(&mut source, layer);
            let id: BenchmarkId = BenchmarkId::new(ntt.name(), format!("q={}", layer.modulus()));
            group.bench_with_input(id, &(a, b), |bencher: &mut criterion::Bencher<'_>, (a, b): &(Poly, Poly)| {
                let mut res: Poly = [0u32; N];
                bencher.iter(|| ntt.pointwise_mul(black_box(&mut res), black_box(a), black_box(b), layer))
            });
        }
    }
}

fn negacyclic_mul(c: &mut Criterion) {
    let mut source: Source = Source::new([3u8; 32]);
    let mut group: criterion::BenchmarkGroup<'_, criterion::measurement::WallTime> =
        c.benchmark_group("negacyclic_mul");

    for ntt in backends() {
        let layer: Layer = Layer::Q12289;
        let a: Poly = random_poly(&mut source, layer);
        let b: Poly = random_poly(&mut source, layer);
        let id: BenchmarkId = BenchmarkId::new(ntt.name(), format!("q={}", layer.modulus()));
        group.bench_with_input(id, &(a, b), |bencher: &mut criterion::Bencher<'_>, (a, b): &(Poly, Poly)| {
            let mut res: Poly = [0u32; N];
            bencher.iter(|| ntt.negacyclic_mul(black_box(&mut res), black_box(a), black_box(b), layer))
        });
    }
}

criterion_group!(benches, forward, inverse, pointwise_mul, negacyclic_mul);
criterion_main!(benches);
