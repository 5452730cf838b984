use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use preflow::graph::{edmond_karp, random_network, Admissibility, Config, PreflowPush};

fn bench_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("preflow_workers");
    let network = random_network(11, 400, 4000, 1000).unwrap();

    for workers in [1, 2, 4, 8] {
        let solver = PreflowPush::new(Config::default().with_workers(workers));
        group.bench_with_input(BenchmarkId::from_parameter(workers), &solver, |b, solver| {
            b.iter(|| solver.solve(black_box(&network), 0, 399).unwrap().value)
        });
    }
    group.finish();
}

fn bench_admissibility(c: &mut Criterion) {
    let mut group = c.benchmark_group("preflow_admissibility");
    let network = random_network(5, 200, 1500, 100).unwrap();

    for (name, rule) in [
        ("relaxed", Admissibility::Relaxed),
        ("strict", Admissibility::Strict),
    ] {
        let solver = PreflowPush::new(
            Config::default()
                .with_workers(4)
                .with_admissibility(rule),
        );
        group.bench_function(name, |b| {
            b.iter(|| solver.solve(black_box(&network), 0, 199).unwrap().value)
        });
    }
    group.finish();
}

fn bench_reference(c: &mut Criterion) {
    let network = random_network(5, 200, 1500, 100).unwrap();
    c.bench_function("edmond_karp_200", |b| {
        b.iter(|| edmond_karp(black_box(&network), 0, 199).unwrap())
    });
}

criterion_group!(benches, bench_workers, bench_admissibility, bench_reference);
criterion_main!(benches);
