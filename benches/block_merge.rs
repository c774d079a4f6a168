//! Benchmarks for the block merger across conflict densities.

use conflux::merger::{fallback_merge, merge, Choice};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn make_base(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("line-{i}")).collect()
}

fn make_divergent(base: &[String], changed_every: usize) -> Vec<String> {
    base.iter()
        .enumerate()
        .map(|(i, line)| if changed_every > 0 && i % changed_every == 0 { format!("{line}-changed") } else { line.clone() })
        .collect()
}

fn bench_merge_use_a(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_merge_use_a");

    let sizes = vec![("1000_lines_sparse", 1000, 50), ("1000_lines_dense", 1000, 3)];

    for (name, count, density) in sizes {
        let a = make_base(count);
        let b = make_divergent(&a, density);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(name), &(a, b), |bencher, (a, b)| {
            bencher.iter(|| {
                let result = merge(black_box(a), black_box(b), |_, _, _| Choice::UseA);
                black_box(result);
            });
        });
    }

    group.finish();
}

fn bench_fallback_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_merge_fallback");

    let count = 2000;
    let a = make_base(count);
    let b = make_divergent(&a, 10);

    group.throughput(Throughput::Elements(count as u64));
    group.bench_function("2000_lines_dense_conflicts", |bencher| {
        bencher.iter(|| {
            let result = fallback_merge(black_box(&a), black_box(&b));
            black_box(result);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_merge_use_a, bench_fallback_merge);
criterion_main!(benches);
