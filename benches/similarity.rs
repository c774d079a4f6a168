//! Benchmarks for the Jaccard similarity scorer across line-set sizes.

use conflux::similarity::score;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn make_lines(count: usize, seed: u64) -> Vec<String> {
    (0..count).map(|i| format!("line-{}", (i as u64).wrapping_mul(31).wrapping_add(seed) % (count as u64 + 1))).collect()
}

fn bench_score_scale(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity_score");

    let sizes = vec![("100_lines", 100), ("1000_lines", 1000), ("10000_lines", 10000)];

    for (name, count) in sizes {
        let a = make_lines(count, 0);
        let b = make_lines(count, 7);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(name), &(a, b), |bencher, (a, b)| {
            bencher.iter(|| {
                let s = score(black_box(a), black_box(b));
                black_box(s);
            });
        });
    }

    group.finish();
}

fn bench_score_near_identical(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity_score_near_identical");

    let count = 5000;
    let a = make_lines(count, 0);
    let mut b = a.clone();
    b[0] = "changed".to_string();

    group.throughput(Throughput::Elements(count as u64));
    group.bench_function("5000_lines_one_changed", |bencher| {
        bencher.iter(|| {
            let s = score(black_box(&a), black_box(&b));
            black_box(s);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_score_scale, bench_score_near_identical);
criterion_main!(benches);
