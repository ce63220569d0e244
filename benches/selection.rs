//! Key selection and post-processing benchmarks
//!
//! Measures the non-I/O hot paths: one selection pass over the health
//! records (runs under the pool lock on every attempt) and the regex-based
//! response cleanup.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use screenwing::keys::{ExclusionSet, KeyPool};
use screenwing::postprocess;

fn bench_selection(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build");

    let mut group = c.benchmark_group("key_selection");
    for pool_size in [1usize, 4, 16, 32] {
        let pool = KeyPool::new((0..pool_size).map(|i| Some(format!("key-{i}"))))
            .expect("pool should build");
        let exclude = ExclusionSet::new();

        group.bench_with_input(
            BenchmarkId::from_parameter(pool_size),
            &pool_size,
            |b, _| {
                b.to_async(&runtime).iter(|| async {
                    pool.select(&exclude).await
                });
            },
        );
    }
    group.finish();
}

fn bench_postprocess(c: &mut Criterion) {
    let cases = [
        ("plain", "The screen shows a settings page with three toggles."),
        (
            "wrapped",
            "```\nThe screen shows a settings page with three toggles.\n```",
        ),
        (
            "code_answer",
            "Here is the fix:\n```python\n\ndef add(a, b):\n    return a + b\n\n```\nThat handles both cases.",
        ),
    ];

    let mut group = c.benchmark_group("postprocess");
    for (name, input) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, input| {
            b.iter(|| postprocess::process(input));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_selection, bench_postprocess);
criterion_main!(benches);
