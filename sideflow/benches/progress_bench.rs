//! Benchmarks for progress computation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sideflow::context::ProgressTracker;
use sideflow::stages::{resolve_floors, StageLayout};
use sideflow::testing::{decompile_stages, StageLog};

fn progress_benchmark(c: &mut Criterion) {
    let declared = [Some(0), Some(1), Some(2), None, Some(84), Some(86), Some(88), Some(90), None];
    c.bench_function("resolve_floors", |b| {
        b.iter(|| resolve_floors(black_box(&declared)))
    });

    let layout = match StageLayout::resolve(&decompile_stages(&StageLog::new(), None)) {
        Ok(layout) => layout,
        Err(err) => panic!("decompile layout rejected: {err}"),
    };
    c.bench_function("progress_at", |b| {
        b.iter(|| {
            (0..layout.len())
                .map(|index| u32::from(layout.progress_at(black_box(index), 50)))
                .sum::<u32>()
        })
    });

    let tracker = ProgressTracker::new("decompile", None, layout);
    c.bench_function("snapshot", |b| b.iter(|| black_box(tracker.snapshot())));
}

criterion_group!(benches, progress_benchmark);
criterion_main!(benches);
