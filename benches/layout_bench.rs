//! Benchmarks for the layout engine.
//!
//! Arrangement runs on every insertion, removal, and resize, so it sits on
//! the hot path of the event loop.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use slat::client::ClientId;
use slat::layout::{arrange, LayoutParams, StackOrientation};
use slat::state::Geometry;

fn params() -> LayoutParams {
    LayoutParams {
        gaps: 10,
        border_width: 2,
        master_width: 0.6,
        orientation: StackOrientation::Vertical,
    }
}

fn arrange_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let monitor = Geometry::new(0, 0, 1920, 1080);

    for n in [1usize, 5, 10, 20, 50, 99] {
        let order: Vec<ClientId> = (1..=n as u64).map(ClientId).collect();
        group.bench_with_input(BenchmarkId::new("arrange", n), &order, |b, order| {
            b.iter(|| arrange(black_box(order), black_box(monitor), &params()));
        });
    }

    group.finish();
}

fn orientation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("orientation");
    let monitor = Geometry::new(0, 0, 2560, 1440);
    let order: Vec<ClientId> = (1..=20).map(ClientId).collect();

    for orientation in [StackOrientation::Vertical, StackOrientation::Horizontal] {
        let p = LayoutParams {
            orientation,
            ..params()
        };
        group.bench_function(format!("{orientation:?}").to_lowercase(), |b| {
            b.iter(|| arrange(black_box(&order), black_box(monitor), &p));
        });
    }

    group.finish();
}

criterion_group!(benches, arrange_benchmark, orientation_benchmark);
criterion_main!(benches);
