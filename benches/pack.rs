//! Benchmarks for XBM packing and source emission.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use xbm_anim::{
    animation::{AnimationTable, FrameRegistry},
    bitmap::{PixelGrid, pack, pack_batch},
    emit::emit,
    schema::{CanvasConfig, EmitOptions, Polarity},
};

fn checkerboard(width: usize, height: usize, phase: usize) -> PixelGrid {
    PixelGrid::from_fn(width, height, |x, y| (x / 4 + y / 4 + phase) % 2 == 0)
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack");

    for (width, height) in [(128, 32), (128, 64), (256, 128), (800, 480)] {
        let grid = checkerboard(width, height, 0);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &grid,
            |b, grid| {
                b.iter(|| pack(black_box(grid), Polarity::OnIsWhite).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_pack_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_batch");

    for frames in [10, 100, 500] {
        let grids: Vec<_> = (0..frames).map(|i| checkerboard(128, 64, i)).collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_frames", frames)),
            &grids,
            |b, grids| {
                b.iter(|| pack_batch(black_box(grids), Polarity::OnIsWhite).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");

    for frames in [10, 100, 500] {
        let mut registry = FrameRegistry::new(CanvasConfig::default());
        for i in 0..frames {
            let frame = pack(&checkerboard(128, 64, i), Polarity::OnIsWhite).unwrap();
            registry.register(frame, Some("frame")).unwrap();
        }
        let mut table = AnimationTable::new();
        table
            .build_sequence(&registry, "idle", (0..frames).collect(), Default::default())
            .unwrap();
        let options = EmitOptions::default();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_frames", frames)),
            &frames,
            |b, _| {
                b.iter(|| emit(black_box(&registry), &table, Polarity::OnIsWhite, &options).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_pack, bench_pack_batch, bench_emit);
criterion_main!(benches);
