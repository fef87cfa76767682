//! Archive benchmarks: collection passes and nearest-source queries.
//!
//! Run with:
//! ```sh
//! cargo bench -p tembo-core --bench archive
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tembo_core::index::suggest_cell_size;
use tembo_core::{
    Archive, ArchiveConfig, BreakScope, ElephantAttrs, ElephantId, Gender, Point,
    WaterSourceAttrs,
};

const SIZES: [usize; 3] = [1_000, 10_000, 50_000];

/// `families` chains of four generations each.
fn chains(families: usize) -> (Archive, Vec<ElephantId>) {
    let mut archive = Archive::default();
    let mut founders = Vec::with_capacity(families);
    for f in 0..families {
        let mut parent = None;
        for generation in 0..4 {
            let id = archive
                .create_elephant(
                    ElephantAttrs::new(format!("E{f}_{generation}"), Gender::Female, 1950 + generation * 20),
                    parent,
                    None,
                )
                .unwrap_or_else(|e| panic!("{e}"));
            if generation == 0 {
                founders.push(id);
            }
            parent = Some(id);
        }
    }
    (archive, founders)
}

fn bench_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive.collect");
    for &elephants in &SIZES {
        let families = elephants / 4;
        group.throughput(Throughput::Elements(elephants as u64));

        group.bench_with_input(BenchmarkId::new("nothing_orphaned", elephants), &families, |b, &families| {
            let (mut archive, _) = chains(families);
            b.iter(|| black_box(archive.run_collection().marked));
        });

        group.bench_with_input(BenchmarkId::new("half_orphaned", elephants), &families, |b, &families| {
            b.iter_batched(
                || {
                    let (mut archive, founders) = chains(families);
                    for id in founders.iter().step_by(2) {
                        let _ = archive.break_references(BreakScope::Family(*id));
                    }
                    archive
                },
                |mut archive| black_box(archive.run_collection().collected.len()),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn grid(sources: usize) -> Archive {
    let side = (sources as f64).sqrt().ceil() as usize;
    let extent = 1_000.0;
    let mut config = ArchiveConfig::default();
    config.index.cell_size = suggest_cell_size(extent * extent, sources);
    let mut archive = Archive::with_config(config).unwrap_or_else(|e| panic!("{e}"));
    let step = extent / side as f64;
    for i in 0..sources {
        let (x, y) = ((i % side) as f64 * step, (i / side) as f64 * step);
        let _ = archive.create_water_source(WaterSourceAttrs::new(format!("S{i}"), x, y));
    }
    archive
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive.nearest");
    for &sources in &SIZES {
        let archive = grid(sources);
        let spatial = archive.indexes().spatial();
        let query = Point::new(503.7, 498.1);
        group.bench_with_input(BenchmarkId::from_parameter(sources), &query, |b, query| {
            b.iter(|| black_box(spatial.nearest(*query, 64, |_| true).map(|hit| hit.id)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_collection, bench_nearest);
criterion_main!(benches);
