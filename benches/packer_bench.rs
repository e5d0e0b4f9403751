//! Benchmarks for single-container packing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use warehouse_packer::model::{ContainerSpec, Item, PackingLimits};
use warehouse_packer::optimizer::{PackingConfig, pack_items, pack_items_with_config};

fn mixed_items(count: usize) -> Vec<Item> {
    (0..count)
        .filter_map(|i| {
            let l = 2.0 + (i % 7) as f64;
            let w = 1.0 + (i % 5) as f64;
            let h = 1.0 + (i % 3) as f64 * 1.5;
            Item::new(i, (l, w, h), 1.0).ok()
        })
        .collect()
}

fn packer_benchmark(c: &mut Criterion) {
    let container = match ContainerSpec::new((60.0, 40.0, 30.0)) {
        Ok(container) => container,
        Err(err) => panic!("benchmark container is invalid: {err}"),
    };
    let limits = match PackingLimits::new(10_000.0, 90.0) {
        Ok(limits) => limits,
        Err(err) => panic!("benchmark limits are invalid: {err}"),
    };
    let items = mixed_items(120);
    let parallel = PackingConfig::builder().parallel_scoring(true).build();

    c.bench_function("pack_120_mixed_items", |b| {
        b.iter(|| pack_items(black_box(&container), black_box(&items), limits))
    });

    c.bench_function("pack_120_mixed_items_parallel", |b| {
        b.iter(|| {
            pack_items_with_config(black_box(&container), black_box(&items), limits, parallel)
        })
    });
}

criterion_group!(benches, packer_benchmark);
criterion_main!(benches);
