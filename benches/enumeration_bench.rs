//! Benchmarks for enumeration and identity caching.
//!
//! Measures a full chip/feature/subfeature walk with a cold cache (no
//! wrappers held between passes) against a warm one (every wrapper held),
//! plus the chip name formatter and a single value read.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lmsensors::{Sensors, Simulated, Subfeature};
use std::io::Write;
use tempfile::NamedTempFile;

fn config() -> NamedTempFile {
    let mut doc = String::from("{");
    for chip in 0..8 {
        if chip > 0 {
            doc.push(',');
        }
        doc.push_str(&format!("\"nct{chip}-isa-{chip:04x}\":{{"));
        for feature in 1..=16 {
            if feature > 1 {
                doc.push(',');
            }
            doc.push_str(&format!(
                "\"temp{feature}\":{{\"temp{feature}_input\":40.0,\"temp{feature}_max\":80.0,\"temp{feature}_crit\":100.0}}"
            ));
        }
        doc.push('}');
    }
    doc.push('}');

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(doc.as_bytes()).unwrap();
    file
}

fn walk(sensors: &Sensors<Simulated>) -> Vec<Subfeature<Simulated>> {
    sensors
        .chips()
        .flat_map(|chip| chip.features())
        .flat_map(|feature| feature.subfeatures())
        .collect()
}

fn bench_walk_cold(c: &mut Criterion) {
    let file = config();
    let sensors = Sensors::<Simulated>::open(file.path()).unwrap();

    c.bench_function("walk_cold_cache", |b| {
        b.iter(|| black_box(walk(&sensors).len()));
    });
}

fn bench_walk_warm(c: &mut Criterion) {
    let file = config();
    let sensors = Sensors::<Simulated>::open(file.path()).unwrap();
    let _held = walk(&sensors);

    c.bench_function("walk_warm_cache", |b| {
        b.iter(|| black_box(walk(&sensors).len()));
    });
}

fn bench_chip_name(c: &mut Criterion) {
    let file = config();
    let sensors = Sensors::<Simulated>::open(file.path()).unwrap();
    let chip = sensors.chips().next().unwrap();

    c.bench_function("chip_name", |b| {
        b.iter(|| black_box(chip.name().unwrap()));
    });
}

fn bench_value_read(c: &mut Criterion) {
    let file = config();
    let sensors = Sensors::<Simulated>::open(file.path()).unwrap();
    let sub = walk(&sensors).pop().unwrap();

    c.bench_function("subfeature_value", |b| {
        b.iter(|| black_box(sub.value().unwrap()));
    });
}

criterion_group!(
    benches,
    bench_walk_cold,
    bench_walk_warm,
    bench_chip_name,
    bench_value_read
);
criterion_main!(benches);
