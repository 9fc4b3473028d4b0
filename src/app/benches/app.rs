use api::aggregator::{Aggregator, TagRecord};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sample_tag() -> TagRecord {
    let mut tag = TagRecord::default();
    tag.tid = vec![0xAA; 12];
    tag.epc = vec![0xBB; 12];
    tag.rfu = vec![0xCC; 8];
    tag.user = [
        vec![0x01; 16],
        vec![0x02; 16],
        vec![0x03; 16],
        vec![0x04; 16],
    ];
    tag
}

fn bench_memory_map(c: &mut Criterion) {
    let tag = sample_tag();
    c.bench_function("memory_map rendering", |b| {
        b.iter(|| black_box(Aggregator::memory_map(black_box(&tag))));
    });
}

fn bench_csv_row(c: &mut Criterion) {
    let tag = sample_tag();
    c.bench_function("csv_row rendering", |b| {
        b.iter(|| black_box(Aggregator::csv_row(black_box(&tag))));
    });
}

criterion_group!(benches, bench_memory_map, bench_csv_row);
criterion_main!(benches);
