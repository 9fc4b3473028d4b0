use api::aggregator::Aggregator;
use api::driver::BankEvent;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Instant;

fn bench_fuse_epc_then_tid(c: &mut Criterion) {
    c.bench_function("aggregator fuse epc then tid", |b| {
        b.iter(|| {
            let mut agg = Aggregator::new();
            let now = Instant::now();
            black_box(agg.on_bank_event(BankEvent::Epc(vec![0xAA; 6]), now));
            black_box(agg.on_bank_event(BankEvent::Tid(vec![0xBB; 6]), now));
        });
    });
}

fn bench_history_dedup_sweep(c: &mut Criterion) {
    c.bench_function("aggregator dedup sweep over 64 tags", |b| {
        b.iter(|| {
            let mut agg = Aggregator::new();
            let now = Instant::now();
            for i in 0..64u8 {
                agg.on_bank_event(BankEvent::Epc(vec![i]), now);
                agg.on_bank_event(BankEvent::Tid(vec![i % 8]), now);
            }
            black_box(agg.tag_count());
        });
    });
}

criterion_group!(benches, bench_fuse_epc_then_tid, bench_history_dedup_sweep);
criterion_main!(benches);
