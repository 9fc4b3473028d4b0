use criterion::{black_box, criterion_group, criterion_main, Criterion};
use protocol::codec::{decode_bank_read, encode_read};
use protocol::types::{Bank, Opcode, HEADER_RESPONSE};
use std::collections::VecDeque;

fn bench_encode_read(c: &mut Criterion) {
    c.bench_function("encode_read epc 6 words", |b| {
        b.iter(|| encode_read(black_box(Bank::Epc), black_box(0), black_box(6)));
    });
}

fn bench_decode_bank_read(c: &mut Criterion) {
    let mut frame = encode_read(Bank::Epc, 0, 6);
    frame[0] = HEADER_RESPONSE;
    let opcode = frame[2];
    let body_end = frame.len() - 1;
    // Bank family: Length counts only the body after the opcode.
    let mut body = frame[3..body_end].to_vec();
    body.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    let mut rebuilt = vec![HEADER_RESPONSE, u8::try_from(body.len()).unwrap(), opcode];
    rebuilt.extend_from_slice(&body);
    let chk = rebuilt
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b));
    rebuilt.push((!chk).wrapping_add(1));

    c.bench_function("decode_bank_read epc payload", |b| {
        b.iter_batched(
            || -> VecDeque<u8> { rebuilt.iter().copied().collect() },
            |mut buf| {
                black_box(decode_bank_read(
                    &mut buf,
                    Opcode::ReadBank,
                    Bank::Epc,
                    true,
                ))
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_encode_read, bench_decode_bank_read);
criterion_main!(benches);
