//! Benchmark suite for the advertisement decoder.
//!
//! Covers both payload encodings on the same record so the cost of the
//! hex-of-ASCII indirection is directly comparable to the direct path.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::collections::HashMap;
use tpms_listener::{FieldMap, PayloadEncoding, SensorFormat, decode};

const MANUFACTURER_ID: u16 = 0x7C50;

/// Six-field record as broadcast by the extended hardware revision.
fn payload() -> Vec<u8> {
    b"32|PSI|95|C|0.98|87".to_vec()
}

fn bench_decode(c: &mut Criterion) {
    let payload = payload();
    let mut data = HashMap::new();
    data.insert(MANUFACTURER_ID, payload.clone());

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for (label, encoding) in [
        ("direct-ascii", PayloadEncoding::DirectAscii),
        ("hex-of-ascii", PayloadEncoding::HexOfAscii),
    ] {
        let format = SensorFormat::new(MANUFACTURER_ID, encoding, FieldMap::extended());
        group.bench_function(label, |b| {
            b.iter(|| decode(black_box(&data), black_box(&format)))
        });
    }

    group.finish();
}

fn bench_decode_miss(c: &mut Criterion) {
    // The common case: an advertisement without the target manufacturer ID
    let mut data = HashMap::new();
    data.insert(0x0499u16, payload());
    let format = SensorFormat::new(
        MANUFACTURER_ID,
        PayloadEncoding::DirectAscii,
        FieldMap::extended(),
    );

    c.bench_function("decode_miss", |b| {
        b.iter(|| decode(black_box(&data), black_box(&format)))
    });
}

criterion_group!(benches, bench_decode, bench_decode_miss);
criterion_main!(benches);
