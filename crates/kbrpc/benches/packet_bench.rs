use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kbrpc::compress::CompressionType;
use kbrpc::packet::Packet;
use rmpv::Value;

fn call_args(payload_len: usize) -> Value {
    Value::Array(vec![Value::Map(vec![
        (Value::from("folder"), Value::from("private/alice")),
        (Value::from("buf"), Value::Binary(vec![0xABu8; payload_len])),
    ])])
}

fn bench_call_encode(c: &mut Criterion) {
    let packet = Packet::call(1, "keybase.1.block.putBlock", call_args(1024));
    c.bench_function("call_encode_1kb", |b| {
        b.iter(|| black_box(packet.encode().unwrap()));
    });
}

fn bench_call_decode(c: &mut Criterion) {
    let packet = Packet::call(1, "keybase.1.block.putBlock", call_args(1024));
    let bytes = packet.encode().unwrap();
    c.bench_function("call_decode_1kb", |b| {
        b.iter(|| black_box(Packet::decode(&bytes).unwrap()));
    });
}

fn bench_compressed_encode(c: &mut Criterion) {
    let packet = Packet::call_compressed(
        1,
        CompressionType::Gzip,
        "keybase.1.block.getBlockSizes",
        call_args(16 * 1024),
    );
    c.bench_function("compressed_call_encode_16kb", |b| {
        b.iter(|| black_box(packet.encode().unwrap()));
    });
}

fn bench_compressed_decode(c: &mut Criterion) {
    let packet = Packet::call_compressed(
        1,
        CompressionType::Gzip,
        "keybase.1.block.getBlockSizes",
        call_args(16 * 1024),
    );
    let bytes = packet.encode().unwrap();
    c.bench_function("compressed_call_decode_16kb", |b| {
        b.iter(|| black_box(Packet::decode(&bytes).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_call_encode,
    bench_call_decode,
    bench_compressed_encode,
    bench_compressed_decode
);
criterion_main!(benches);
