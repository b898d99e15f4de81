use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lz_block::{compress_bound, decompress, BlockCompressor, Lz4};
use rand::prelude::*;

fn criterion_benchmark(c: &mut Criterion) {
    let mut data = vec![0u8; 10_000_000];
    thread_rng().fill(&mut data[2_000_000..6_000_000]); // mixed
    let input: &[u8] = data.as_slice();

    let mut output = vec![0u8; compress_bound(input.len())];
    let default: BlockCompressor = BlockCompressor::default();
    let mut fast = Lz4::default();
    fast.acceleration(8);
    let fast = BlockCompressor::new(fast);

    let mut group = c.benchmark_group("compress");
    group.sample_size(10);
    group.bench_function("default", |b| b.iter(|| default.compress(black_box(input), &mut output)));
    group.bench_function("acceleration 8", |b| b.iter(|| fast.compress(black_box(input), &mut output)));
    group.finish();

    let block = default.compress_to_vec(input).unwrap();
    c.bench_function("decompress", |b| b.iter(|| decompress(black_box(&block))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
