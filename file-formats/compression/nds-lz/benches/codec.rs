//! Codec throughput benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use nds_lz::{CompressionMethod, compress_with, decompress};
use std::hint::black_box;

/// Generate test data with specified characteristics
fn generate_test_data(size: usize, compressibility: &str) -> Vec<u8> {
    match compressibility {
        "high" => vec![b'A'; size],
        "medium" => {
            let pattern = b"The quick brown fox jumps over the lazy dog. ";
            pattern.iter().copied().cycle().take(size).collect()
        }
        _ => {
            let mut seed = 0x1234_5678u32;
            (0..size)
                .map(|_| {
                    seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                    (seed >> 16) as u8
                })
                .collect()
        }
    }
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    let size = 256 * 1024;
    group.throughput(Throughput::Bytes(size as u64));

    for method in [CompressionMethod::Lz10, CompressionMethod::Lz11] {
        for level in ["high", "medium", "low"] {
            let data = generate_test_data(size, level);
            group.bench_with_input(
                BenchmarkId::new(method.name(), level),
                &data,
                |b, data| b.iter(|| compress_with(black_box(data), method)),
            );
        }
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    let size = 256 * 1024;
    group.throughput(Throughput::Bytes(size as u64));

    for method in [CompressionMethod::Lz10, CompressionMethod::Lz11] {
        for level in ["high", "medium", "low"] {
            let block = compress_with(&generate_test_data(size, level), method).unwrap();
            group.bench_with_input(
                BenchmarkId::new(method.name(), level),
                &block,
                |b, block| b.iter(|| decompress(black_box(block))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress);
criterion_main!(benches);
