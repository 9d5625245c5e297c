//! Benchmarks for the segmented sieve

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use segsieve::{SieveConfig, SieveEngine};

fn bench_worker_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("sieve_workers");
    let upper = 10_000_000;
    group.throughput(Throughput::Elements(upper as u64));
    group.sample_size(10);

    for num_threads in [1, 2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let config = SieveConfig::new(0, black_box(upper)).with_num_threads(num_threads);
                    let mut engine = SieveEngine::new(config).unwrap();
                    let mut sink: Vec<u8> = Vec::with_capacity(8 * 1024 * 1024);
                    engine.get_primes(&mut sink).unwrap();
                    engine.prime_count()
                });
            },
        );
    }

    group.finish();
}

fn bench_segment_lengths(c: &mut Criterion) {
    let mut group = c.benchmark_group("sieve_segment_len");
    let upper = 10_000_000;
    group.sample_size(10);

    for segment_len in [32 * 1024, 256 * 1024, 1_000_000, 4 * 1024 * 1024].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(segment_len),
            segment_len,
            |b, &segment_len| {
                b.iter(|| {
                    let config = SieveConfig::new(0, upper).with_segment_len(segment_len);
                    let mut engine = SieveEngine::new(config).unwrap();
                    let mut sink = std::io::sink();
                    engine.get_primes(&mut sink).unwrap();
                    engine.prime_count()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_worker_counts, bench_segment_lengths);

criterion_main!(benches);
