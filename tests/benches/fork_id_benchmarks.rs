//! # Forkcast Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | fc-01 Fork ID | compute at head, filter validation |
//! | fc-02 ENR Updater | `eth` entry encode and decode |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fc_01_fork_id::{ForkFilter, ForkId};
use fc_02_enr_updater::{EthEnrEntry, RecordEntry};
use shared_types::{BlockHeader, ChainConfig};

/// A schedule with `blocks` height forks and `times` timestamp forks.
fn schedule(blocks: u64, times: u64) -> ChainConfig {
    let mut config = ChainConfig::new(1);
    for i in 0..blocks {
        config = config.with_block_fork(format!("block-{i}"), (i + 1) * 1_000_000);
    }
    for i in 0..times {
        config = config.with_timestamp_fork(format!("time-{i}"), 1_700_000_000 + i * 10_000_000);
    }
    config
}

// ============================================================================
// FC-01: Fork ID
// ============================================================================

fn bench_fork_id_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("fc-01-fork-id");
    let genesis = BlockHeader::genesis(0).hash;

    for size in [2u64, 8, 32] {
        let config = schedule(size, size / 2);
        group.throughput(Throughput::Elements(size + size / 2));
        group.bench_with_input(BenchmarkId::new("compute", size), &config, |b, config| {
            b.iter(|| {
                black_box(ForkId::compute(
                    config,
                    &genesis,
                    black_box(u64::MAX / 2),
                    black_box(u64::MAX / 2),
                ))
            })
        });
    }

    let config = schedule(16, 8);
    let filter = ForkFilter::new(&config, &genesis);
    let remote = ForkId::compute(&config, &genesis, 5_500_000, 0);
    group.bench_function("filter_validate", |b| {
        b.iter(|| black_box(filter.validate(black_box(remote), 9_000_000, 0)))
    });

    group.finish();
}

// ============================================================================
// FC-02: ENR entry codec
// ============================================================================

fn bench_entry_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("fc-02-enr-entry");
    let config = schedule(4, 2);
    let entry = EthEnrEntry::new(ForkId::compute(&config, &BlockHeader::genesis(0).hash, 0, 0));
    let encoded = entry.encode_value();

    group.bench_function("encode", |b| b.iter(|| black_box(entry.encode_value())));
    group.bench_function("decode", |b| {
        b.iter(|| black_box(EthEnrEntry::decode_value(black_box(&encoded))))
    });

    group.finish();
}

criterion_group!(benches, bench_fork_id_compute, bench_entry_codec);
criterion_main!(benches);
