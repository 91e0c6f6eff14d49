// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Benchmarks for the overflow queue.
//!
//! Measures:
//! - Push throughput while the queue is spilling to disk
//! - Push/drain round trip through overflow files
//! - Resident-only push/pop as a baseline

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use spillq::{OverflowQueue, QueueBuilder};
use tempfile::TempDir;

/// Capacities to benchmark; smaller capacities spill more often.
const CAPACITIES: &[usize] = &[64, 1024, 16384];

/// Number of items per iteration
const ITEM_COUNT: usize = 50_000;

/// Payload size of each item in bytes
const ITEM_SIZE: usize = 256;

fn create_queue(temp_dir: &TempDir, capacity: usize) -> OverflowQueue<Vec<u8>> {
    QueueBuilder::new(temp_dir.path())
        .capacity(capacity)
        .build()
}

fn generate_item() -> Vec<u8> { vec![0xABu8; ITEM_SIZE] }

// =============================================================================
// Push Throughput
// =============================================================================

fn bench_push_with_spill(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_with_spill");
    group.sample_size(20);
    group.throughput(Throughput::Elements(ITEM_COUNT as u64));

    for &capacity in CAPACITIES {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter_batched(
                    || {
                        let temp_dir = TempDir::new().unwrap();
                        let queue = create_queue(&temp_dir, capacity);
                        (temp_dir, queue, generate_item())
                    },
                    |(temp_dir, queue, item)| {
                        for _ in 0..ITEM_COUNT {
                            queue.push(black_box(item.clone())).unwrap();
                        }
                        drop(queue);
                        drop(temp_dir);
                    },
                    BatchSize::PerIteration,
                );
            },
        );
    }

    group.finish();
}

// =============================================================================
// Round Trip Through Disk
// =============================================================================

fn bench_push_then_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_then_drain");
    group.sample_size(20);
    group.throughput(Throughput::Elements(ITEM_COUNT as u64));

    for &capacity in CAPACITIES {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter_batched(
                    || {
                        let temp_dir = TempDir::new().unwrap();
                        let queue = create_queue(&temp_dir, capacity);
                        (temp_dir, queue, generate_item())
                    },
                    |(temp_dir, queue, item)| {
                        for _ in 0..ITEM_COUNT {
                            queue.push(item.clone()).unwrap();
                        }
                        for _ in 0..ITEM_COUNT {
                            black_box(queue.popw().unwrap());
                        }
                        drop(queue);
                        drop(temp_dir);
                    },
                    BatchSize::PerIteration,
                );
            },
        );
    }

    group.finish();
}

// =============================================================================
// Resident-Only Baseline
// =============================================================================

fn bench_resident_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("resident_push_pop");
    group.throughput(Throughput::Elements(1));

    let temp_dir = TempDir::new().unwrap();
    let queue = QueueBuilder::new(temp_dir.path()).unbounded().build::<u64>();

    group.bench_function("push_pop", |b| {
        b.iter(|| {
            queue.push(black_box(42)).unwrap();
            black_box(queue.try_pop().unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_push_with_spill,
    bench_push_then_drain,
    bench_resident_push_pop,
);
criterion_main!(benches);
