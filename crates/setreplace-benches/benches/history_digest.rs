// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use setreplace_benches::evolved_branching;
use std::hint::black_box;

fn bench_history_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_digest");
    for &n in &[10usize, 100, 1_000] {
        let set = evolved_branching(n).expect("evolved set");
        group.throughput(Throughput::Elements(set.expressions().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &set, |b, set| {
            b.iter(|| black_box(set.history_digest()));
        });
    }
    group.finish();
}

fn bench_causal_edges(c: &mut Criterion) {
    let mut group = c.benchmark_group("causal_edges");
    for &n in &[100usize, 1_000] {
        let set = evolved_branching(n).expect("evolved set");
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &set, |b, set| {
            b.iter(|| black_box(set.causal_edges()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_history_digest, bench_causal_edges);
criterion_main!(benches);
