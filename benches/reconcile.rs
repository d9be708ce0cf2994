use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use statuswatch::{EntityId, Reconciler, Status};

fn snapshot(size: usize, changed_every: usize, round: usize) -> Vec<(EntityId, Status)> {
    (0..size)
        .map(|i| {
            let status = if changed_every > 0 && i % changed_every == 0 && round % 2 == 1 {
                "APPROVED"
            } else {
                "PENDING"
            };
            (EntityId::from(i as i64), Status::from(status))
        })
        .collect()
}

/// Benchmark the cold-start pass that only primes the cache
fn bench_cold_start(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_cold_start");

    for size in [100usize, 1_000, 10_000].iter() {
        let records = snapshot(*size, 0, 0);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                let mut reconciler = Reconciler::new();
                black_box(reconciler.reconcile(records.iter().cloned()));
            });
        });
    }
    group.finish();
}

/// Benchmark a primed poll where nothing changed
fn bench_steady_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_unchanged");

    for size in [100usize, 1_000, 10_000].iter() {
        let records = snapshot(*size, 0, 0);
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(records.iter().cloned());

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                black_box(reconciler.reconcile(records.iter().cloned()));
            });
        });
    }
    group.finish();
}

/// Benchmark primed polls where every tenth entity flips status
fn bench_with_changes(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_changed");

    for size in [100usize, 1_000, 10_000].iter() {
        let rounds = [snapshot(*size, 10, 0), snapshot(*size, 10, 1)];
        let mut reconciler = Reconciler::new();
        reconciler.reconcile(rounds[0].iter().cloned());

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &rounds, |b, rounds| {
            let mut round = 1;
            b.iter(|| {
                black_box(reconciler.reconcile(rounds[round].iter().cloned()));
                round ^= 1;
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cold_start, bench_steady_state, bench_with_changes);
criterion_main!(benches);
