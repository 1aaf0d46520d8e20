// Batch operation benchmarks for the RENEW ledger.
//
// Covers single transfers and both batch variants at several sizes. Every
// iteration clones a pre-seeded ledger so the batch always has the same
// starting state.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use renew_contracts::ledger::{Address, Amount, Ledger};

fn seeded_ledger() -> (Ledger, Address) {
    let owner = Address::from("owner");
    let ledger = Ledger::new("Bench", "BNCH", 1_000_000_000, 18, owner.clone())
        .expect("bench ledger");
    (ledger, owner)
}

fn recipients(n: usize) -> (Vec<Address>, Vec<Amount>) {
    let addrs = (0..n).map(|i| Address::new(format!("0x{:040x}", i))).collect();
    let amounts = vec![1_000_000_000_000_000_000; n];
    (addrs, amounts)
}

fn bench_single_transfer(c: &mut Criterion) {
    let (ledger, owner) = seeded_ledger();
    let to = Address::from("recipient");

    c.bench_function("ledger/transfer", |b| {
        b.iter_batched(
            || ledger.clone(),
            |mut l| l.transfer(&owner, &to, 1).expect("transfer"),
            BatchSize::SmallInput,
        );
    });
}

fn bench_batch_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/batch_transfer");
    let (ledger, owner) = seeded_ledger();

    for size in [1usize, 16, 128, 1024] {
        let (addrs, amounts) = recipients(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter_batched(
                || ledger.clone(),
                |mut l| l.batch_transfer(&owner, &addrs, &amounts).expect("batch"),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_batch_transfer_and_lock(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/batch_transfer_and_lock");
    let (ledger, owner) = seeded_ledger();

    for size in [1usize, 16, 128, 1024] {
        let (addrs, amounts) = recipients(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter_batched(
                || ledger.clone(),
                |mut l| {
                    l.batch_transfer_and_lock(&owner, &addrs, &amounts)
                        .expect("batch")
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_single_transfer,
    bench_batch_transfer,
    bench_batch_transfer_and_lock
);
criterion_main!(benches);
