use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use strata_data::Pool;

fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("Slot Pool");

    group.bench_function("push_back + erase churn (4096)", |b| {
        let mut pool: Pool<u32, u64> = Pool::new("bench", 4096);
        b.iter(|| {
            let handles: Vec<_> = (0..4096u64)
                .filter_map(|i| pool.push_back(i).ok())
                .collect();
            for handle in handles {
                black_box(pool.erase(handle));
            }
        });
    });

    // Half the slots are holes, so iteration has to skip them.
    let mut pool: Pool<u32, u64> = Pool::new("bench", 4096);
    let handles: Vec<_> = (0..4096u64)
        .filter_map(|i| pool.push_back(i).ok())
        .collect();
    for handle in handles.iter().step_by(2) {
        pool.erase(*handle);
    }

    group.bench_function("iterate half-full pool", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for (_, value) in pool.iter() {
                sum += value;
            }
            black_box(sum);
        });
    });

    group.bench_function("validated lookup", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for handle in &handles {
                if pool.get(*handle).is_some() {
                    hits += 1;
                }
            }
            black_box(hits);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pool);
criterion_main!(benches);
