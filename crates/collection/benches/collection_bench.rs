//! Benchmarks for stowage-collection.
//!
//! Covers materialization of derived views and tracked mutation translation.

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stowage_collection::{Collection, Expr, MemoryBackend, Record};

fn make_record(id: i64, p: i64) -> Record {
    Record::new().with("id", id).with("p", p)
}

fn make_backend(size: i64) -> Rc<MemoryBackend> {
    let records = (0..size).map(|i| make_record(i, (i * 7919) % 1000)).collect();
    Rc::new(MemoryBackend::new(records))
}

fn bench_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("fetch");

    for size in [100, 1000, 10000] {
        let root = Collection::new(make_backend(size));
        let filtered = root.filter(Expr::gt("p", 500i64)).unwrap();
        let sorted_page = filtered.sort("p").unwrap().range(10, Some(60)).unwrap();

        group.bench_with_input(BenchmarkId::new("root", size), &root, |b, view| {
            b.iter(|| pollster::block_on(black_box(view).fetch()).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("filter", size), &filtered, |b, view| {
            b.iter(|| pollster::block_on(black_box(view).fetch()).unwrap())
        });

        group.bench_with_input(
            BenchmarkId::new("filter_sort_range", size),
            &sorted_page,
            |b, view| b.iter(|| pollster::block_on(black_box(view).fetch()).unwrap()),
        );
    }

    group.finish();
}

fn bench_derive(c: &mut Criterion) {
    let root = Collection::new(make_backend(1000));

    c.bench_function("derive_chain", |b| {
        b.iter(|| {
            black_box(&root)
                .filter(Expr::gt("p", 10i64))
                .unwrap()
                .sort_by("p", true)
                .unwrap()
                .range(0, Some(25))
                .unwrap()
        })
    });
}

fn bench_tracked_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracked_update");

    for size in [100, 1000, 10000] {
        let backend = make_backend(size);
        let view = Collection::new(backend.clone())
            .sort("p")
            .unwrap()
            .range(0, Some(50))
            .unwrap()
            .track();
        view.on(stowage_collection::EventType::Update, |_| Ok(()));
        pollster::block_on(view.fetch()).unwrap();

        let mut p = 0i64;
        group.bench_with_input(BenchmarkId::new("sorted_window", size), &size, |b, &size| {
            b.iter(|| {
                p = (p + 37) % 1000;
                backend.put(make_record(black_box(size / 2), p)).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fetch, bench_derive, bench_tracked_update);
criterion_main!(benches);
