//! # Quad Store Benchmarks
//!
//! Performance benchmarks for quadex-core store operations.
//!
//! Run with: `cargo bench -p quadex-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use quadex_core::{Pattern, Quad, QuadIndex, Term, equals};
use std::hint::black_box;

fn uri(prefix: &str, i: usize) -> Term {
    Term::uri(format!("http://ex/{prefix}{i}"))
}

/// A store of `size` statements over 10 predicates and `size / 10` subjects.
fn create_store(size: usize) -> QuadIndex {
    let mut store = QuadIndex::new();
    for i in 0..size {
        store.add(&uri("s", i / 10), &uri("p", i % 10), &uri("o", i), &[]);
    }
    store
}

/// A chain of `size` blank nodes linked by one predicate.
fn create_blank_chain(size: usize) -> Vec<Quad> {
    let nodes: Vec<Term> = (0..=size).map(|_| Term::blank()).collect();
    nodes
        .windows(2)
        .map(|w| Quad::new(w[0].clone(), uri("next", 0), w[1].clone()))
        .collect()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(create_store(size)));
        });
    }

    group.finish();
}

fn bench_match_subject(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_subject");

    for size in [1000, 10000, 100000].iter() {
        let store = create_store(*size);
        let pattern = Pattern::any().with_subject(uri("s", size / 20));

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(store.matching(&pattern).count()));
        });
    }

    group.finish();
}

fn bench_match_wildcard(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_wildcard");

    for size in [1000, 10000].iter() {
        let store = create_store(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(store.quads().count()));
        });
    }

    group.finish();
}

fn bench_objects_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("objects_projection");

    for size in [1000, 10000].iter() {
        let store = create_store(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(store.objects().len()));
        });
    }

    group.finish();
}

fn bench_equals_blank_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("equals_blank_chain");

    for size in [10, 100, 500].iter() {
        let left = create_blank_chain(*size);
        let right = create_blank_chain(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(equals(left.iter(), right.iter())));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_add,
    bench_match_subject,
    bench_match_wildcard,
    bench_objects_projection,
    bench_equals_blank_chain,
);

criterion_main!(benches);
