//! This bench decodes and reconciles a wide, nested schema against a query
//! string in which every path differs from its default.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use qsync::{Leaf, MemoryNavigator, NavigateOptions, Node, QueryParams, QuerySync};

/// Builds 20 sections of 5 leaves each, one of every kind.
fn defaults() -> Node {
    (0..20).fold(Node::object(), |root, section| {
        root.with(
            format!("section{section}"),
            Node::object()
                .with("page", 1)
                .with("query", "")
                .with("enabled", false)
                .with("tags", Leaf::List(Vec::new()))
                .with("range", Leaf::list([0, 100])),
        )
    })
}

fn query() -> QueryParams {
    (0..20)
        .flat_map(|section| {
            [
                (format!("section{section}.page"), "7".to_string()),
                (format!("section{section}.query"), "hello%20world".to_string()),
                (format!("section{section}.enabled"), "true".to_string()),
                (format!("section{section}.tags"), "a%2Cb%2Cc".to_string()),
                (format!("section{section}.range"), "10%2C50".to_string()),
            ]
        })
        .collect()
}

fn decode_values(c: &mut Criterion) {
    let sync = QuerySync::new(&defaults(), MemoryNavigator::new(query())).unwrap();
    c.bench_function("decode values", |b| b.iter(|| sync.values()));
}

fn reconcile_updates(c: &mut Criterion) {
    let defaults = defaults();
    let updates = QuerySync::new(&defaults, MemoryNavigator::new(query()))
        .unwrap()
        .values();

    c.bench_function("reconcile updates", |b| {
        b.iter_batched(
            || QuerySync::new(&defaults, MemoryNavigator::default()).unwrap(),
            |mut sync| {
                sync.set(&updates, Some(NavigateOptions::replace()));
                sync.set(&defaults, Some(NavigateOptions::replace()));
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, decode_values, reconcile_updates);
criterion_main!(benches);
