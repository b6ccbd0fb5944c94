//! Benchmarks for the type catalog.
//!
//! Measures the hot paths of a large, fully loaded catalog:
//! - Case-insensitive lookup by full name
//! - Implementation queries, cold and cached
//! - Incremental module loads

extern crate dotbridge;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use dotbridge::prelude::*;
use std::hint::black_box;

const NAMESPACES: usize = 50;
const TYPES_PER_NAMESPACE: usize = 200;

/// A catalog of 10k types; every tenth type derives from `Game.Component`.
fn loaded_catalog() -> (TypeCatalog, TypeRecordRc) {
    let catalog = TypeCatalog::new(&BridgeConfig::managed(), DiagnosticSink::silent());
    let component = TypeBuilder::class("Game", "Component").abstract_type().build();

    let mut modules = vec![ModuleInfo::new("Game", vec![component.clone()])];
    for ns in 0..NAMESPACES {
        let namespace = format!("Game.Module{ns}");
        let types = (0..TYPES_PER_NAMESPACE)
            .map(|index| {
                let builder = TypeBuilder::class(&namespace, &format!("Type{index}"));
                if index % 10 == 0 {
                    builder.extends(&component).build()
                } else {
                    builder.build()
                }
            })
            .collect();
        modules.push(ModuleInfo::new(&namespace, types));
    }
    catalog.initialize(&modules);
    (catalog, component)
}

/// Benchmark an exact-case lookup.
fn bench_lookup_exact(c: &mut Criterion) {
    let (catalog, _) = loaded_catalog();

    c.bench_function("catalog_lookup_exact", |b| {
        b.iter(|| black_box(catalog.lookup(black_box("Game.Module25.Type123"))));
    });
}

/// Benchmark a lookup whose casing differs from the registered name.
fn bench_lookup_folded(c: &mut Criterion) {
    let (catalog, _) = loaded_catalog();

    c.bench_function("catalog_lookup_folded", |b| {
        b.iter(|| black_box(catalog.lookup(black_box("GAME.MODULE25.TYPE123"))));
    });
}

/// Benchmark a miss.
fn bench_lookup_missing(c: &mut Criterion) {
    let (catalog, _) = loaded_catalog();

    c.bench_function("catalog_lookup_missing", |b| {
        b.iter(|| black_box(catalog.lookup(black_box("Game.Module25.Nope"))));
    });
}

/// Benchmark a full parallel implementation scan.
///
/// A type is inserted per iteration so the cached result is always stale.
fn bench_implementations_cold(c: &mut Criterion) {
    let (catalog, component) = loaded_catalog();
    let mut counter = 0usize;

    c.bench_function("catalog_implementations_cold", |b| {
        b.iter_batched(
            || {
                counter += 1;
                let _ = catalog.insert(TypeBuilder::class("Bench", &format!("Filler{counter}")).build());
            },
            |()| {
                black_box(catalog.get_implementations(
                    black_box(&component),
                    ImplementationFilter::default(),
                ))
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark a repeated implementation query served from the cache.
fn bench_implementations_cached(c: &mut Criterion) {
    let (catalog, component) = loaded_catalog();
    let _ = catalog.get_implementations(&component, ImplementationFilter::default());

    c.bench_function("catalog_implementations_cached", |b| {
        b.iter(|| {
            black_box(catalog.get_implementations(
                black_box(&component),
                ImplementationFilter::default(),
            ))
        });
    });
}

/// Benchmark indexing a freshly loaded module of 200 types.
fn bench_module_load(c: &mut Criterion) {
    c.bench_function("catalog_module_load", |b| {
        b.iter_batched(
            || {
                let catalog =
                    TypeCatalog::new(&BridgeConfig::managed(), DiagnosticSink::silent());
                let types = (0..TYPES_PER_NAMESPACE)
                    .map(|index| TypeBuilder::class("Late", &format!("Type{index}")).build())
                    .collect();
                (catalog, ModuleInfo::new("Late", types))
            },
            |(catalog, module)| black_box(catalog.on_module_loaded(&module)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_lookup_exact,
    bench_lookup_folded,
    bench_lookup_missing,
    bench_implementations_cold,
    bench_implementations_cached,
    bench_module_load,
);
criterion_main!(benches);
