//! Benchmarks for recipe-beam core operations.
//!
//! Run with: cargo bench
//!
//! Results include 95% confidence intervals via Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use recipe_beam::core::catalog::{AttributeSchema, FoodCatalog};
use recipe_beam::core::types::{CalcMode, CatalogItem, RecipeTemplate, SearchConfig};
use recipe_beam::core::{parser, resolver, search};

const SLOT_TYPES: [&str; 4] = ["Vegetable", "Meat", "Seasoning", "Cheese"];
const ATTRIBUTES: [&str; 6] = ["str", "dex", "per", "str_pot", "dex_pot", "per_pot"];

/// Deterministic catalog with `per_slot` items per slot type.
fn generated_catalog(per_slot: usize) -> FoodCatalog {
    let schema = AttributeSchema::new(&ATTRIBUTES);
    let mut items = Vec::new();
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    for slot in SLOT_TYPES {
        for i in 0..per_slot {
            let stats = (0..ATTRIBUTES.len())
                .map(|_| {
                    seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                    ((seed >> 33) % 7) as f64 - 2.0
                })
                .collect();
            items.push(CatalogItem::new(
                &format!("{slot} {i}"),
                &[slot.to_string()],
                &[],
                stats,
            ));
        }
    }
    FoodCatalog::from_parts(schema, items).unwrap()
}

fn config(depth: u32) -> SearchConfig {
    SearchConfig {
        priority: vec!["dex".into(), "dex_pot".into()],
        depth,
        mode: CalcMode::PotentialWeighted,
        ..Default::default()
    }
}

fn bench_resolve_slots(c: &mut Criterion) {
    let template = RecipeTemplate::new(&SLOT_TYPES);
    let mut group = c.benchmark_group("resolve_slots");
    for per_slot in [50, 200, 1000] {
        let catalog = generated_catalog(per_slot);
        group.bench_with_input(BenchmarkId::from_parameter(per_slot), &catalog, |b, catalog| {
            b.iter(|| {
                let slots = resolver::resolve_slots(black_box(catalog), &template, &config(1));
                black_box(slots).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_search_depth(c: &mut Criterion) {
    let catalog = generated_catalog(60);
    let template = RecipeTemplate::new(&SLOT_TYPES[..3]);
    let mut group = c.benchmark_group("search_depth");
    group.sample_size(10);
    for depth in [1, 2, 3] {
        let cfg = config(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &cfg, |b, cfg| {
            b.iter(|| {
                let out = search::search(black_box(&catalog), &template, cfg).unwrap();
                black_box(out);
            });
        });
    }
    group.finish();
}

fn bench_search_parallel(c: &mut Criterion) {
    let catalog = generated_catalog(60);
    let template = RecipeTemplate::new(&SLOT_TYPES[..3]);
    let cfg = config(1);
    let mut group = c.benchmark_group("search_parallel");
    group.sample_size(10);
    for parallel in [false, true] {
        group.bench_with_input(BenchmarkId::from_parameter(parallel), &parallel, |b, &p| {
            b.iter(|| {
                let engine = search::BeamSearch::new(&catalog).parallel(p);
                let out = engine
                    .run(&template, &cfg, &mut search::NoProgress)
                    .unwrap();
                black_box(out);
            });
        });
    }
    group.finish();
}

fn bench_catalog_parse(c: &mut Criterion) {
    let mut yaml = String::from("attributes: [str, dex, per, str_pot, dex_pot, per_pot]\nitems:\n");
    for i in 0..500 {
        yaml.push_str(&format!(
            "  - name: Item {i}\n    slot_types: [Vegetable]\n    stats: {{ dex: {}, per: -1 }}\n",
            i % 5
        ));
    }
    c.bench_function("catalog_parse_500", |b| {
        b.iter(|| {
            let file = parser::parse_catalog(black_box(&yaml), parser::FileFormat::Yaml).unwrap();
            black_box(FoodCatalog::from_file(&file).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_resolve_slots,
    bench_search_depth,
    bench_search_parallel,
    bench_catalog_parse
);
criterion_main!(benches);
