//! Performance Benchmarks for the Search Cache
//!
//! Covers the two hot paths of type-ahead search: rebuilding a type's index after a
//! preload, and ranked local lookups while the user types.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use search_cache::{tokenize, SearchCache};
use serde_json::{json, Value};

const MANUFACTURERS: [&str; 6] = ["Cipla", "Sun Pharma", "Lupin", "Mankind", "Alkem", "Zydus"];
const MOLECULES: [&str; 8] = [
    "Paracetamol",
    "Pantoprazole",
    "Azithromycin",
    "Amoxicillin",
    "Cetirizine",
    "Metformin",
    "Atorvastatin",
    "Omeprazole",
];

/// Deterministic product catalogue of `size` entries
fn generate_products(size: usize) -> Vec<Value> {
    (0..size)
        .map(|i| {
            let molecule = MOLECULES[i % MOLECULES.len()];
            let strength = 50 * ((i / MOLECULES.len()) % 20 + 1);
            json!({
                "product_name": format!("{} {}mg", molecule, strength),
                "product_code": format!("{}{:05}", &molecule[..3].to_uppercase(), i),
                "hsn_code": format!("3004{:04}", i % 10_000),
                "category": if i % 3 == 0 { "Tablet" } else { "Capsule" },
                "manufacturer": MANUFACTURERS[i % MANUFACTURERS.len()],
            })
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_product_name", |b| {
        b.iter(|| tokenize(black_box("Amoxicillin and Potassium Clavulanate 625mg Tablets")))
    });
}

fn bench_build_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");

    for size in [1_000, 5_000, 20_000] {
        let products = generate_products(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &products, |b, products| {
            let cache: SearchCache = SearchCache::new();
            b.iter(|| cache.build_index("products", black_box(products.clone())));
        });
    }

    group.finish();
}

fn bench_search_local(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_local");
    let cache: SearchCache = SearchCache::new();
    cache.build_index("products", generate_products(20_000));

    for query in ["pa", "parac", "paracetamol 500mg", "sun", "PAR00008"] {
        group.bench_with_input(BenchmarkId::from_parameter(query), &query, |b, query| {
            b.iter(|| cache.search_local("products", black_box(query), Some(20)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_build_index, bench_search_local);
criterion_main!(benches);
