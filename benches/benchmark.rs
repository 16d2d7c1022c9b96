// Build and query benchmarks over synthetic catalogs
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand::rngs::StdRng;
use reelmatch_core::CatalogRecord;
use reelmatch_similarity::{
    FeatureBuilder, NeighborIndex, SimilarityMatrix, TfidfVectorizer, TitleIndex, VectorizerConfig,
};

const GENRES: &[&str] = &[
    "Dramas", "Comedies", "Thrillers", "Documentaries", "Sci-Fi", "Horror", "Romance", "Anime",
    "Kids", "Crime", "Action", "Music",
];

fn random_word(rng: &mut StdRng) -> String {
    let len = rng.random_range(3..9);
    (0..len)
        .map(|_| char::from(b'a' + rng.random_range(0..26u8)))
        .collect()
}

fn generate_catalog(n: usize, seed: u64) -> Vec<CatalogRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    // a shared pool keeps term overlap realistic
    let pool: Vec<String> = (0..800).map(|_| random_word(&mut rng)).collect();
    (0..n)
        .map(|i| {
            let description: Vec<&str> = (0..rng.random_range(12..30))
                .map(|_| pool[rng.random_range(0..pool.len())].as_str())
                .collect();
            let genres: Vec<&str> = GENRES.choose_multiple(&mut rng, 2).copied().collect();
            CatalogRecord::new(format!("Title {}", i))
                .with_genres(genres.join(", "))
                .with_description(description.join(" "))
                .with_cast(random_word(&mut rng))
                .with_country("United States")
        })
        .collect()
}

fn blobs(records: &[CatalogRecord]) -> Vec<String> {
    let builder = FeatureBuilder::default();
    records.iter().map(|r| builder.build(r)).collect()
}

fn benchmark_vectorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("vectorize");

    for size in [500, 2000].iter() {
        let docs = blobs(&generate_catalog(*size, 7));
        group.bench_with_input(BenchmarkId::new("fit_transform", size), &docs, |b, docs| {
            b.iter(|| {
                let out = TfidfVectorizer::fit_transform(VectorizerConfig::default(), docs, 1024)
                    .unwrap();
                black_box(out);
            });
        });
    }

    group.finish();
}

fn benchmark_matrix_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_build");
    group.sample_size(10);

    for size in [500, 2000].iter() {
        let docs = blobs(&generate_catalog(*size, 11));
        let (_, vectors) =
            TfidfVectorizer::fit_transform(VectorizerConfig::default(), &docs, 1024).unwrap();
        group.bench_with_input(BenchmarkId::new("dense", size), &vectors, |b, vectors| {
            b.iter(|| black_box(SimilarityMatrix::from_vectors(vectors).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_top_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_k");

    let docs = blobs(&generate_catalog(3000, 13));
    let (_, vectors) =
        TfidfVectorizer::fit_transform(VectorizerConfig::default(), &docs, 1024).unwrap();
    let matrix = SimilarityMatrix::from_vectors(&vectors).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let rows: Vec<usize> = (0..256).map(|_| rng.random_range(0..matrix.len())).collect();

    for k in [5, 10, 50].iter() {
        group.bench_with_input(BenchmarkId::new("row", k), k, |b, &k| {
            let mut i = 0;
            b.iter(|| {
                let ranked = matrix.top_k(black_box(rows[i % rows.len()]), k).unwrap();
                i += 1;
                black_box(ranked);
            });
        });
    }

    group.finish();
}

fn benchmark_title_lookup(c: &mut Criterion) {
    let records = generate_catalog(10000, 17);
    let index = TitleIndex::build(records.iter().map(|r| r.title.clone()));

    c.bench_function("title_exact", |b| {
        b.iter(|| black_box(index.resolve(black_box("Title 9876"), Default::default())));
    });
    c.bench_function("title_substring", |b| {
        b.iter(|| black_box(index.resolve(black_box("itle 98"), Default::default())));
    });
}

criterion_group!(
    benches,
    benchmark_vectorize,
    benchmark_matrix_build,
    benchmark_top_k,
    benchmark_title_lookup
);
criterion_main!(benches);
