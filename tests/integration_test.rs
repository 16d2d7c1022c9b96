// Integration tests for reelmatch
use actix_web::{test as actix_test, web, App};
use reelmatch::prelude::*;
use reelmatch_api::rest;
use reelmatch_similarity::{MatchTier, SimilarityMatrix};
use reelmatch_storage::{parse_catalog, MANIFEST_FILE};
use std::fs;
use std::sync::Arc;

const CATALOG_CSV: &str = "\
show_id,type,title,director,cast,country,release_year,rating,duration,listed_in,description
s1,TV Show,Stranger Things,,,United States,2016,TV-14,4 Seasons,\"Sci-Fi, Horror\",kids fight monsters
s2,TV Show,Dark,,,Germany,2017,TV-MA,3 Seasons,\"Sci-Fi, Mystery\",time travel monsters
s3,TV Show,Friends,,,United States,1994,TV-14,10 Seasons,Comedy,six friends in New York
";

fn scenario_records() -> Vec<CatalogRecord> {
    parse_catalog(CATALOG_CSV.as_bytes()).unwrap().records
}

fn build_set(records: Vec<CatalogRecord>) -> ArtifactSet {
    IndexBuilder::new(BuildConfig::default())
        .build(records)
        .unwrap()
        .0
}

fn ghost_records() -> Vec<CatalogRecord> {
    let rows = [
        ("Stranger Things", "kids fight monsters"),
        ("Dark", "time travel monsters"),
        ("Friends", "six friends in New York"),
        ("Ghost", "a haunted house story"),
        ("Narcos", "drug cartel crime saga"),
        ("Ozark", "money laundering family crime"),
        ("The Crown", "british royal family drama"),
        ("Ghost", "a lonely spirit searches for peace"),
    ];
    rows.iter()
        .map(|(title, description)| CatalogRecord::new(*title).with_description(*description))
        .collect()
}

#[test]
fn test_similar_show_ranks_above_unrelated() {
    let recommender = Recommender::new(build_set(scenario_records()));
    let result = recommender.recommend("Stranger Things", 2).unwrap();

    assert_eq!(result.titles(), vec!["Dark", "Friends"]);
    assert!(result.items[0].similarity_score > result.items[1].similarity_score);
    assert_eq!(result.items[0].kind, "TV Show");
    assert_eq!(result.items[0].release_year, Some(2017));
}

#[test]
fn test_case_insensitive_lookup_matches_exact() {
    let recommender = Recommender::new(build_set(scenario_records()));
    let exact = recommender.recommend("Stranger Things", 1).unwrap();
    for query in ["stranger things", "STRANGER THINGS", "  Stranger things  "] {
        let folded = recommender.recommend(query, 1).unwrap();
        assert_eq!(folded.items, exact.items);
        assert_eq!(folded.resolved.unwrap().tier, MatchTier::CaseInsensitive);
    }
}

#[test]
fn test_substring_resolution_can_be_disabled() {
    let recommender = Recommender::new(build_set(scenario_records()));

    let fuzzy = recommender.recommend("strange", 1).unwrap();
    let resolved = fuzzy.resolved.as_ref().unwrap();
    assert_eq!(resolved.title, "Stranger Things");
    assert_eq!(resolved.tier, MatchTier::Substring);
    assert_eq!(fuzzy.titles(), vec!["Dark"]);

    let options = RecommendOptions {
        top_k: 1,
        lookup: LookupMode::Exact,
        ..Default::default()
    };
    let exact = recommender.recommend_with("strange", &options).unwrap();
    assert!(exact.resolved.is_none());
    assert!(exact.is_empty());
}

#[test]
fn test_unknown_title_returns_empty() {
    let recommender = Recommender::new(build_set(scenario_records()));
    let result = recommender.recommend("Nonexistent Title XYZ", 5).unwrap();
    assert!(result.is_empty());
    assert!(result.resolved.is_none());
}

#[test]
fn test_duplicate_titles_resolve_to_first_occurrence() {
    let set = build_set(ghost_records());
    assert_eq!(set.manifest.duplicate_titles, 1);
    let recommender = Recommender::new(set);
    for _ in 0..5 {
        let result = recommender.recommend("Ghost", 3).unwrap();
        assert_eq!(result.resolved.unwrap().row, 3);
        assert!(result.items.iter().all(|item| item.row != 3));
    }
}

#[test]
fn test_matrix_properties() {
    let set = build_set(ghost_records());
    let n = set.matrix.len();
    for i in 0..n {
        for j in 0..n {
            let s = set.matrix.score(i, j).unwrap();
            assert!(!s.is_nan());
            assert!((0.0..=1.0).contains(&s));
            assert_eq!(s.to_bits(), set.matrix.score(j, i).unwrap().to_bits());
        }
        let ranked = set.matrix.top_k(i, n).unwrap();
        assert_eq!(ranked.len(), n - 1);
        assert!(ranked.rows().all(|row| row != i));
    }
}

#[test]
fn test_two_builds_are_identical() {
    let a = build_set(ghost_records());
    let b = build_set(ghost_records());
    assert_eq!(a.matrix, b.matrix);
    assert_eq!(a.vectors, b.vectors);
    for row in 0..a.matrix.len() {
        let ra: Vec<usize> = a.matrix.top_k(row, 5).unwrap().rows().collect();
        let rb: Vec<usize> = b.matrix.top_k(row, 5).unwrap().rows().collect();
        assert_eq!(ra, rb);
    }
}

#[test]
fn test_zero_vectors_never_produce_nan() {
    // "the" is a stop word: the second record vectorizes to zero
    let records = vec![
        CatalogRecord::new("Dark").with_description("time travel"),
        CatalogRecord::new("The"),
        CatalogRecord::new("Travel Guide").with_description("time travel"),
    ];
    let set = build_set(records);
    assert!(set.vectors[1].is_zero());
    let row = set.matrix.row(1).unwrap();
    assert!(row.iter().all(|s| *s == 0.0));

    let manual = SimilarityMatrix::from_vectors(&set.vectors).unwrap();
    assert_eq!(manual, set.matrix);
}

#[test]
fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let set = build_set(scenario_records());
    ArtifactStore::new(dir.path()).save(&set).unwrap();

    let in_memory = Recommender::new(set);
    let on_disk = Recommender::open(dir.path());
    assert!(!on_disk.is_loaded());

    for query in ["Stranger Things", "dark", "friend"] {
        assert_eq!(
            on_disk.recommend(query, 2).unwrap(),
            in_memory.recommend(query, 2).unwrap()
        );
    }
    assert!(on_disk.is_loaded());
    assert_eq!(
        on_disk.recommend_by_text("monsters", 2).unwrap(),
        in_memory.recommend_by_text("monsters", 2).unwrap()
    );
}

#[test]
fn test_missing_and_tampered_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    store.save(&build_set(scenario_records())).unwrap();

    fs::remove_file(store.path(MANIFEST_FILE)).unwrap();
    assert!(matches!(store.load(), Err(Error::ArtifactMissing(name)) if name == MANIFEST_FILE));

    store.save(&build_set(scenario_records())).unwrap();
    fs::write(store.path("index_map.json"), "{\"dark\": 0}").unwrap();
    assert!(matches!(store.load(), Err(Error::ArtifactInconsistent(_))));
}

#[test]
fn test_build_from_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("catalog.csv");
    fs::write(&csv_path, CATALOG_CSV).unwrap();

    let catalog = load_catalog(&csv_path).unwrap();
    assert_eq!(catalog.len(), 3);
    let (set, report) = IndexBuilder::new(BuildConfig::default())
        .build(catalog.records)
        .unwrap();
    assert_eq!(report.rows, 3);
    assert_eq!(set.manifest.config, BuildConfig::default());
}

#[test]
fn test_export_over_query_surface() {
    let recommender = Recommender::new(build_set(ghost_records()));
    let mut buf = Vec::new();
    let report = reelmatch::export(
        &recommender,
        &mut buf,
        &ExportOptions {
            top_k: 2,
            limit: None,
            sample_seed: None,
            bom: false,
        },
    )
    .unwrap();
    // seven distinct titles, "Ghost" counted once
    assert_eq!(report.sources, 7);
    assert_eq!(report.rows, 14);
    assert_eq!(report.skipped, 0);

    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 15);
}

#[actix_web::test]
async fn test_rest_endpoints() {
    let recommender = Arc::new(Recommender::new(build_set(scenario_records())));
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(recommender.clone()))
            .configure(rest::configure),
    )
    .await;

    let req = actix_test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["rows"], 3);

    let req = actix_test::TestRequest::get()
        .uri("/recommend?title=stranger%20things&top_k=1")
        .to_request();
    let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"][0]["title"], "Dark");
    assert_eq!(body["resolved"]["row"], 0);

    let req = actix_test::TestRequest::get()
        .uri("/recommend?title=Dark&top_k=-2")
        .to_request();
    let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"].as_array().unwrap().len(), 0);

    let req = actix_test::TestRequest::get()
        .uri("/recommend?title=strange&substring=false")
        .to_request();
    let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
    assert!(body["resolved"].is_null());

    let req = actix_test::TestRequest::post()
        .uri("/recommend/text")
        .set_json(serde_json::json!({ "query": "time travel", "top_k": 1 }))
        .to_request();
    let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"][0]["title"], "Dark");

    let req = actix_test::TestRequest::get().uri("/search?q=FRI").to_request();
    let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"][0]["title"], "Friends");

    let req = actix_test::TestRequest::get().uri("/titles/1").to_request();
    let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"]["title"], "Dark");

    let req = actix_test::TestRequest::get().uri("/titles/99").to_request();
    let resp = actix_test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
}
