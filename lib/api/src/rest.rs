use crate::recommender::{
    RecommendOptions, Recommendations, Recommender, DEFAULT_SEARCH_LIMIT, DEFAULT_TOP_K,
};
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use reelmatch_core::Error;
use reelmatch_similarity::LookupMode;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Deserialize)]
struct RecommendQuery {
    title: String,
    top_k: Option<i64>,
    /// Allow substring title resolution (default on).
    substring: Option<bool>,
    #[serde(default)]
    exclude_same_type: bool,
}

#[derive(Deserialize)]
struct TextRecommendRequest {
    query: String,
    top_k: Option<i64>,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(recommender: Arc<Recommender>, port: u16) -> std::io::Result<()> {
        info!("REST API listening on 0.0.0.0:{}", port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(recommender.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Route table, shared by the server and tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/recommend", web::get().to(recommend))
        .route("/recommend/text", web::post().to(recommend_text))
        .route("/search", web::get().to(search))
        .route("/titles/{row}", web::get().to(get_title));
}

/// Negative counts ask for nothing.
fn clamp_top_k(top_k: Option<i64>) -> usize {
    match top_k {
        Some(k) if k <= 0 => 0,
        Some(k) => usize::try_from(k).unwrap_or(usize::MAX),
        None => DEFAULT_TOP_K,
    }
}

fn error_response(e: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        Error::IndexOutOfRange { .. } | Error::TitleNotFound(_) => HttpResponse::NotFound().json(body),
        Error::ArtifactMissing(_) | Error::ArtifactInconsistent(_) => {
            HttpResponse::ServiceUnavailable().json(body)
        }
        Error::InvalidConfig(_) | Error::InvalidDimension { .. } => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

fn recommendations_response(result: &Recommendations) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "query": result.query,
        "resolved": result.resolved,
        "result": result.items,
    }))
}

async fn health(recommender: web::Data<Arc<Recommender>>) -> ActixResult<HttpResponse> {
    let body = match recommender.load() {
        Ok(set) => serde_json::json!({
            "status": "ok",
            "rows": set.len(),
            "vocab_size": set.manifest.vocab_size,
            "built_at": set.manifest.created_at,
        }),
        Err(e) => return Ok(error_response(&e)),
    };
    Ok(HttpResponse::Ok().json(body))
}

async fn recommend(
    recommender: web::Data<Arc<Recommender>>,
    query: web::Query<RecommendQuery>,
) -> ActixResult<HttpResponse> {
    let options = RecommendOptions {
        top_k: clamp_top_k(query.top_k),
        lookup: if query.substring.unwrap_or(true) {
            LookupMode::Fuzzy
        } else {
            LookupMode::Exact
        },
        exclude_same_type: query.exclude_same_type,
    };
    match recommender.recommend_with(&query.title, &options) {
        Ok(result) => Ok(recommendations_response(&result)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn recommend_text(
    recommender: web::Data<Arc<Recommender>>,
    req: web::Json<TextRecommendRequest>,
) -> ActixResult<HttpResponse> {
    match recommender.recommend_by_text(&req.query, clamp_top_k(req.top_k)) {
        Ok(result) => Ok(recommendations_response(&result)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn search(
    recommender: web::Data<Arc<Recommender>>,
    query: web::Query<SearchQuery>,
) -> ActixResult<HttpResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    match recommender.search(&query.q, limit) {
        Ok(hits) => Ok(HttpResponse::Ok().json(serde_json::json!({ "result": hits }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn get_title(
    recommender: web::Data<Arc<Recommender>>,
    path: web::Path<usize>,
) -> ActixResult<HttpResponse> {
    let row = path.into_inner();
    match recommender.record(row) {
        Ok(record) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "row": row,
            "result": record,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}
