use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use scour_core::config::CrawlConfig;
use scour_core::crawler::{CrawlStats, Crawler};
use scour_core::error::EngineError;
use scour_core::fetch::Fetcher;
use scour_core::manager::IndexManager;
use scour_core::updater::UpdateSender;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<IndexManager>,
    pub updates: UpdateSender,
    pub fetcher: Arc<dyn Fetcher>,
    pub crawl_config: CrawlConfig,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize {
    10
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f64,
    pub title: String,
    pub url: String,
}

#[derive(Deserialize)]
pub struct CrawlRequest {
    pub seeds: Vec<String>,
    /// Optional override of the configured page cap for this run.
    pub max_pages: Option<usize>,
}

pub fn build_app(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler).post(search_post_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/crawl", post(crawl_handler))
        .route("/index/save", post(save_handler))
        .with_state(state)
        .layer(cors)
}

fn error_response(err: EngineError) -> (StatusCode, String) {
    let status = match &err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn run_search(state: &AppState, params: SearchParams) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let hits = state.manager.search(&params.q).map_err(error_response)?;
    let total_hits = hits.len();
    let k = params.k.clamp(1, 100);
    let results = hits
        .into_iter()
        .take(k)
        .map(|h| SearchHit {
            doc_id: h.document.id,
            score: h.score,
            title: h.document.title,
            url: h.document.url,
        })
        .collect();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_hits,
        results,
    }))
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    run_search(&state, params)
}

pub async fn search_post_handler(
    State(state): State<AppState>,
    Json(params): Json<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    run_search(&state, params)
}

pub async fn crawl_handler(
    State(state): State<AppState>,
    Json(req): Json<CrawlRequest>,
) -> Result<Json<CrawlStats>, (StatusCode, String)> {
    let mut config = state.crawl_config.clone();
    if let Some(max_pages) = req.max_pages {
        config.max_pages = max_pages;
    }
    let crawler = Arc::new(Crawler::new(
        Arc::clone(&state.fetcher),
        state.updates.clone(),
        config,
    ));
    let stats = crawler.run(req.seeds).await.map_err(error_response)?;
    Ok(Json(stats))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<u32>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let doc = state.manager.document(doc_id).map_err(error_response)?;
    Ok(Json(serde_json::json!({
        "doc_id": doc.id,
        "title": doc.title,
        "url": doc.url,
        "token_count": doc.tokens.len(),
    })))
}

pub async fn save_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    state.manager.save().map_err(error_response)?;
    Ok(Json(serde_json::json!({
        "saved": true,
        "documents": state.manager.document_count(),
    })))
}
