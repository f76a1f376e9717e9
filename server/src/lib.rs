use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use modda_core::persist::{load_index, load_labels, IndexPaths};
use modda_core::query::DEFAULT_LIMIT;
use modda_core::tokenizer::extract_keywords;
use modda_core::SearchIndex;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    /// Source category filter (file stem of the statute), e.g. "mehnat".
    pub cat: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// "keyword" (default) or "doc": treat `q` as a pasted order/resolution
    /// text and auto-extract search keywords from it.
    pub mode: Option<String>,
}
fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_keywords: Option<Vec<String>>,
    pub results: Vec<ResultRow>,
}

#[derive(Serialize)]
pub struct ResultRow {
    pub doc_id: u32,
    pub source: String,
    pub source_label: String,
    pub clause_label: Option<String>,
    pub title: String,
    pub snippet: String,
    pub score: f32,
}

/// Process-scoped handle injected into every handler. The index itself is an
/// immutable snapshot behind an Arc; reload swaps the Arc, so in-flight
/// queries keep the snapshot they started with.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<RwLock<Arc<SearchIndex>>>,
    pub labels: Arc<HashMap<String, String>>,
    pub index_dir: PathBuf,
    pub admin_token: Option<String>,
}

impl AppState {
    fn snapshot(&self) -> Arc<SearchIndex> {
        self.index.read().clone()
    }

    fn label_for(&self, source: &str) -> String {
        self.labels.get(source).cloned().unwrap_or_else(|| source.to_string())
    }
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let paths = IndexPaths::new(&index_dir);
    let index = load_index(&paths)?;
    let labels = load_labels(&paths)?;
    tracing::info!(docs = index.docs.len(), sources = index.sources.len(), "index loaded");
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState {
        index: Arc::new(RwLock::new(Arc::new(index))),
        labels: Arc::new(labels),
        index_dir: PathBuf::from(&index_dir),
        admin_token,
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/article/:doc_id", get(article_handler))
        .route("/reload", post(reload_handler))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let index = state.snapshot();
    let cat = params.cat.as_deref().filter(|c| !c.is_empty());
    let limit = params.limit.clamp(1, 100);

    let (hits, used_keywords) = if params.mode.as_deref() == Some("doc") {
        // Document mode: pull keywords out of the pasted text and take the
        // first one that matches anything.
        let keywords = extract_keywords(&params.q, 6);
        let mut found = Vec::new();
        for kw in &keywords {
            let hits = index.search(kw, cat, limit);
            if !hits.is_empty() {
                found = hits;
                break;
            }
        }
        (found, Some(keywords))
    } else {
        (index.search(&params.q, cat, limit), None)
    };

    let results: Vec<ResultRow> = hits
        .into_iter()
        .map(|h| {
            let source_label = state.label_for(&h.source);
            ResultRow {
                doc_id: h.doc_id,
                source: h.source,
                source_label,
                clause_label: h.clause_label,
                title: h.title,
                snippet: h.snippet,
                score: h.score,
            }
        })
        .collect();

    Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_hits: results.len(),
        used_keywords,
        results,
    })
}

pub async fn article_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<u32>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let index = state.snapshot();
    match index.docs.get(doc_id as usize) {
        Some(doc) => Ok(Json(serde_json::json!({
            "doc_id": doc_id,
            "id": doc.id,
            "source": doc.source,
            "source_label": state.label_for(&doc.source),
            "clause_label": doc.clause_label,
            "title": doc.title,
            "text": doc.text,
        }))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn reload_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let paths = IndexPaths::new(&state.index_dir);
    let fresh = load_index(&paths)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {e}")))?;
    let docs = fresh.docs.len();
    *state.index.write() = Arc::new(fresh);
    tracing::info!(docs, "index reloaded");
    Ok(Json(serde_json::json!({ "status": "ok", "docs": docs })))
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
