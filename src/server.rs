use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::{Catalog, CatalogError, CatalogStats, CategoryListing, FoodRecord};

const FRONTEND_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:5173"];
const DEFAULT_LIMIT: usize = 20;

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        AppState { catalog: Arc::new(catalog) }
    }
}

struct ApiError(CatalogError);

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            CatalogError::EmptyQuery => StatusCode::BAD_REQUEST,
            CatalogError::UnknownCategory(_) | CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct PageParams {
    #[serde(default)]
    offset: usize,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    category: Option<String>,
    limit: Option<usize>,
}

pub fn build_router(state: AppState) -> Router {
    let origins = FRONTEND_ORIGINS.map(HeaderValue::from_static);
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/foods", get(list_foods))
        .route("/api/foods/search", get(search_foods))
        .route("/api/foods/category/:category", get(foods_by_category))
        .route("/api/foods/:id", get(food_by_id))
        .route("/api/categories", get(categories))
        .route("/api/stats", get(stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(catalog: Catalog, bind: &str) -> Result<()> {
    let app = build_router(AppState::new(catalog));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Serving catalog on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await.context("server shutdown")?;
    Ok(())
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "🎉 欢迎使用卡路里小助手 API!",
        "description": "可爱的食物热量查询API",
        "total_foods": state.catalog.len(),
    }))
}

async fn list_foods(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Json<Vec<FoodRecord>> {
    Json(owned(state.catalog.list(params.offset, limit_or(params.limit, None))))
}

async fn search_foods(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<FoodRecord>>, ApiError> {
    let hits = state.catalog.search(
        &params.q,
        params.category.as_deref(),
        limit_or(params.limit, Some(DEFAULT_LIMIT)),
    )?;
    Ok(Json(owned(hits)))
}

async fn foods_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<FoodRecord>>, ApiError> {
    let hits = state.catalog.by_category(
        &category,
        params.offset,
        limit_or(params.limit, Some(DEFAULT_LIMIT)),
    )?;
    Ok(Json(owned(hits)))
}

async fn food_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FoodRecord>, ApiError> {
    Ok(Json(state.catalog.get(&id)?.clone()))
}

async fn categories(State(state): State<AppState>) -> Json<CategoryListing> {
    Json(state.catalog.categories())
}

async fn stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(state.catalog.stats())
}

/// `limit=0` lifts the cap; an absent limit takes the endpoint default.
fn limit_or(limit: Option<usize>, default: Option<usize>) -> Option<usize> {
    match limit {
        Some(0) => None,
        Some(n) => Some(n),
        None => default,
    }
}

fn owned(records: Vec<&FoodRecord>) -> Vec<FoodRecord> {
    records.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::catalog::tests::sample;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn app() -> Router {
        build_router(AppState::new(sample()))
    }

    #[tokio::test]
    async fn root_reports_total() {
        let (status, body) = get_json(app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_foods"], 5);
    }

    #[tokio::test]
    async fn list_with_pagination() {
        let (_, body) = get_json(app(), "/api/foods?offset=1&limit=2").await;
        let names: Vec<&str> = body.as_array().unwrap().iter().map(|f| f["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["可乐", "巧克力"]);
    }

    #[tokio::test]
    async fn zero_limit_means_no_limit() {
        let (_, body) = get_json(app(), "/api/foods?limit=0").await;
        assert_eq!(body.as_array().unwrap().len(), 5);
        let (_, body) = get_json(app(), "/api/foods/category/dairy?limit=0").await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        let (_, body) = get_json(app(), "/api/foods/search?q=%E5%A5%B6&limit=0").await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_search_is_bad_request() {
        let (status, body) = get_json(app(), "/api/foods/search?q=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let (status, _) = get_json(app(), "/api/foods/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_with_category() {
        let uri = "/api/foods/search?q=%E5%A5%B6&category=dairy";
        let (status, body) = get_json(app(), uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["category"], "dairy");
    }

    #[tokio::test]
    async fn unknown_category_and_id_are_not_found() {
        let (status, _) = get_json(app(), "/api/foods/category/pizza").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = get_json(app(), "/api/foods/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("99"));

        let (status, body) = get_json(app(), "/api/foods/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "巧克力");
    }

    #[tokio::test]
    async fn categories_and_stats() {
        let (_, body) = get_json(app(), "/api/categories").await;
        assert_eq!(body["total"], 5);
        assert_eq!(body["categories"].as_array().unwrap().len(), 9);

        let (_, body) = get_json(app(), "/api/stats").await;
        assert_eq!(body["total_foods"], 5);
        assert_eq!(body["calories_stats"]["max"], 520);
        assert_eq!(body["category_distribution"]["dairy"], 2);

        let empty = build_router(AppState::new(Catalog::default()));
        let (_, body) = get_json(empty, "/api/stats").await;
        assert_eq!(body["total_foods"], 0);
        assert!(body.get("calories_stats").is_none());
    }
}
