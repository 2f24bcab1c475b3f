//! Edge HTTP surface: geo-gated content API, calendar links, cache revalidation.

use crate::calendar::{google_calendar_link, CalendarEvent};
use crate::cms::{CachedFetcher, ContentFetcher};
use crate::config::Config;
use crate::error::ContentFetchError;
use crate::geo::{decide, geo_guard, GeoDecision, GeoPolicy};
use crate::i18n::Language;
use crate::routes::PageKey;
use crate::security::has_valid_secret;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub type SharedFetcher = Arc<CachedFetcher<Arc<dyn ContentFetcher>>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub content: SharedFetcher,
    pub geo: Arc<GeoPolicy>,
}

impl AppState {
    pub fn new(config: Config, fetcher: Arc<dyn ContentFetcher>) -> Self {
        let geo = Arc::new(GeoPolicy::from_config(&config));
        Self {
            config: Arc::new(config),
            content: Arc::new(CachedFetcher::new(fetcher)),
            geo,
        }
    }
}

/// JSON error body `{"error": "..."}` with a status code.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ContentFetchError> for ApiError {
    fn from(e: ContentFetchError) -> Self {
        if e.is_not_found() {
            ApiError::NotFound(e.to_string())
        } else {
            ApiError::Upstream(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    lang: Option<String>,
}

#[derive(Debug, Serialize)]
struct CalendarLinkResponse {
    url: String,
}

pub fn build_router(state: AppState) -> Router {
    let geo = Arc::clone(&state.geo);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/content", get(home_content_handler))
        .route("/api/content/*path", get(content_handler))
        .route("/api/calendar", get(calendar_handler))
        .route("/api/revalidate", post(revalidate_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(geo, geo_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn home_content_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ContentQuery>,
) -> Result<Response, ApiError> {
    serve_content(&state, &headers, "/", query).await
}

async fn content_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Result<Response, ApiError> {
    serve_content(&state, &headers, &path, query).await
}

async fn serve_content(
    state: &AppState,
    headers: &HeaderMap,
    path: &str,
    query: ContentQuery,
) -> Result<Response, ApiError> {
    let page = PageKey::from_path(path)
        .ok_or_else(|| ApiError::NotFound(format!("No page at '{}'", path)))?;

    let language = match query.lang.as_deref() {
        Some(code) => {
            Language::from_code(code).map_err(|e| ApiError::BadRequest(e.to_string()))?
        }
        None => state.config.default_language,
    };

    // The page route itself is gated by the middleware; the API path is not.
    if let Some(page_path) = page.path() {
        let country = state.geo.country(headers);
        if let GeoDecision::Redirect { .. } = decide(&state.geo, &page_path, country) {
            info!("Geo guard denied content for {}", page_path);
            return Err(ApiError::NotFound(format!("No page at '{}'", path)));
        }
    }

    let doc = state.content.get(&page, language).await?;
    Ok(Json(doc.as_ref()).into_response())
}

async fn calendar_handler(
    State(state): State<AppState>,
    Query(event): Query<CalendarEvent>,
) -> Result<Json<CalendarLinkResponse>, ApiError> {
    let url = google_calendar_link(&event, state.config.calendar_timezone.as_deref())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(CalendarLinkResponse { url }))
}

async fn revalidate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(secret) = state.config.revalidate_secret.as_deref() else {
        return Err(ApiError::NotFound("Not found".to_string()));
    };

    if !has_valid_secret(&headers, secret) {
        warn!("Rejected revalidation request with invalid secret");
        return Err(ApiError::Unauthorized);
    }

    state.content.invalidate_all();
    Ok(Json(json!({ "revalidated": true })))
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
