//! HTTP source endpoint for content sync.
//!
//! Serves items of a [`MemorySite`] as transform-ready documents, the
//! shape [`SourceClient`](contentsync_sync::SourceClient) fetches and
//! [`pull`](contentsync_sync::pull) applies.

mod auth;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use contentsync_model::{ContentItem, SourceRepository};
use contentsync_site::MemorySite;
use contentsync_sync::PayloadEncoder;
use contentsync_types::{ContentId, normalize_slug, sanitize_key};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

pub use auth::Account;

/// Everything the endpoint needs to answer requests.
pub struct SourceState {
    pub site: Arc<MemorySite>,
    pub accounts: Vec<Account>,
    /// Accept credentials passed as query parameters.
    pub allow_query_auth: bool,
    /// Prefix all routes are nested under, e.g. `wp-json/sf-sync/v1`.
    pub api_path: String,
}

/// Body of a successful ping.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PingResponse {
    pub message: String,
    pub authenticated: bool,
}

/// Error body: a stable code and a human-readable message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

enum ApiError {
    Unauthorized,
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "valid credentials are required".to_string(),
            ),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
        };
        let body = ErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

type Params = Query<HashMap<String, String>>;

fn require_auth(state: &SourceState, headers: &HeaderMap, query: &Params) -> Result<(), ApiError> {
    match auth::authenticate(&state.accounts, headers, query, state.allow_query_auth) {
        Some(user) => {
            debug!("Authenticated request from {}", user);
            Ok(())
        }
        None => Err(ApiError::Unauthorized),
    }
}

async fn ping_handler(
    State(state): State<Arc<SourceState>>,
    headers: HeaderMap,
    query: Params,
) -> Result<Json<PingResponse>, ApiError> {
    require_auth(&state, &headers, &query)?;
    Ok(Json(PingResponse {
        message: "OK".to_string(),
        authenticated: true,
    }))
}

async fn by_id_handler(
    State(state): State<Arc<SourceState>>,
    Path((content_type, id)): Path<(String, String)>,
    headers: HeaderMap,
    query: Params,
) -> Result<Response, ApiError> {
    require_auth(&state, &headers, &query)?;
    let content_type = sanitize_key(&content_type);
    let item = ContentId::parse(&id)
        .ok()
        .and_then(|id| state.site.item(id))
        .filter(|item| item.content_type == content_type)
        .ok_or_else(|| ApiError::NotFound(format!("no {content_type} with ID {id}")))?;
    Ok(document_response(&state, &item))
}

async fn by_slug_handler(
    State(state): State<Arc<SourceState>>,
    Path((content_type, slug)): Path<(String, String)>,
    headers: HeaderMap,
    query: Params,
) -> Result<Response, ApiError> {
    require_auth(&state, &headers, &query)?;
    let content_type = sanitize_key(&content_type);
    let slug = normalize_slug(&slug);
    let item = state
        .site
        .item_by_slug(&slug, &content_type)
        .ok_or_else(|| ApiError::NotFound(format!("no {content_type} with slug {slug:?}")))?;
    Ok(document_response(&state, &item))
}

fn document_response(state: &SourceState, item: &ContentItem) -> Response {
    let doc = PayloadEncoder::new(state.site.as_ref()).document(item);
    debug!("Serving {} {} ({} fields)", item.content_type, item.id, doc.acf.len());
    Json(doc).into_response()
}

async fn fallback_handler() -> Response {
    let body = json!({"code": "rest_no_route", "message": "no route matches the request"});
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// Builds the source API router, with every route under `/{api_path}`.
pub fn build_router(state: Arc<SourceState>) -> Router {
    let api = Router::new()
        .route("/ping", get(ping_handler))
        .route("/post-type/{content_type}/{id}", get(by_id_handler))
        .route("/post-type/{content_type}/by-slug/{slug}", get(by_slug_handler));

    let prefix = state.api_path.trim_matches('/').to_string();
    let router = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&format!("/{prefix}"), api)
    };
    router.fallback(fallback_handler).with_state(state)
}
