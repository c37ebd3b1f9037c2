//! HTTP handlers for the Tally API.

use crate::admin;
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tally_common::config::LimitsConfig;
use tally_common::{BulkKind, Counter, Error, Metric, RankEntry};
use tally_store::{BulkValue, CounterStore, PageRequest};
use tracing::error;

/// Application state shared across handlers
pub struct AppState {
    pub store: CounterStore,
    pub admin_token: Option<String>,
    pub limits: LimitsConfig,
}

/// JSON error responses carrying the taxonomy's status code
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.http_status_code();
        if code >= 500 {
            error!("Request failed: {}", self.0);
        }
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// One ranked/updated row on the wire
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDto {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub kind: &'static str,
    pub count: u64,
    pub updated_at: u64,
}

impl RowDto {
    fn from_counter(counter: &Counter, metric: Metric) -> Self {
        Self {
            id: counter.id.clone(),
            title: counter.title.clone(),
            file_name: counter.file_name.clone(),
            kind: metric.as_str(),
            count: counter.count(metric),
            updated_at: counter.updated_at,
        }
    }

    fn from_rank_entry(entry: &RankEntry, metric: Metric) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            file_name: entry.file_name.clone(),
            kind: metric.as_str(),
            count: entry.count,
            updated_at: entry.updated_at,
        }
    }
}

pub async fn health_check() -> Response {
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        r#"{"status":"healthy"}"#,
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitRequest {
    pub kind: Metric,
    pub id: String,
    pub title: Option<String>,
    pub file_name: Option<String>,
}

/// POST /api/hit - record one play or download event
pub async fn hit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HitRequest>,
) -> Result<Json<RowDto>, ApiError> {
    let counter = state.store.record_hit(
        &req.id,
        req.kind,
        req.title.as_deref(),
        req.file_name.as_deref(),
    )?;
    Ok(Json(RowDto::from_counter(&counter, req.kind)))
}

#[derive(Debug, Deserialize)]
pub struct CountsRequest {
    pub kind: BulkKind,
    pub ids: Vec<String>,
}

/// POST /api/counts - bulk count lookup
pub async fn bulk_counts(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CountsRequest>,
) -> Result<Json<Value>, ApiError> {
    let counts = state.store.bulk_get(&req.ids, req.kind)?;
    let mut map = serde_json::Map::with_capacity(counts.len());
    for row in counts {
        let value = match row.value {
            BulkValue::Single(n) => Value::from(n),
            BulkValue::Both { play, download } => json!({ "play": play, "download": download }),
        };
        map.insert(row.id, value);
    }
    Ok(Json(json!({ "counts": map })))
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub metric: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopResponse {
    pub rows: Vec<RowDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<usize>,
}

/// GET /api/top - paginated leaderboard for one metric
pub async fn top_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopQuery>,
) -> Result<Json<TopResponse>, ApiError> {
    let metric = metric_param(query.metric.as_deref())?;
    let request = PageRequest::normalize(
        lenient_usize(query.limit.as_deref()),
        query.cursor.as_deref(),
        &state.limits,
    );
    let page = state.store.top_page(metric, request);
    Ok(Json(TopResponse {
        rows: page
            .rows
            .iter()
            .map(|e| RowDto::from_rank_entry(e, metric))
            .collect(),
        next_cursor: page.next_cursor,
    }))
}

/// Parse the metric query param, defaulting to download
fn metric_param(raw: Option<&str>) -> Result<Metric, Error> {
    match raw {
        None | Some("") => Ok(Metric::Download),
        Some(raw) => raw.parse(),
    }
}

/// Lenient numeric parse: malformed input clamps to the default later
/// instead of failing the request
fn lenient_usize(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse().ok())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetMode {
    All,
    Id,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub mode: ResetMode,
    pub id: Option<String>,
}

/// POST /api/reset - admin-only destructive reset
pub async fn reset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ResetRequest>,
) -> Result<Json<Value>, ApiError> {
    let presented = headers
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok());
    admin::authorize(state.admin_token.as_deref(), presented)?;

    match req.mode {
        ResetMode::All => {
            let deleted = state.store.reset_all()?;
            Ok(Json(json!({ "deletedCount": deleted })))
        }
        ResetMode::Id => {
            let id = req
                .id
                .as_deref()
                .ok_or_else(|| Error::invalid_argument("reset mode 'id' requires an id"))?;
            state.store.reset_one(id)?;
            Ok(Json(json!({ "ok": true })))
        }
    }
}
