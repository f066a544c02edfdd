//! Pickup-point registration and listing endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use common::Role;
use serde::Deserialize;
use storage::{DEFAULT_PAGE_SIZE, Pvz, Storage};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreatePvzRequest {
    pub city: String,
}

/// Raw listing parameters. Integers are parsed leniently; dates must be
/// RFC 3339.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPvzParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListPvzParams {
    fn page(&self) -> i64 {
        lenient_int(self.page.as_deref()).unwrap_or(1)
    }

    fn limit(&self) -> i64 {
        lenient_int(self.limit.as_deref()).unwrap_or(i64::from(DEFAULT_PAGE_SIZE))
    }
}

fn lenient_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse().ok())
}

fn parse_date(raw: Option<&str>, name: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    raw.filter(|v| !v.is_empty())
        .map(|v| {
            DateTime::parse_from_rfc3339(v)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| ApiError::BadRequest(format!("Invalid {name}: {e}")))
        })
        .transpose()
}

/// POST /pvz: register a pickup point (moderator only).
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(role): Extension<Role>,
    payload: Result<Json<CreatePvzRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Pvz>), ApiError> {
    let Json(req) = payload?;
    let pvz = state.pvz.create_pvz(&req.city, role).await?;
    Ok((StatusCode::CREATED, Json(pvz)))
}

/// GET /pvz: list pickup points newest first, optionally restricted to
/// those with a reception inside `[startDate, endDate]`.
#[tracing::instrument(skip(state))]
pub async fn list<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListPvzParams>,
) -> Result<Json<Vec<Pvz>>, ApiError> {
    let from = parse_date(params.start_date.as_deref(), "startDate")?;
    let to = parse_date(params.end_date.as_deref(), "endDate")?;

    let pvz = state
        .pvz
        .list_pvz(from, to, params.page(), params.limit())
        .await?;
    Ok(Json(pvz))
}
