//! Reception open/close endpoints and the per-reception product listing.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use common::{PvzId, ReceptionId, Role};
use serde::Deserialize;
use storage::{Product, Reception, Storage};

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceptionRequest {
    pub pvz_id: PvzId,
}

/// POST /receptions: open a reception (employee only).
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(role): Extension<Role>,
    payload: Result<Json<CreateReceptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Reception>), ApiError> {
    let Json(req) = payload?;
    let reception = state.receptions.create_reception(req.pvz_id, role).await?;
    Ok((StatusCode::CREATED, Json(reception)))
}

/// POST /pvz/{pvzId}/close_last_reception: close the open reception.
#[tracing::instrument(skip(state))]
pub async fn close_last<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(role): Extension<Role>,
    Path(pvz_id): Path<String>,
) -> Result<Json<Reception>, ApiError> {
    let pvz_id: PvzId = parse_id(&pvz_id, "pvzId")?;
    let reception = state.receptions.close_last_reception(pvz_id, role).await?;
    Ok(Json(reception))
}

/// GET /receptions/{receptionId}/products: products oldest first.
#[tracing::instrument(skip(state))]
pub async fn products<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(reception_id): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let reception_id: ReceptionId = parse_id(&reception_id, "receptionId")?;
    let products = state.products.list_products(reception_id).await?;
    Ok(Json(products))
}
