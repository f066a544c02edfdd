//! Product logging endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use common::{PvzId, Role};
use serde::Deserialize;
use storage::{Product, Storage};

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductRequest {
    #[serde(rename = "type")]
    pub product_type: String,
    pub pvz_id: PvzId,
}

/// POST /products: log a product against the open reception.
#[tracing::instrument(skip(state, payload))]
pub async fn add<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(role): Extension<Role>,
    payload: Result<Json<AddProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(req) = payload?;
    let product = state
        .products
        .add_product(req.pvz_id, &req.product_type, role)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// POST /pvz/{pvzId}/delete_last_product: remove the newest product.
#[tracing::instrument(skip(state))]
pub async fn delete_last<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(role): Extension<Role>,
    Path(pvz_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let pvz_id: PvzId = parse_id(&pvz_id, "pvzId")?;
    state.products.delete_last_product(pvz_id, role).await?;
    Ok(StatusCode::OK)
}
