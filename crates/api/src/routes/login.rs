//! Dummy login: issues a role token without credentials.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use common::Role;
use serde::{Deserialize, Serialize};
use storage::Storage;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct DummyLoginRequest {
    pub role: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /dummyLogin: issue a token for `employee` or `moderator`.
#[tracing::instrument(skip(state, payload))]
pub async fn dummy_login<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<DummyLoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(req) = payload?;
    let role: Role = req
        .role
        .parse()
        .map_err(|e: common::UnknownRole| ApiError::BadRequest(e.to_string()))?;

    let token = state.tokens.issue(role)?;
    tracing::info!(%role, "token issued");
    Ok(Json(TokenResponse { token }))
}
