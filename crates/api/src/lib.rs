//! HTTP API for pickup-point receptions.
//!
//! Provides REST endpoints for pickup-point registration, reception
//! lifecycle and product logging, guarded by role tokens, with structured
//! logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{ProductService, PvzService, ReceptionService};
use metrics_exporter_prometheus::PrometheusHandle;
use storage::Storage;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::TokenCodec;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Storage> {
    pub pvz: PvzService<S>,
    pub receptions: ReceptionService<S>,
    pub products: ProductService<S>,
    pub tokens: Arc<TokenCodec>,
}

impl<S: Storage + Clone> AppState<S> {
    /// Wires all services onto one store.
    pub fn new(store: S, tokens: TokenCodec) -> Self {
        Self {
            pvz: PvzService::new(store.clone()),
            receptions: ReceptionService::new(store.clone()),
            products: ProductService::new(store),
            tokens: Arc::new(tokens),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Storage + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let protected = Router::new()
        .route("/pvz", post(routes::pvz::create::<S>).get(routes::pvz::list::<S>))
        .route(
            "/pvz/{pvz_id}/close_last_reception",
            post(routes::receptions::close_last::<S>),
        )
        .route(
            "/pvz/{pvz_id}/delete_last_product",
            post(routes::products::delete_last::<S>),
        )
        .route("/receptions", post(routes::receptions::create::<S>))
        .route(
            "/receptions/{reception_id}/products",
            get(routes::receptions::products::<S>),
        )
        .route("/products", post(routes::products::add::<S>))
        .layer(axum::middleware::from_fn_with_state(
            state.tokens.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/dummyLogin", post(routes::login::dummy_login::<S>))
        .merge(protected)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
