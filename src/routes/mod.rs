use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    models::CatalogBook,
    services::{recommendations::Recommender, store::DocumentStore},
};

pub mod recommendations;

/// Shared, read-only state handed to every handler
pub struct AppState {
    pub catalog: Arc<Vec<CatalogBook>>,
    pub recommender: Arc<Recommender>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(
        catalog: Vec<CatalogBook>,
        recommender: Recommender,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            recommender: Arc::new(recommender),
            store,
        }
    }
}

/// Creates the application router with all routes and layers
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommend", post(recommendations::recommend))
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
