use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{RecommendationRequest, RecommendationResponse},
    routes::AppState,
    services::recommendations,
};

/// Handler for the recommendation endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let user_id = validate_user_id(request.user_id)?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        catalog_size = state.catalog.len(),
        "Processing recommendation request"
    );

    let recommendations = recommendations::recommend_for_user(
        state.store.clone(),
        state.recommender.clone(),
        state.catalog.clone(),
        &user_id,
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        count = recommendations.len(),
        "Recommendations completed"
    );

    Ok(Json(RecommendationResponse {
        status: "success",
        recommendations,
    }))
}

/// User ids are used as document path segments, so they must be non-blank and contain no '/'
fn validate_user_id(user_id: Option<String>) -> AppResult<String> {
    let user_id = user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("UserID not provided".to_string()))?;

    if user_id.contains('/') {
        return Err(AppError::InvalidInput("UserID must not contain '/'".to_string()));
    }

    Ok(user_id)
}
