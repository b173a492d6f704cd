use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Extension, Json};

use crate::{
    error::AppResult,
    middleware::{bearer_token, RequestId},
    models::{RecommendationRequest, RecommendationResponse},
    routes::AppState,
};

/// Handler for the recommendations function
///
/// Signing in is optional; a valid token only attributes the mood in
/// analytics.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        mood = %request.mood,
        excluded = request.previously_recommended.len(),
        "Processing recommendation request"
    );

    let movies = state.recommendations.recommend(&request).await?;

    let user = match bearer_token(&headers) {
        Some(token) => state.auth.authenticate(&token).await.ok(),
        None => None,
    };
    state.analytics.record_mood(&request.mood, user.as_ref()).await;

    tracing::info!(
        request_id = %request_id,
        count = movies.len(),
        "Recommendations completed"
    );

    Ok(Json(RecommendationResponse { movies }))
}
