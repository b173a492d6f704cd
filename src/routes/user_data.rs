use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Extension, Json};

use crate::{
    error::AppResult,
    middleware::{bearer_token, RequestId},
    routes::AppState,
    services::{UserDataRequest, UserDataResponse},
};

/// Handler for the user-data function
///
/// The session token may come in the body or as a bearer header; the body
/// wins.
pub async fn user_data(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(mut request): Json<UserDataRequest>,
) -> AppResult<Json<UserDataResponse>> {
    if request.token.is_none() {
        request.token = bearer_token(&headers);
    }

    tracing::debug!(request_id = %request_id, action = %request.action, "User data request");

    Ok(Json(state.user_data.handle(request).await?))
}
