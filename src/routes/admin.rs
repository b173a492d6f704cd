use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{
    error::AppResult, middleware::BearerToken, models::AdminAnalytics, routes::AppState,
};

/// Dashboard aggregates, admins only
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<AdminAnalytics>> {
    let caller = state.auth.authenticate(&token).await?;
    let view = state.analytics.dashboard(&caller).await?;

    tracing::info!(admin = %caller.username, users = view.total_users, "Analytics served");

    Ok(Json(view))
}
