use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::BearerToken,
    models::{AuthSession, Credentials},
    routes::AppState,
};

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> AppResult<(StatusCode, Json<AuthSession>)> {
    let session = state.auth.signup(credentials).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> AppResult<Json<AuthSession>> {
    Ok(Json(state.auth.login(credentials).await?))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> AppResult<Json<Value>> {
    state.auth.logout(&token).await?;
    Ok(Json(json!({ "success": true })))
}
