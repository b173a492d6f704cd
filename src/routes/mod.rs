use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::repositories::{AccountRepository, AnalyticsRepository, UserDataRepository},
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{
        AnalyticsService, AuthService, CatalogService, LlmClient, MovieProvider,
        RecommendationService, UserDataService,
    },
};

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod recommendations;
pub mod user_data;

/// Shared application state
pub struct AppState {
    pub recommendations: RecommendationService,
    pub catalog: CatalogService,
    pub auth: Arc<AuthService>,
    pub user_data: UserDataService,
    pub analytics: AnalyticsService,
}

/// Backends the services are wired onto
pub struct Backends {
    pub llm: Arc<dyn LlmClient>,
    pub movies: Arc<dyn MovieProvider>,
    pub accounts: Arc<dyn AccountRepository>,
    pub user_data: Arc<dyn UserDataRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
}

impl AppState {
    pub fn new(backends: Backends, auth: AuthService) -> Self {
        let auth = Arc::new(auth);
        Self {
            recommendations: RecommendationService::new(backends.llm, backends.movies.clone()),
            catalog: CatalogService::new(backends.movies),
            user_data: UserDataService::new(auth.clone(), backends.user_data),
            analytics: AnalyticsService::new(backends.analytics),
            auth,
        }
    }

    /// Wires services with sessions lasting `session_ttl_hours`
    pub fn from_backends(backends: Backends, session_ttl_hours: i64) -> Self {
        let auth = AuthService::new(backends.accounts.clone(), session_ttl_hours);
        Self::new(backends, auth)
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/functions/v1", function_routes())
        .nest("/auth/v1", auth_routes())
        .route("/admin/analytics", get(admin::analytics))
        .with_state(state)
        // outermost first; the trace span reads the id set just outside it
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// Edge functions under /functions/v1
fn function_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route("/similar-movies", post(catalog::similar_movies))
        .route("/movie-details", post(catalog::movie_details))
        .route("/person-details", post(catalog::person_details))
        .route("/trending", post(catalog::trending))
        .route("/popular-actors", post(catalog::popular_actors))
        .route("/search", post(catalog::search))
        .route("/user-data", post(user_data::user_data))
}

fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
