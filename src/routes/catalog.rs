use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{ActorPage, MovieDetails, MoviePage, MovieSummary, PersonDetails, TrendingCategory},
    routes::AppState,
};

fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarMoviesRequest {
    pub movie_id: i64,
    #[serde(default = "first_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetailsRequest {
    pub movie_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDetailsRequest {
    pub person_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendingRequest {
    #[serde(default)]
    pub category: TrendingCategory,
}

#[derive(Debug, Deserialize)]
pub struct PopularActorsRequest {
    #[serde(default = "first_page")]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoviesResponse {
    pub movies: Vec<MovieSummary>,
}

pub async fn similar_movies(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SimilarMoviesRequest>,
) -> AppResult<Json<MoviePage>> {
    let page = state
        .catalog
        .similar(request.movie_id, request.page)
        .await?;
    Ok(Json(page))
}

pub async fn movie_details(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MovieDetailsRequest>,
) -> AppResult<Json<MovieDetails>> {
    Ok(Json(state.catalog.movie_details(request.movie_id).await?))
}

pub async fn person_details(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PersonDetailsRequest>,
) -> AppResult<Json<PersonDetails>> {
    Ok(Json(state.catalog.person_details(request.person_id).await?))
}

pub async fn trending(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrendingRequest>,
) -> AppResult<Json<MoviesResponse>> {
    tracing::debug!(category = request.category.as_str(), "Fetching trending rail");
    let movies = state.catalog.trending(request.category).await?;
    Ok(Json(MoviesResponse { movies }))
}

pub async fn popular_actors(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PopularActorsRequest>,
) -> AppResult<Json<ActorPage>> {
    Ok(Json(state.catalog.popular_actors(request.page).await?))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> AppResult<Json<MoviesResponse>> {
    let movies = state.catalog.search(&request.query).await?;
    Ok(Json(MoviesResponse { movies }))
}
