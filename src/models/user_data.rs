use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{catalog::MovieSummary, movie::Movie};
use crate::error::{AppError, AppResult};

/// Movie saved to a user's watchlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub id: String,
    pub user_id: Uuid,
    pub movie_id: i64,
    pub title: String,
    pub poster_url: Option<String>,
    pub rating: Option<f64>,
    pub year: Option<i32>,
    pub added_at: DateTime<Utc>,
}

/// Payload of `add_to_watchlist`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewWatchlistItem {
    pub movie_id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl TryFrom<&Movie> for NewWatchlistItem {
    type Error = AppError;

    /// Keyed on the catalog id; the per-response `id` is not stable
    fn try_from(movie: &Movie) -> AppResult<Self> {
        Ok(Self {
            movie_id: movie.catalog_id()?,
            title: movie.title.clone(),
            poster_url: movie.poster_url.clone(),
            rating: Some(movie.rating),
            year: movie.year,
        })
    }
}

impl From<&MovieSummary> for NewWatchlistItem {
    fn from(movie: &MovieSummary) -> Self {
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            poster_url: movie.poster_url.clone(),
            rating: Some(movie.rating),
            year: movie.year,
        }
    }
}

/// A user's review of a movie, one per user and movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub user_id: Uuid,
    pub username: String,
    pub movie_id: i64,
    pub movie_title: String,
    pub rating: i16,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 10;

fn validate_rating(rating: i16) -> AppResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::InvalidInput(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(())
}

/// Payload of `add_review`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub movie_id: i64,
    pub movie_title: String,
    pub rating: i16,
    #[serde(default)]
    pub content: Option<String>,
}

impl NewReview {
    pub fn validate(&self) -> AppResult<()> {
        validate_rating(self.rating)
    }
}

/// Payload of `update_review`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUpdate {
    pub review_id: String,
    pub rating: i16,
    #[serde(default)]
    pub content: Option<String>,
}

impl ReviewUpdate {
    pub fn validate(&self) -> AppResult<()> {
        validate_rating(self.rating)
    }
}

/// Follow relation between two users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Public view of another user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
}
