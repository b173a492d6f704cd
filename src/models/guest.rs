use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{catalog::MovieSummary, movie::Movie};
use crate::error::{AppError, AppResult};

/// Movie inside a guest collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMovie {
    pub movie_id: i64,
    pub title: String,
    pub poster_url: Option<String>,
    pub rating: Option<f64>,
    pub year: Option<i32>,
    pub added_at: DateTime<Utc>,
}

impl TryFrom<&Movie> for CollectionMovie {
    type Error = AppError;

    fn try_from(movie: &Movie) -> AppResult<Self> {
        Ok(Self {
            movie_id: movie.catalog_id()?,
            title: movie.title.clone(),
            poster_url: movie.poster_url.clone(),
            rating: Some(movie.rating),
            year: movie.year,
            added_at: Utc::now(),
        })
    }
}

impl From<&MovieSummary> for CollectionMovie {
    fn from(movie: &MovieSummary) -> Self {
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            poster_url: movie.poster_url.clone(),
            rating: Some(movie.rating),
            year: movie.year,
            added_at: Utc::now(),
        }
    }
}

/// Named list of movies kept in local storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub movies: Vec<CollectionMovie>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    pub fn contains(&self, movie_id: i64) -> bool {
        self.movies.iter().any(|m| m.movie_id == movie_id)
    }
}

/// Movie the guest marked as watched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryItem {
    pub id: String,
    pub movie_id: i64,
    pub title: String,
    pub poster_url: Option<String>,
    pub mood: Option<String>,
    pub watched_at: DateTime<Utc>,
}

/// Guest profile kept in local storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuestProfile {
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub favorite_moods: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for GuestProfile {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            display_name: "Movie Lover".to_string(),
            bio: None,
            avatar_url: None,
            favorite_genres: Vec::new(),
            favorite_moods: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial profile edit; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub favorite_genres: Option<Vec<String>>,
    pub favorite_moods: Option<Vec<String>>,
}
