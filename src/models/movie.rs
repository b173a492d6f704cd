use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Preferred runtime bucket for recommendations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurationPreference {
    Short,
    Medium,
    Long,
    #[default]
    Any,
}

impl DurationPreference {
    /// Runtime range phrased for the prompt, `None` when unconstrained
    pub fn runtime_hint(&self) -> Option<&'static str> {
        match self {
            DurationPreference::Short => Some("under 100 minutes"),
            DurationPreference::Medium => Some("between 100 and 140 minutes"),
            DurationPreference::Long => Some("over 140 minutes"),
            DurationPreference::Any => None,
        }
    }
}

/// Mood-based recommendation request, also the wire body of the
/// recommendation function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub mood: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub duration: DurationPreference,
    #[serde(default)]
    pub previously_recommended: Vec<String>,
}

impl RecommendationRequest {
    /// Creates a request for a mood with every filter left open
    pub fn new(mood: impl Into<String>) -> Self {
        Self {
            mood: mood.into(),
            ..Default::default()
        }
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = unique(languages);
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = unique(genres);
        self
    }

    pub fn with_industries<I, S>(mut self, industries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.industries = unique(industries);
        self
    }

    pub fn with_duration(mut self, duration: DurationPreference) -> Self {
        self.duration = duration;
        self
    }

    /// Copy of this request carrying `titles` as the exclusion list
    pub fn excluding(&self, titles: Vec<String>) -> Self {
        Self {
            previously_recommended: titles,
            ..self.clone()
        }
    }
}

/// Order-preserving dedup used for the set-valued filters
fn unique<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = value.into();
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// A recommended movie
///
/// `id` is assigned per response and is not stable across calls; the
/// title is the identity used for deduplication. `tmdb_id` is set when the
/// title was matched in the catalog and is the key for saving the movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub rating: f64,
    pub year: Option<i32>,
    pub genre: String,
    pub language: String,
    pub industry: String,
    pub poster_url: Option<String>,
    pub mood_match: String,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
}

impl Movie {
    /// Catalog id to save this movie under
    pub fn catalog_id(&self) -> AppResult<i64> {
        self.tmdb_id.ok_or_else(|| {
            AppError::InvalidInput(format!("{} has no catalog match to save", self.title))
        })
    }
}

/// Body returned by the recommendation function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RecommendationResponse {
    pub movies: Vec<Movie>,
}
