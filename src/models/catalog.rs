use serde::{Deserialize, Serialize};

use super::tmdb::{release_year, TmdbMovie, TmdbPerson, TmdbPersonCredit};

/// Homepage rails served by the trending function
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrendingCategory {
    #[default]
    Trending,
    Popular,
    TopRated,
    NowPlaying,
    Upcoming,
}

impl TrendingCategory {
    /// TMDB path serving this rail
    pub fn tmdb_path(&self) -> &'static str {
        match self {
            TrendingCategory::Trending => "/trending/movie/week",
            TrendingCategory::Popular => "/movie/popular",
            TrendingCategory::TopRated => "/movie/top_rated",
            TrendingCategory::NowPlaying => "/movie/now_playing",
            TrendingCategory::Upcoming => "/movie/upcoming",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingCategory::Trending => "trending",
            TrendingCategory::Popular => "popular",
            TrendingCategory::TopRated => "top_rated",
            TrendingCategory::NowPlaying => "now_playing",
            TrendingCategory::Upcoming => "upcoming",
        }
    }
}

/// Movie card shown in rails, search and similar lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub rating: f64,
    pub year: Option<i32>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

impl MovieSummary {
    pub fn from_tmdb(movie: TmdbMovie, image_base: &str) -> Self {
        Self {
            id: movie.id,
            year: release_year(movie.release_date.as_deref()),
            poster_url: image_url(image_base, "w500", movie.poster_path.as_deref()),
            backdrop_url: image_url(image_base, "w1280", movie.backdrop_path.as_deref()),
            title: movie.title,
            overview: movie.overview,
            rating: movie.vote_average,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    pub character: Option<String>,
    pub profile_url: Option<String>,
}

/// Flattened movie detail panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub release_date: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<i32>,
    pub rating: f64,
    pub genres: Vec<String>,
    pub language: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub director: Option<String>,
    pub cast: Vec<CastMember>,
    pub trailer_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonCredit {
    pub movie_id: i64,
    pub title: String,
    pub character: Option<String>,
    pub year: Option<i32>,
    pub rating: f64,
    pub poster_url: Option<String>,
}

impl PersonCredit {
    pub fn from_tmdb(credit: TmdbPersonCredit, image_base: &str) -> Self {
        Self {
            movie_id: credit.id,
            year: release_year(credit.release_date.as_deref()),
            poster_url: image_url(image_base, "w342", credit.poster_path.as_deref()),
            title: credit.title,
            character: credit.character,
            rating: credit.vote_average,
        }
    }
}

/// Person detail panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonDetails {
    pub id: i64,
    pub name: String,
    pub biography: Option<String>,
    pub birthday: Option<String>,
    pub place_of_birth: Option<String>,
    pub known_for: Option<String>,
    pub profile_url: Option<String>,
    pub credits: Vec<PersonCredit>,
}

/// Entry of the popular-actors rail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub profile_url: Option<String>,
    pub known_for: Option<String>,
    pub popularity: f64,
}

impl Actor {
    pub fn from_tmdb(person: TmdbPerson, image_base: &str) -> Self {
        Self {
            id: person.id,
            profile_url: image_url(image_base, "w185", person.profile_path.as_deref()),
            name: person.name,
            known_for: person.known_for_department,
            popularity: person.popularity,
        }
    }
}

/// `{movies, hasMore}` page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoviePage {
    pub movies: Vec<MovieSummary>,
    pub has_more: bool,
}

/// `{actors, hasMore}` page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActorPage {
    pub actors: Vec<Actor>,
    pub has_more: bool,
}

/// Full CDN URL for a TMDB image path
pub fn image_url(base: &str, size: &str, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{}/{}{}", base.trim_end_matches('/'), size, p))
}
