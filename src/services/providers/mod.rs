/// Movie metadata provider abstraction
///
/// Every catalog lookup (search, rails, similar titles, detail panels) goes
/// through a `MovieProvider`. TMDB is the only implementation; the trait is the
/// seam the recommendation and catalog services are tested against.
use crate::{
    error::AppResult,
    models::{
        TmdbCredits, TmdbMovie, TmdbMovieDetails, TmdbPage, TmdbPerson, TmdbPersonCredits,
        TmdbPersonDetails, TmdbVideos, TrendingCategory,
    },
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    /// Free-text movie search, first page only
    async fn search_movies(&self, query: &str) -> AppResult<Vec<TmdbMovie>>;

    /// Best match for an exact title, optionally narrowed by release year
    async fn find_movie(&self, title: &str, year: Option<i32>) -> AppResult<Option<TmdbMovie>>;

    /// One of the homepage rails
    async fn movie_list(&self, category: TrendingCategory) -> AppResult<Vec<TmdbMovie>>;

    async fn similar_movies(&self, movie_id: i64, page: u32) -> AppResult<TmdbPage<TmdbMovie>>;

    async fn movie_details(&self, movie_id: i64) -> AppResult<TmdbMovieDetails>;

    async fn movie_credits(&self, movie_id: i64) -> AppResult<TmdbCredits>;

    async fn movie_videos(&self, movie_id: i64) -> AppResult<TmdbVideos>;

    async fn person_details(&self, person_id: i64) -> AppResult<TmdbPersonDetails>;

    async fn person_credits(&self, person_id: i64) -> AppResult<TmdbPersonCredits>;

    async fn popular_people(&self, page: u32) -> AppResult<TmdbPage<TmdbPerson>>;

    /// Base URL that image paths are appended to
    fn image_base(&self) -> String;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
