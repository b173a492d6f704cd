/// TMDB API provider
///
/// Wraps the v3 REST API. Every lookup is read-through cached in Redis with a
/// TTL matched to how quickly the data changes: rails refresh hourly, detail
/// panels daily.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        tmdb::release_year, TmdbCredits, TmdbMovie, TmdbMovieDetails, TmdbPage, TmdbPerson,
        TmdbPersonCredits, TmdbPersonDetails, TmdbVideos, TrendingCategory,
    },
    services::providers::MovieProvider,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const LIST_CACHE_TTL: u64 = 3600; // 1 hour
const DETAILS_CACHE_TTL: u64 = 86400; // 1 day
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_url: String,
    cache: Cache,
}

impl TmdbProvider {
    pub fn new(
        cache: Cache,
        api_key: String,
        api_url: String,
        image_url: String,
    ) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Internal("TMDB API key cannot be empty".to_string()));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_url,
            cache,
        })
    }

    /// GET `path` with the API key and `params`, decoding the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => {
                return Err(AppError::ExternalApi(
                    "TMDB API key is invalid or missing".to_string(),
                ))
            }
            StatusCode::NOT_FOUND => {
                return Err(AppError::NotFound(format!("TMDB resource not found: {}", path)))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AppError::RateLimited(
                    "TMDB request quota exhausted".to_string(),
                ))
            }
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::ExternalApi(format!(
                    "TMDB API returned status {}: {}",
                    s, body
                )));
            }
            _ => {}
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, path = %path, "Failed to deserialize TMDB response");
            AppError::Parse(format!("TMDB response from {}: {}", path, e))
        })
    }
}

#[async_trait::async_trait]
impl MovieProvider for TmdbProvider {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<TmdbMovie>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Search(query.to_string()),
            LIST_CACHE_TTL,
            async move {
                let page: TmdbPage<TmdbMovie> = self
                    .get_json("/search/movie", &[("query", query.to_string())])
                    .await?;

                tracing::info!(
                    query = %query,
                    results = page.results.len(),
                    provider = "tmdb",
                    "Movie search completed"
                );

                Ok::<_, AppError>(page.results)
            }
        )
    }

    async fn find_movie(&self, title: &str, year: Option<i32>) -> AppResult<Option<TmdbMovie>> {
        cached!(
            self.cache,
            CacheKey::Lookup(title.to_string(), year),
            DETAILS_CACHE_TTL,
            async move {
                let mut params = vec![("query", title.to_string())];
                if let Some(y) = year {
                    params.push(("year", y.to_string()));
                }

                let page: TmdbPage<TmdbMovie> = self.get_json("/search/movie", &params).await?;
                Ok::<_, AppError>(best_match(page.results, title, year))
            }
        )
    }

    async fn movie_list(&self, category: TrendingCategory) -> AppResult<Vec<TmdbMovie>> {
        cached!(
            self.cache,
            CacheKey::Trending(category.as_str().to_string()),
            LIST_CACHE_TTL,
            async move {
                let page: TmdbPage<TmdbMovie> = self.get_json(category.tmdb_path(), &[]).await?;
                Ok::<_, AppError>(page.results)
            }
        )
    }

    async fn similar_movies(&self, movie_id: i64, page: u32) -> AppResult<TmdbPage<TmdbMovie>> {
        cached!(
            self.cache,
            CacheKey::Similar(movie_id as u64, page),
            LIST_CACHE_TTL,
            self.get_json::<TmdbPage<TmdbMovie>>(
                &format!("/movie/{}/similar", movie_id),
                &[("page", page.to_string())],
            )
        )
    }

    async fn movie_details(&self, movie_id: i64) -> AppResult<TmdbMovieDetails> {
        cached!(
            self.cache,
            CacheKey::MovieDetails(movie_id as u64),
            DETAILS_CACHE_TTL,
            self.get_json::<TmdbMovieDetails>(&format!("/movie/{}", movie_id), &[])
        )
    }

    async fn movie_credits(&self, movie_id: i64) -> AppResult<TmdbCredits> {
        cached!(
            self.cache,
            CacheKey::MovieCredits(movie_id as u64),
            DETAILS_CACHE_TTL,
            self.get_json::<TmdbCredits>(&format!("/movie/{}/credits", movie_id), &[])
        )
    }

    async fn movie_videos(&self, movie_id: i64) -> AppResult<TmdbVideos> {
        cached!(
            self.cache,
            CacheKey::MovieVideos(movie_id as u64),
            DETAILS_CACHE_TTL,
            self.get_json::<TmdbVideos>(&format!("/movie/{}/videos", movie_id), &[])
        )
    }

    async fn person_details(&self, person_id: i64) -> AppResult<TmdbPersonDetails> {
        cached!(
            self.cache,
            CacheKey::PersonDetails(person_id as u64),
            DETAILS_CACHE_TTL,
            self.get_json::<TmdbPersonDetails>(&format!("/person/{}", person_id), &[])
        )
    }

    async fn person_credits(&self, person_id: i64) -> AppResult<TmdbPersonCredits> {
        cached!(
            self.cache,
            CacheKey::PersonCredits(person_id as u64),
            DETAILS_CACHE_TTL,
            self.get_json::<TmdbPersonCredits>(
                &format!("/person/{}/movie_credits", person_id),
                &[]
            )
        )
    }

    async fn popular_people(&self, page: u32) -> AppResult<TmdbPage<TmdbPerson>> {
        cached!(
            self.cache,
            CacheKey::PopularPeople(page),
            LIST_CACHE_TTL,
            self.get_json::<TmdbPage<TmdbPerson>>("/person/popular", &[("page", page.to_string())])
        )
    }

    fn image_base(&self) -> String {
        self.image_url.clone()
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

/// Picks the search result whose title matches exactly (case-insensitive),
/// preferring one released in `year`, falling back to TMDB's top hit
fn best_match(results: Vec<TmdbMovie>, title: &str, year: Option<i32>) -> Option<TmdbMovie> {
    let wanted = title.trim().to_lowercase();
    let mut exact = results
        .iter()
        .filter(|m| m.title.trim().to_lowercase() == wanted)
        .cloned()
        .collect::<Vec<_>>();

    if let Some(y) = year {
        if let Some(pos) = exact
            .iter()
            .position(|m| release_year(m.release_date.as_deref()) == Some(y))
        {
            return Some(exact.swap_remove(pos));
        }
    }

    if !exact.is_empty() {
        return Some(exact.swap_remove(0));
    }

    results.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn movie(id: i64, title: &str, date: &str) -> TmdbMovie {
        TmdbMovie {
            id,
            title: title.to_string(),
            overview: None,
            release_date: Some(date.to_string()),
            poster_path: None,
            backdrop_path: None,
            vote_average: 7.0,
            popularity: 1.0,
        }
    }

    fn create_test_provider(api_url: &str) -> TmdbProvider {
        TmdbProvider::new(
            Cache::disabled(),
            "test_key".to_string(),
            api_url.to_string(),
            "https://image.tmdb.org/t/p".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = TmdbProvider::new(
            Cache::disabled(),
            "  ".to_string(),
            "http://test.local".to_string(),
            "http://img.local".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_best_match_prefers_exact_title_and_year() {
        let results = vec![
            movie(1, "Dune: Part Two", "2024-02-27"),
            movie(2, "Dune", "1984-12-14"),
            movie(3, "Dune", "2021-09-15"),
        ];

        let found = best_match(results, "dune", Some(2021)).unwrap();
        assert_eq!(found.id, 3);
    }

    #[test]
    fn test_best_match_falls_back_to_first_result() {
        let results = vec![movie(7, "The Thing", "1982-06-25")];
        let found = best_match(results, "Thing, The", None).unwrap();
        assert_eq!(found.id, 7);

        assert!(best_match(vec![], "Nothing", None).is_none());
    }

    #[tokio::test]
    async fn test_search_movies_sends_api_key_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(query_param("api_key", "test_key"))
            .and(query_param("query", "inception"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "results": [{"id": 27205, "title": "Inception", "vote_average": 8.4}],
                "total_pages": 1,
                "total_results": 1
            })))
            .mount(&server)
            .await;

        let provider = create_test_provider(&server.uri());
        let results = provider.search_movies("inception").await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 27205);
    }

    #[tokio::test]
    async fn test_search_movies_rejects_blank_query() {
        let provider = create_test_provider("http://test.local");
        let result = provider.search_movies("   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_not_found_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = create_test_provider(&server.uri());
        let result = provider.movie_details(999).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_too_many_requests_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/popular"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = create_test_provider(&server.uri());
        let result = provider.movie_list(TrendingCategory::Popular).await;
        assert!(matches!(result, Err(AppError::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/person/popular"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let provider = create_test_provider(&server.uri());
        let result = provider.popular_people(1).await;
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[tokio::test]
    async fn test_similar_movies_passes_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/27205/similar"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 2,
                "results": [{"id": 1, "title": "Interstellar"}],
                "total_pages": 5,
                "total_results": 100
            })))
            .mount(&server)
            .await;

        let provider = create_test_provider(&server.uri());
        let page = provider.similar_movies(27205, 2).await.unwrap();
        assert_eq!(page.page, 2);
        assert!(page.has_more());
    }
}
