use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{catalog::image_url, Movie, RecommendationRequest},
    services::{llm::LlmClient, providers::MovieProvider},
};

/// Movies requested from the model per page
pub const PAGE_SIZE: usize = 8;

const SYSTEM_PROMPT: &str = "You are a film expert who recommends movies that fit a viewer's mood. \
Answer with a JSON array only, no prose and no markdown.";

/// Movie as written by the model; every field except the title is optional
/// and loosely typed
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateMovie {
    title: String,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    rating: Option<Value>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default, alias = "mood_match", alias = "reason")]
    mood_match: Option<String>,
}

/// Generates mood-based recommendations
///
/// Asks the model for a page of movies that fit the mood and filters, drops
/// anything already shown in this session, then decorates each movie with its
/// TMDB poster and rating.
pub struct RecommendationService {
    llm: Arc<dyn LlmClient>,
    provider: Arc<dyn MovieProvider>,
}

impl RecommendationService {
    pub fn new(llm: Arc<dyn LlmClient>, provider: Arc<dyn MovieProvider>) -> Self {
        Self { llm, provider }
    }

    pub async fn recommend(&self, request: &RecommendationRequest) -> AppResult<Vec<Movie>> {
        if request.mood.trim().is_empty() {
            return Err(AppError::InvalidInput("Mood is required".to_string()));
        }

        let prompt = build_prompt(request);
        let text = self.llm.complete(SYSTEM_PROMPT, &prompt).await?;
        let candidates = parse_candidates(&text)?;
        let received = candidates.len();
        let candidates = drop_excluded(candidates, &request.previously_recommended);

        tracing::info!(
            mood = %request.mood,
            excluded = request.previously_recommended.len(),
            received,
            kept = candidates.len(),
            llm = self.llm.name(),
            "Model recommendations received"
        );

        Ok(self.enrich(candidates).await)
    }

    /// Looks up every candidate on the metadata provider in parallel.
    /// Lookup failures keep the model's own values.
    async fn enrich(&self, candidates: Vec<CandidateMovie>) -> Vec<Movie> {
        let base_id = Utc::now().timestamp_millis();
        let image_base = self.provider.image_base();

        let mut tasks = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let provider = Arc::clone(&self.provider);
            let title = candidate.title.clone();
            let year = candidate.year.as_ref().and_then(lenient_year);
            tasks.push(tokio::spawn(async move {
                provider.find_movie(&title, year).await
            }));
        }

        let mut movies = Vec::with_capacity(candidates.len());
        for (index, (candidate, task)) in candidates.into_iter().zip(tasks).enumerate() {
            let found = match task.await {
                Ok(Ok(found)) => found,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, title = %candidate.title, "Metadata lookup failed");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Metadata lookup task failed");
                    None
                }
            };

            let mut movie = Movie {
                id: base_id + index as i64,
                year: candidate.year.as_ref().and_then(lenient_year),
                rating: candidate.rating.as_ref().and_then(lenient_rating).unwrap_or(0.0),
                genre: candidate.genre.unwrap_or_default(),
                language: candidate.language.unwrap_or_default(),
                industry: candidate.industry.unwrap_or_default(),
                poster_url: None,
                mood_match: candidate.mood_match.unwrap_or_default(),
                tmdb_id: None,
                title: candidate.title,
            };

            if let Some(tmdb) = found {
                movie.tmdb_id = Some(tmdb.id);
                movie.poster_url = image_url(&image_base, "w500", tmdb.poster_path.as_deref());
                if tmdb.vote_average > 0.0 {
                    movie.rating = (tmdb.vote_average * 10.0).round() / 10.0;
                }
            }

            movies.push(movie);
        }

        movies
    }
}

fn build_prompt(request: &RecommendationRequest) -> String {
    let mut prompt = format!(
        "Recommend {} movies for someone who is feeling \"{}\".\n",
        PAGE_SIZE,
        request.mood.trim()
    );

    if !request.languages.is_empty() {
        prompt.push_str(&format!("Languages: {}.\n", request.languages.join(", ")));
    }
    if !request.genres.is_empty() {
        prompt.push_str(&format!("Genres: {}.\n", request.genres.join(", ")));
    }
    if !request.industries.is_empty() {
        prompt.push_str(&format!(
            "Film industries: {}.\n",
            request.industries.join(", ")
        ));
    }
    if let Some(runtime) = request.duration.runtime_hint() {
        prompt.push_str(&format!("Runtime: {}.\n", runtime));
    }
    if !request.previously_recommended.is_empty() {
        prompt.push_str(&format!(
            "Do NOT recommend any of these titles: {}.\n",
            request.previously_recommended.join(", ")
        ));
    }

    prompt.push_str(
        "Return a JSON array where each item has: title, year (number), rating (0-10), \
genre, language, industry, moodMatch (one sentence on why it fits the mood).",
    );
    prompt
}

/// Extracts the outermost JSON array from the model's reply
fn parse_candidates(text: &str) -> AppResult<Vec<CandidateMovie>> {
    let start = text.find('[');
    let end = text.rfind(']');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => {
            tracing::error!(response = %text, "No JSON array in model response");
            return Err(AppError::Parse(
                "No movie list found in model response".to_string(),
            ));
        }
    };

    serde_json::from_str(json).map_err(|e| {
        tracing::error!(error = %e, "Model response is not a movie array");
        AppError::Parse(format!("Invalid movie list in model response: {}", e))
    })
}

/// Drops titles in the exclusion list and repeats within the page,
/// comparing case-insensitively
fn drop_excluded(candidates: Vec<CandidateMovie>, excluded: &[String]) -> Vec<CandidateMovie> {
    let mut seen: HashSet<String> = excluded.iter().map(|t| normalize_title(t)).collect();
    candidates
        .into_iter()
        .filter(|c| !c.title.trim().is_empty() && seen.insert(normalize_title(&c.title)))
        .collect()
}

fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

fn lenient_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().map(|y| y as i32),
        Value::String(s) => s.trim().get(0..4).and_then(|y| y.parse().ok()),
        _ => None,
    }
}

fn lenient_rating(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.split('/').next().and_then(|r| r.trim().parse().ok()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DurationPreference, TmdbMovie};
    use crate::services::llm::MockLlmClient;
    use crate::services::providers::MockMovieProvider;
    use serde_json::json;

    fn provider_without_matches() -> MockMovieProvider {
        let mut provider = MockMovieProvider::new();
        provider
            .expect_image_base()
            .returning(|| "https://img.test".to_string());
        provider.expect_find_movie().returning(|_, _| Ok(None));
        provider
    }

    fn llm_returning(text: &'static str) -> MockLlmClient {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .times(1)
            .returning(move |_, _| Ok(text.to_string()));
        llm.expect_name().return_const("mock");
        llm
    }

    #[test]
    fn test_parse_candidates_ignores_surrounding_prose() {
        let text = "Sure! ```json\n[{\"title\": \"Paddington 2\", \"year\": 2017}]\n```";
        let candidates = parse_candidates(text).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Paddington 2");
    }

    #[test]
    fn test_parse_candidates_without_array_fails() {
        let result = parse_candidates("I cannot help with that.");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_parse_candidates_with_broken_json_fails() {
        let result = parse_candidates("[{\"title\": }]");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_drop_excluded_is_case_insensitive_and_dedups_page() {
        let candidates: Vec<CandidateMovie> = serde_json::from_value(json!([
            {"title": "Up"},
            {"title": "AMELIE"},
            {"title": "Big Fish"},
            {"title": "big fish"}
        ]))
        .unwrap();

        let kept = drop_excluded(candidates, &["Amelie".to_string()]);
        let titles: Vec<_> = kept.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Up", "Big Fish"]);
    }

    #[test]
    fn test_lenient_fields() {
        assert_eq!(lenient_year(&json!(1999)), Some(1999));
        assert_eq!(lenient_year(&json!("2004-05-01")), Some(2004));
        assert_eq!(lenient_year(&json!(null)), None);
        assert_eq!(lenient_rating(&json!(7.5)), Some(7.5));
        assert_eq!(lenient_rating(&json!("8.1/10")), Some(8.1));
    }

    #[test]
    fn test_prompt_mentions_filters_and_exclusions() {
        let request = RecommendationRequest::new("nostalgic")
            .with_languages(["Japanese"])
            .with_duration(DurationPreference::Short)
            .excluding(vec!["Spirited Away".to_string()]);

        let prompt = build_prompt(&request);
        assert!(prompt.contains("\"nostalgic\""));
        assert!(prompt.contains("Languages: Japanese."));
        assert!(prompt.contains("under 100 minutes"));
        assert!(prompt.contains("Do NOT recommend any of these titles: Spirited Away."));
        assert!(!prompt.contains("Genres:"));
    }

    #[tokio::test]
    async fn test_blank_mood_is_rejected_without_calling_model() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete().never();

        let service =
            RecommendationService::new(Arc::new(llm), Arc::new(MockMovieProvider::new()));
        let result = service.recommend(&RecommendationRequest::new("  ")).await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_recommend_assigns_sequential_ids_and_keeps_model_values() {
        let llm = llm_returning(
            r#"[{"title": "Up", "year": 2009, "rating": 8.2, "genre": "Animation", "moodMatch": "Joyful"},
                {"title": "Amelie", "year": 2001, "rating": 8.3, "genre": "Romance"}]"#,
        );

        let service =
            RecommendationService::new(Arc::new(llm), Arc::new(provider_without_matches()));
        let movies = service.recommend(&RecommendationRequest::new("happy")).await.unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[1].id, movies[0].id + 1);
        assert_eq!(movies[0].mood_match, "Joyful");
        assert_eq!(movies[0].rating, 8.2);
        assert_eq!(movies[1].poster_url, None);
    }

    #[tokio::test]
    async fn test_recommend_filters_previously_recommended() {
        let llm = llm_returning(r#"[{"title": "Up"}, {"title": "Heat"}]"#);
        let service =
            RecommendationService::new(Arc::new(llm), Arc::new(provider_without_matches()));

        let request = RecommendationRequest::new("happy").excluding(vec!["up".to_string()]);
        let movies = service.recommend(&request).await.unwrap();

        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Heat");
    }

    #[tokio::test]
    async fn test_recommend_uses_provider_poster_and_rating() {
        let llm = llm_returning(r#"[{"title": "Up", "year": 2009, "rating": 5}]"#);

        let mut provider = MockMovieProvider::new();
        provider
            .expect_image_base()
            .returning(|| "https://img.test".to_string());
        provider
            .expect_find_movie()
            .withf(|title, year| title.eq_ignore_ascii_case("Up") && *year == Some(2009))
            .returning(|_, _| {
                Ok(Some(TmdbMovie {
                    id: 14160,
                    title: "Up".to_string(),
                    overview: None,
                    release_date: Some("2009-05-28".to_string()),
                    poster_path: Some("/up.jpg".to_string()),
                    backdrop_path: None,
                    vote_average: 7.96,
                    popularity: 50.0,
                }))
            });

        let service = RecommendationService::new(Arc::new(llm), Arc::new(provider));
        let movies = service.recommend(&RecommendationRequest::new("happy")).await.unwrap();

        assert_eq!(movies[0].poster_url.as_deref(), Some("https://img.test/w500/up.jpg"));
        assert_eq!(movies[0].rating, 8.0);
        assert_eq!(movies[0].tmdb_id, Some(14160));
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_movie() {
        let llm = llm_returning(r#"[{"title": "Up", "rating": 8}]"#);

        let mut provider = MockMovieProvider::new();
        provider
            .expect_image_base()
            .returning(|| "https://img.test".to_string());
        provider
            .expect_find_movie()
            .returning(|_, _| Err(AppError::ExternalApi("down".to_string())));

        let service = RecommendationService::new(Arc::new(llm), Arc::new(provider));
        let movies = service.recommend(&RecommendationRequest::new("happy")).await.unwrap();

        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].rating, 8.0);
        assert_eq!(movies[0].tmdb_id, None);
    }

    #[tokio::test]
    async fn test_model_rate_limit_propagates() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .returning(|_, _| Err(AppError::RateLimited("slow down".to_string())));

        let service =
            RecommendationService::new(Arc::new(llm), Arc::new(MockMovieProvider::new()));
        let result = service.recommend(&RecommendationRequest::new("happy")).await;

        assert!(matches!(result, Err(AppError::RateLimited(_))));
    }
}
