#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use moodflix_api::{
    db::repositories::{AccountRepository, AnalyticsRepository, UserDataRepository},
    error::{AppError, AppResult},
    models::{
        AuthenticatedUser, DailyCount, Follow, MoodCount, NewReview, NewWatchlistItem, Review,
        ReviewUpdate, TmdbCredits, TmdbMovie, TmdbMovieDetails, TmdbPage, TmdbPerson,
        TmdbPersonCredits, TmdbPersonDetails, TmdbVideos, TrendingCategory, User, UserSummary,
        WatchlistItem,
    },
    routes::{create_router, AppState, Backends},
    services::{AuthService, LlmClient, MovieProvider},
};

pub const IMAGE_BASE: &str = "https://img.test";

/// Language model replaying queued answers; `[]` once the queue is empty
#[derive(Default)]
pub struct FakeLlm {
    replies: Mutex<VecDeque<AppResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn push_reply(&self, reply: AppResult<String>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn push_titles(&self, titles: &[&str]) {
        let movies: Vec<_> = titles
            .iter()
            .map(|t| {
                serde_json::json!({
                    "title": t,
                    "year": 2000,
                    "rating": 7.0,
                    "genre": "Drama",
                    "language": "English",
                    "industry": "Hollywood",
                    "moodMatch": "It just fits."
                })
            })
            .collect();
        let text = format!("Here you go:\n{}", serde_json::to_string(&movies).unwrap());
        self.push_reply(Ok(text));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for FakeLlm {
    async fn complete(&self, _system: &str, prompt: &str) -> AppResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("[]".to_string()))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn tmdb_movie(id: i64, title: &str) -> TmdbMovie {
    TmdbMovie {
        id,
        title: title.to_string(),
        overview: Some(format!("{} overview", title)),
        release_date: Some("2000-05-01".to_string()),
        poster_path: Some(format!("/{}.jpg", id)),
        backdrop_path: None,
        vote_average: 8.04,
        popularity: 10.0,
    }
}

/// Canned catalog: every title is found, lists are fixed
#[derive(Default)]
pub struct FakeCatalog;

#[async_trait::async_trait]
impl MovieProvider for FakeCatalog {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<TmdbMovie>> {
        Ok(vec![tmdb_movie(1, query)])
    }

    async fn find_movie(&self, title: &str, _year: Option<i32>) -> AppResult<Option<TmdbMovie>> {
        Ok(Some(tmdb_movie(title.len() as i64, title)))
    }

    async fn movie_list(&self, category: TrendingCategory) -> AppResult<Vec<TmdbMovie>> {
        Ok(vec![
            tmdb_movie(10, &format!("{} one", category.as_str())),
            tmdb_movie(11, &format!("{} two", category.as_str())),
        ])
    }

    async fn similar_movies(&self, _movie_id: i64, page: u32) -> AppResult<TmdbPage<TmdbMovie>> {
        Ok(TmdbPage {
            page,
            results: vec![tmdb_movie(20 + page as i64, "Similar")],
            total_pages: 2,
            total_results: 2,
        })
    }

    async fn movie_details(&self, movie_id: i64) -> AppResult<TmdbMovieDetails> {
        if movie_id == 404 {
            return Err(AppError::NotFound("Movie not found".to_string()));
        }
        Ok(TmdbMovieDetails {
            id: movie_id,
            title: "Heat".to_string(),
            overview: None,
            release_date: Some("1995-12-15".to_string()),
            poster_path: None,
            backdrop_path: None,
            vote_average: 7.9,
            runtime: Some(170),
            genres: vec![],
            tagline: None,
            original_language: Some("en".to_string()),
            imdb_id: None,
        })
    }

    async fn movie_credits(&self, _movie_id: i64) -> AppResult<TmdbCredits> {
        Ok(TmdbCredits {
            cast: vec![],
            crew: vec![],
        })
    }

    async fn movie_videos(&self, _movie_id: i64) -> AppResult<TmdbVideos> {
        Ok(TmdbVideos { results: vec![] })
    }

    async fn person_details(&self, person_id: i64) -> AppResult<TmdbPersonDetails> {
        Ok(TmdbPersonDetails {
            id: person_id,
            name: "Al Pacino".to_string(),
            biography: None,
            birthday: None,
            place_of_birth: None,
            profile_path: None,
            known_for_department: Some("Acting".to_string()),
        })
    }

    async fn person_credits(&self, _person_id: i64) -> AppResult<TmdbPersonCredits> {
        Ok(TmdbPersonCredits { cast: vec![] })
    }

    async fn popular_people(&self, page: u32) -> AppResult<TmdbPage<TmdbPerson>> {
        Ok(TmdbPage {
            page,
            results: vec![TmdbPerson {
                id: 1158,
                name: "Al Pacino".to_string(),
                profile_path: None,
                popularity: 50.0,
                known_for_department: Some("Acting".to_string()),
            }],
            total_pages: 1,
            total_results: 1,
        })
    }

    fn image_base(&self) -> String {
        IMAGE_BASE.to_string()
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: HashMap<Uuid, (Uuid, DateTime<Utc>)>,
    watchlist: Vec<WatchlistItem>,
    reviews: Vec<Review>,
    follows: Vec<Follow>,
    moods: Vec<(String, Option<Uuid>)>,
}

/// In-memory stand-in for Postgres with the same uniqueness rules
#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
}

impl MemoryDb {
    pub fn promote_to_admin(&self, username: &str) {
        let mut tables = self.tables.lock().unwrap();
        for user in tables.users.iter_mut().filter(|u| u.username == username) {
            user.is_admin = true;
        }
    }

    pub fn recorded_moods(&self) -> Vec<String> {
        self.tables
            .lock()
            .unwrap()
            .moods
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    fn username(tables: &Tables, user_id: Uuid) -> String {
        tables
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn summary(tables: &Tables, user_id: Uuid) -> Option<UserSummary> {
        tables.users.iter().find(|u| u.id == user_id).map(|u| UserSummary {
            id: u.id,
            username: u.username.clone(),
            display_name: u.display_name.clone(),
        })
    }
}

#[async_trait::async_trait]
impl AccountRepository for MemoryDb {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> AppResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == email || u.username == username) {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            display_name: Some(username.to_string()),
            is_admin: false,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        token: Uuid,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.tables
            .lock()
            .unwrap()
            .sessions
            .insert(token, (user_id, expires_at));
        Ok(())
    }

    async fn find_session_user(&self, token: Uuid) -> AppResult<Option<AuthenticatedUser>> {
        let tables = self.tables.lock().unwrap();
        let Some((user_id, expires_at)) = tables.sessions.get(&token) else {
            return Ok(None);
        };
        if *expires_at <= Utc::now() {
            return Ok(None);
        }
        Ok(tables
            .users
            .iter()
            .find(|u| u.id == *user_id)
            .map(|u| AuthenticatedUser {
                id: u.id,
                username: u.username.clone(),
                is_admin: u.is_admin,
            }))
    }

    async fn delete_session(&self, token: Uuid) -> AppResult<()> {
        self.tables.lock().unwrap().sessions.remove(&token);
        Ok(())
    }

    async fn purge_expired_sessions(&self, user_id: Uuid) -> AppResult<u64> {
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let before = tables.sessions.len();
        tables
            .sessions
            .retain(|_, (owner, expires_at)| !(*owner == user_id && *expires_at <= now));
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[async_trait::async_trait]
impl UserDataRepository for MemoryDb {
    async fn list_watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistItem>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .watchlist
            .iter()
            .rev()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_watchlist_item(
        &self,
        user_id: Uuid,
        item: NewWatchlistItem,
    ) -> AppResult<WatchlistItem> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .watchlist
            .iter()
            .any(|i| i.user_id == user_id && i.movie_id == item.movie_id)
        {
            return Err(AppError::Conflict(
                "Movie is already in your watchlist".to_string(),
            ));
        }
        let stored = WatchlistItem {
            id: Uuid::new_v4().to_string(),
            user_id,
            movie_id: item.movie_id,
            title: item.title,
            poster_url: item.poster_url,
            rating: item.rating,
            year: item.year,
            added_at: Utc::now(),
        };
        tables.watchlist.push(stored.clone());
        Ok(stored)
    }

    async fn remove_watchlist_item(&self, user_id: Uuid, movie_id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.watchlist.len();
        tables
            .watchlist
            .retain(|i| !(i.user_id == user_id && i.movie_id == movie_id));
        Ok(tables.watchlist.len() < before)
    }

    async fn reviews_for_movie(&self, movie_id: i64) -> AppResult<Vec<Review>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .reviews
            .iter()
            .rev()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect())
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .reviews
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_review(&self, user_id: Uuid, review: NewReview) -> AppResult<Review> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .reviews
            .iter()
            .any(|r| r.user_id == user_id && r.movie_id == review.movie_id)
        {
            return Err(AppError::Conflict(
                "You have already reviewed this movie".to_string(),
            ));
        }
        let now = Utc::now();
        let stored = Review {
            id: Uuid::new_v4().to_string(),
            user_id,
            username: Self::username(&tables, user_id),
            movie_id: review.movie_id,
            movie_title: review.movie_title,
            rating: review.rating,
            content: review.content,
            created_at: now,
            updated_at: now,
        };
        tables.reviews.push(stored.clone());
        Ok(stored)
    }

    async fn update_review(
        &self,
        user_id: Uuid,
        update: ReviewUpdate,
    ) -> AppResult<Option<Review>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(review) = tables
            .reviews
            .iter_mut()
            .find(|r| r.id == update.review_id && r.user_id == user_id)
        else {
            return Ok(None);
        };
        review.rating = update.rating;
        review.content = update.content;
        review.updated_at = Utc::now();
        Ok(Some(review.clone()))
    }

    async fn delete_review(&self, user_id: Uuid, review_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.reviews.len();
        let id = review_id.to_string();
        tables
            .reviews
            .retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(tables.reviews.len() < before)
    }

    async fn user_exists(&self, user_id: Uuid) -> AppResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().any(|u| u.id == user_id))
    }

    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<Follow> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id)
        {
            return Err(AppError::Conflict(
                "You are already following this user".to_string(),
            ));
        }
        let follow = Follow {
            follower_id,
            following_id,
            created_at: Utc::now(),
        };
        tables.follows.push(follow.clone());
        Ok(follow)
    }

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.follower_id == follower_id && f.following_id == following_id));
        Ok(tables.follows.len() < before)
    }

    async fn following(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .follows
            .iter()
            .rev()
            .filter(|f| f.follower_id == user_id)
            .filter_map(|f| Self::summary(&tables, f.following_id))
            .collect())
    }

    async fn followers(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .follows
            .iter()
            .rev()
            .filter(|f| f.following_id == user_id)
            .filter_map(|f| Self::summary(&tables, f.follower_id))
            .collect())
    }
}

#[async_trait::async_trait]
impl AnalyticsRepository for MemoryDb {
    async fn count_users(&self) -> AppResult<i64> {
        Ok(self.tables.lock().unwrap().users.len() as i64)
    }

    async fn count_reviews(&self) -> AppResult<i64> {
        Ok(self.tables.lock().unwrap().reviews.len() as i64)
    }

    async fn count_watchlist_items(&self) -> AppResult<i64> {
        Ok(self.tables.lock().unwrap().watchlist.len() as i64)
    }

    async fn count_follows(&self) -> AppResult<i64> {
        Ok(self.tables.lock().unwrap().follows.len() as i64)
    }

    async fn top_moods(&self, limit: i64) -> AppResult<Vec<MoodCount>> {
        let tables = self.tables.lock().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for (mood, _) in &tables.moods {
            *counts.entry(mood.to_lowercase()).or_default() += 1;
        }
        let mut moods: Vec<_> = counts
            .into_iter()
            .map(|(mood, count)| MoodCount { mood, count })
            .collect();
        moods.sort_by(|a, b| b.count.cmp(&a.count).then(a.mood.cmp(&b.mood)));
        moods.truncate(limit as usize);
        Ok(moods)
    }

    async fn daily_signups(&self, days: i32) -> AppResult<Vec<DailyCount>> {
        let tables = self.tables.lock().unwrap();
        let today = Utc::now().date_naive();
        Ok((0..days)
            .rev()
            .filter_map(|offset| today.checked_sub_days(chrono::Days::new(offset as u64)))
            .map(|day: NaiveDate| DailyCount {
                day,
                count: tables
                    .users
                    .iter()
                    .filter(|u| u.created_at.date_naive() == day)
                    .count() as i64,
            })
            .collect())
    }

    async fn record_mood(&self, mood: &str, user_id: Option<Uuid>) -> AppResult<()> {
        self.tables
            .lock()
            .unwrap()
            .moods
            .push((mood.to_string(), user_id));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub llm: Arc<FakeLlm>,
    pub db: Arc<MemoryDb>,
}

impl TestApp {
    pub fn new() -> Self {
        let llm = Arc::new(FakeLlm::default());
        let db = Arc::new(MemoryDb::default());

        let backends = Backends {
            llm: llm.clone(),
            movies: Arc::new(FakeCatalog),
            accounts: db.clone(),
            user_data: db.clone(),
            analytics: db.clone(),
        };
        let auth = AuthService::new(db.clone(), 24).with_bcrypt_cost(4);
        let state = Arc::new(AppState::new(backends, auth));

        Self {
            router: create_router(state),
            llm,
            db,
        }
    }
}
