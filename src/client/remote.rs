//! Backend calls made by the client
//!
//! Each store depends on the narrow trait it needs so tests can stand in for
//! the backend. `HttpRemote` implements all of them against the MoodFlix API.
use reqwest::{Client as HttpClient, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        AdminAnalytics, AuthSession, Credentials, Follow, Movie, NewReview, NewWatchlistItem,
        RecommendationRequest, RecommendationResponse, Review, ReviewUpdate, UserSummary,
        WatchlistItem,
    },
    services::{UserDataAction, UserDataRequest, UserDataResponse},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn recommend(&self, request: &RecommendationRequest) -> AppResult<Vec<Movie>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WatchlistApi: Send + Sync {
    async fn watchlist(&self, token: &str) -> AppResult<Vec<WatchlistItem>>;

    async fn add_to_watchlist(&self, token: &str, item: NewWatchlistItem)
        -> AppResult<WatchlistItem>;

    async fn remove_from_watchlist(&self, token: &str, movie_id: i64) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ReviewApi: Send + Sync {
    /// Reviews are public; no token needed
    async fn reviews_for_movie(&self, movie_id: i64) -> AppResult<Vec<Review>>;

    async fn add_review(&self, token: &str, review: NewReview) -> AppResult<Review>;

    async fn update_review(&self, token: &str, update: ReviewUpdate) -> AppResult<Review>;

    async fn delete_review(&self, token: &str, review_id: &str) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FollowApi: Send + Sync {
    async fn following(&self, token: &str) -> AppResult<Vec<UserSummary>>;

    async fn follow(&self, token: &str, user_id: Uuid) -> AppResult<Follow>;

    async fn unfollow(&self, token: &str, user_id: Uuid) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    async fn signup(&self, credentials: &Credentials) -> AppResult<AuthSession>;

    async fn login(&self, credentials: &Credentials) -> AppResult<AuthSession>;

    async fn logout(&self, token: &str) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AnalyticsApi: Send + Sync {
    async fn admin_analytics(&self, token: &str) -> AppResult<AdminAnalytics>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the MoodFlix API
#[derive(Clone)]
pub struct HttpRemote {
    http_client: HttpClient,
    base_url: String,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> AppResult<T> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| status.to_string());

        tracing::debug!(status = %status, error = %message, "API call failed");

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited(message),
            StatusCode::PAYMENT_REQUIRED => AppError::PaymentRequired(message),
            StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
            StatusCode::FORBIDDEN => AppError::Forbidden(message),
            StatusCode::CONFLICT => AppError::Conflict(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            StatusCode::BAD_REQUEST => AppError::InvalidInput(message),
            _ => AppError::ExternalApi(message),
        })
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> AppResult<T> {
        let mut request = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        self.send(request).await
    }

    async fn user_data<T: DeserializeOwned>(
        &self,
        token: Option<&str>,
        action: UserDataAction,
    ) -> AppResult<T> {
        let request = UserDataRequest::new(&action, token.map(str::to_string))?;
        let response: UserDataResponse = self
            .post("/functions/v1/user-data", None, &request)
            .await?;
        Ok(serde_json::from_value(response.data)?)
    }
}

/// Acknowledgement payloads are not needed by callers
#[derive(Deserialize)]
struct Ignored {}

#[async_trait::async_trait]
impl RecommendationSource for HttpRemote {
    async fn recommend(&self, request: &RecommendationRequest) -> AppResult<Vec<Movie>> {
        let response: RecommendationResponse = self
            .post("/functions/v1/recommendations", None, request)
            .await?;
        Ok(response.movies)
    }
}

#[async_trait::async_trait]
impl WatchlistApi for HttpRemote {
    async fn watchlist(&self, token: &str) -> AppResult<Vec<WatchlistItem>> {
        self.user_data(Some(token), UserDataAction::GetWatchlist).await
    }

    async fn add_to_watchlist(
        &self,
        token: &str,
        item: NewWatchlistItem,
    ) -> AppResult<WatchlistItem> {
        self.user_data(Some(token), UserDataAction::AddToWatchlist(item))
            .await
    }

    async fn remove_from_watchlist(&self, token: &str, movie_id: i64) -> AppResult<()> {
        let _: Ignored = self
            .user_data(Some(token), UserDataAction::RemoveFromWatchlist { movie_id })
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReviewApi for HttpRemote {
    async fn reviews_for_movie(&self, movie_id: i64) -> AppResult<Vec<Review>> {
        self.user_data(None, UserDataAction::GetReviews { movie_id })
            .await
    }

    async fn add_review(&self, token: &str, review: NewReview) -> AppResult<Review> {
        self.user_data(Some(token), UserDataAction::AddReview(review))
            .await
    }

    async fn update_review(&self, token: &str, update: ReviewUpdate) -> AppResult<Review> {
        self.user_data(Some(token), UserDataAction::UpdateReview(update))
            .await
    }

    async fn delete_review(&self, token: &str, review_id: &str) -> AppResult<()> {
        let _: Ignored = self
            .user_data(
                Some(token),
                UserDataAction::DeleteReview {
                    review_id: review_id.to_string(),
                },
            )
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl FollowApi for HttpRemote {
    async fn following(&self, token: &str) -> AppResult<Vec<UserSummary>> {
        self.user_data(Some(token), UserDataAction::GetFollowing)
            .await
    }

    async fn follow(&self, token: &str, user_id: Uuid) -> AppResult<Follow> {
        self.user_data(Some(token), UserDataAction::Follow { user_id })
            .await
    }

    async fn unfollow(&self, token: &str, user_id: Uuid) -> AppResult<()> {
        let _: Ignored = self
            .user_data(Some(token), UserDataAction::Unfollow { user_id })
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpRemote {
    async fn signup(&self, credentials: &Credentials) -> AppResult<AuthSession> {
        self.post("/auth/v1/signup", None, credentials).await
    }

    async fn login(&self, credentials: &Credentials) -> AppResult<AuthSession> {
        self.post("/auth/v1/login", None, credentials).await
    }

    async fn logout(&self, token: &str) -> AppResult<()> {
        let _: Ignored = self
            .post("/auth/v1/logout", Some(token), &serde_json::json!({}))
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AnalyticsApi for HttpRemote {
    async fn admin_analytics(&self, token: &str) -> AppResult<AdminAnalytics> {
        let request = self
            .http_client
            .get(format!("{}/admin/analytics", self.base_url))
            .bearer_auth(token);
        self.send(request).await
    }
}
