use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    db::repositories::UserDataRepository,
    error::{AppError, AppResult},
    models::{AuthenticatedUser, NewReview, NewWatchlistItem, ReviewUpdate},
    services::auth::AuthService,
};

/// Operations of the user-data function, tagged as `{action, data}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum UserDataAction {
    GetWatchlist,
    AddToWatchlist(NewWatchlistItem),
    #[serde(rename_all = "camelCase")]
    RemoveFromWatchlist { movie_id: i64 },
    #[serde(rename_all = "camelCase")]
    GetReviews { movie_id: i64 },
    GetMyReviews,
    AddReview(NewReview),
    UpdateReview(ReviewUpdate),
    #[serde(rename_all = "camelCase")]
    DeleteReview { review_id: String },
    #[serde(rename_all = "camelCase")]
    Follow { user_id: Uuid },
    #[serde(rename_all = "camelCase")]
    Unfollow { user_id: Uuid },
    GetFollowing,
    GetFollowers,
}

impl UserDataAction {
    /// Reading a movie's reviews is the only anonymous action
    pub fn requires_auth(&self) -> bool {
        !matches!(self, UserDataAction::GetReviews { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            UserDataAction::GetWatchlist => "get_watchlist",
            UserDataAction::AddToWatchlist(_) => "add_to_watchlist",
            UserDataAction::RemoveFromWatchlist { .. } => "remove_from_watchlist",
            UserDataAction::GetReviews { .. } => "get_reviews",
            UserDataAction::GetMyReviews => "get_my_reviews",
            UserDataAction::AddReview(_) => "add_review",
            UserDataAction::UpdateReview(_) => "update_review",
            UserDataAction::DeleteReview { .. } => "delete_review",
            UserDataAction::Follow { .. } => "follow",
            UserDataAction::Unfollow { .. } => "unfollow",
            UserDataAction::GetFollowing => "get_following",
            UserDataAction::GetFollowers => "get_followers",
        }
    }
}

/// Wire body `{action, token, data}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDataRequest {
    pub action: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl UserDataRequest {
    pub fn new(action: &UserDataAction, token: Option<String>) -> AppResult<Self> {
        let tagged = serde_json::to_value(action)?;
        Ok(Self {
            action: action.name().to_string(),
            token,
            data: tagged.get("data").cloned().unwrap_or(Value::Null),
        })
    }

    /// Decodes `action` + `data` into a typed action
    pub fn action(&self) -> AppResult<UserDataAction> {
        let mut tagged = json!({ "action": self.action });
        if !self.data.is_null() {
            tagged["data"] = self.data.clone();
        }
        serde_json::from_value(tagged).map_err(|e| {
            AppError::InvalidInput(format!("Invalid '{}' request: {}", self.action, e))
        })
    }
}

/// Successful reply `{success: true, data}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDataResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
}

/// Watchlist, review and follow persistence behind one endpoint
pub struct UserDataService {
    auth: Arc<AuthService>,
    repo: Arc<dyn UserDataRepository>,
}

impl UserDataService {
    pub fn new(auth: Arc<AuthService>, repo: Arc<dyn UserDataRepository>) -> Self {
        Self { auth, repo }
    }

    pub async fn handle(&self, request: UserDataRequest) -> AppResult<UserDataResponse> {
        let action = request.action()?;

        let user = match (&request.token, action.requires_auth()) {
            (Some(token), _) => Some(self.auth.authenticate(token).await?),
            (None, true) => {
                return Err(AppError::Unauthorized(
                    "Please sign in to continue".to_string(),
                ))
            }
            (None, false) => None,
        };

        tracing::info!(
            action = action.name(),
            user_id = ?user.as_ref().map(|u| u.id),
            "Handling user data request"
        );

        let data = self.dispatch(action, user).await?;
        Ok(UserDataResponse {
            success: true,
            data,
        })
    }

    async fn dispatch(
        &self,
        action: UserDataAction,
        user: Option<AuthenticatedUser>,
    ) -> AppResult<Value> {
        let signed_in = || {
            user.as_ref()
                .ok_or_else(|| AppError::Unauthorized("Please sign in to continue".to_string()))
        };

        let value = match action {
            UserDataAction::GetReviews { movie_id } => {
                serde_json::to_value(self.repo.reviews_for_movie(movie_id).await?)?
            }
            UserDataAction::GetWatchlist => {
                let user = signed_in()?;
                serde_json::to_value(self.repo.list_watchlist(user.id).await?)?
            }
            UserDataAction::AddToWatchlist(item) => {
                let user = signed_in()?;
                if item.title.trim().is_empty() {
                    return Err(AppError::InvalidInput("Movie title is required".to_string()));
                }
                serde_json::to_value(self.repo.add_watchlist_item(user.id, item).await?)?
            }
            UserDataAction::RemoveFromWatchlist { movie_id } => {
                let user = signed_in()?;
                if !self.repo.remove_watchlist_item(user.id, movie_id).await? {
                    return Err(AppError::NotFound(
                        "Movie is not in your watchlist".to_string(),
                    ));
                }
                json!({ "movieId": movie_id })
            }
            UserDataAction::GetMyReviews => {
                let user = signed_in()?;
                serde_json::to_value(self.repo.reviews_by_user(user.id).await?)?
            }
            UserDataAction::AddReview(review) => {
                let user = signed_in()?;
                review.validate()?;
                serde_json::to_value(self.repo.add_review(user.id, review).await?)?
            }
            UserDataAction::UpdateReview(update) => {
                let user = signed_in()?;
                update.validate()?;
                let review = self
                    .repo
                    .update_review(user.id, update)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;
                serde_json::to_value(review)?
            }
            UserDataAction::DeleteReview { review_id } => {
                let user = signed_in()?;
                let id = Uuid::parse_str(&review_id)
                    .map_err(|_| AppError::InvalidInput("Invalid review id".to_string()))?;
                if !self.repo.delete_review(user.id, id).await? {
                    return Err(AppError::NotFound("Review not found".to_string()));
                }
                json!({ "reviewId": review_id })
            }
            UserDataAction::Follow { user_id } => {
                let user = signed_in()?;
                if user_id == user.id {
                    return Err(AppError::InvalidInput(
                        "You cannot follow yourself".to_string(),
                    ));
                }
                if !self.repo.user_exists(user_id).await? {
                    return Err(AppError::NotFound("User not found".to_string()));
                }
                serde_json::to_value(self.repo.follow(user.id, user_id).await?)?
            }
            UserDataAction::Unfollow { user_id } => {
                let user = signed_in()?;
                if !self.repo.unfollow(user.id, user_id).await? {
                    return Err(AppError::NotFound(
                        "You are not following this user".to_string(),
                    ));
                }
                json!({ "userId": user_id })
            }
            UserDataAction::GetFollowing => {
                let user = signed_in()?;
                serde_json::to_value(self.repo.following(user.id).await?)?
            }
            UserDataAction::GetFollowers => {
                let user = signed_in()?;
                serde_json::to_value(self.repo.followers(user.id).await?)?
            }
        };

        Ok(value)
    }
}
