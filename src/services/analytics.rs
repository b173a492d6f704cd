use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::repositories::AnalyticsRepository,
    error::{AppError, AppResult},
    models::{AdminAnalytics, AuthenticatedUser},
};

const TOP_MOODS: i64 = 10;
const SIGNUP_WINDOW_DAYS: i32 = 7;

pub struct AnalyticsService {
    repo: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn AnalyticsRepository>) -> Self {
        Self { repo }
    }

    /// Aggregates the dashboard; any failing query fails the whole view
    pub async fn dashboard(&self, caller: &AuthenticatedUser) -> AppResult<AdminAnalytics> {
        if !caller.is_admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        let (
            total_users,
            total_reviews,
            total_watchlist_items,
            total_follows,
            top_moods,
            daily_signups,
        ) = tokio::try_join!(
            self.repo.count_users(),
            self.repo.count_reviews(),
            self.repo.count_watchlist_items(),
            self.repo.count_follows(),
            self.repo.top_moods(TOP_MOODS),
            self.repo.daily_signups(SIGNUP_WINDOW_DAYS),
        )?;

        Ok(AdminAnalytics {
            total_users,
            total_reviews,
            total_watchlist_items,
            total_follows,
            top_moods,
            daily_signups,
            generated_at: Utc::now(),
        })
    }

    /// Best effort; a failed write is logged and swallowed
    pub async fn record_mood(&self, mood: &str, user: Option<&AuthenticatedUser>) {
        let mood = mood.trim();
        if mood.is_empty() {
            return;
        }

        if let Err(e) = self.repo.record_mood(mood, user.map(|u| u.id)).await {
            tracing::warn!(error = %e, mood = %mood, "Failed to record mood");
        }
    }
}
