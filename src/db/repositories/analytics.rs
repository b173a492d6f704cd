use uuid::Uuid;

use super::PgStore;
use crate::{
    error::AppResult,
    models::{DailyCount, MoodCount},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn count_users(&self) -> AppResult<i64>;

    async fn count_reviews(&self) -> AppResult<i64>;

    async fn count_watchlist_items(&self) -> AppResult<i64>;

    async fn count_follows(&self) -> AppResult<i64>;

    /// Most requested moods, most popular first
    async fn top_moods(&self, limit: i64) -> AppResult<Vec<MoodCount>>;

    /// Signups per day over the last `days` days, oldest first
    async fn daily_signups(&self, days: i32) -> AppResult<Vec<DailyCount>>;

    async fn record_mood(&self, mood: &str, user_id: Option<Uuid>) -> AppResult<()>;
}

impl PgStore {
    async fn count(&self, table_query: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(table_query)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait::async_trait]
impl AnalyticsRepository for PgStore {
    async fn count_users(&self) -> AppResult<i64> {
        self.count("SELECT COUNT(*) FROM users").await
    }

    async fn count_reviews(&self) -> AppResult<i64> {
        self.count("SELECT COUNT(*) FROM reviews").await
    }

    async fn count_watchlist_items(&self) -> AppResult<i64> {
        self.count("SELECT COUNT(*) FROM watchlist").await
    }

    async fn count_follows(&self) -> AppResult<i64> {
        self.count("SELECT COUNT(*) FROM follows").await
    }

    async fn top_moods(&self, limit: i64) -> AppResult<Vec<MoodCount>> {
        let moods = sqlx::query_as::<_, MoodCount>(
            r#"
            SELECT LOWER(mood) AS mood, COUNT(*) AS count
            FROM recommendation_events
            GROUP BY LOWER(mood)
            ORDER BY count DESC, mood ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(moods)
    }

    async fn daily_signups(&self, days: i32) -> AppResult<Vec<DailyCount>> {
        let counts = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT d::date AS day, COUNT(u.id) AS count
            FROM generate_series(CURRENT_DATE - ($1 - 1), CURRENT_DATE, INTERVAL '1 day') AS d
            LEFT JOIN users u ON u.created_at::date = d::date
            GROUP BY d
            ORDER BY d
            "#,
        )
        .bind(days)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn record_mood(&self, mood: &str, user_id: Option<Uuid>) -> AppResult<()> {
        sqlx::query("INSERT INTO recommendation_events (mood, user_id) VALUES ($1, $2)")
            .bind(mood)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
