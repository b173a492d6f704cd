use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MoodCount {
    pub mood: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}

/// Admin dashboard view model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminAnalytics {
    pub total_users: i64,
    pub total_reviews: i64,
    pub total_watchlist_items: i64,
    pub total_follows: i64,
    pub top_moods: Vec<MoodCount>,
    pub daily_signups: Vec<DailyCount>,
    pub generated_at: DateTime<Utc>,
}
