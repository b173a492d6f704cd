use uuid::Uuid;

use super::{conflict_or, PgStore};
use crate::{
    error::{AppError, AppResult},
    models::{Follow, NewReview, NewWatchlistItem, Review, ReviewUpdate, UserSummary, WatchlistItem},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserDataRepository: Send + Sync {
    /// Newest first
    async fn list_watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistItem>>;

    /// A movie already on the list is `Conflict`
    async fn add_watchlist_item(
        &self,
        user_id: Uuid,
        item: NewWatchlistItem,
    ) -> AppResult<WatchlistItem>;

    /// Returns whether a row was removed
    async fn remove_watchlist_item(&self, user_id: Uuid, movie_id: i64) -> AppResult<bool>;

    async fn reviews_for_movie(&self, movie_id: i64) -> AppResult<Vec<Review>>;

    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>>;

    /// A second review of the same movie is `Conflict`
    async fn add_review(&self, user_id: Uuid, review: NewReview) -> AppResult<Review>;

    /// `None` when the review does not exist or belongs to someone else
    async fn update_review(&self, user_id: Uuid, update: ReviewUpdate)
        -> AppResult<Option<Review>>;

    async fn delete_review(&self, user_id: Uuid, review_id: Uuid) -> AppResult<bool>;

    async fn user_exists(&self, user_id: Uuid) -> AppResult<bool>;

    /// Following someone twice is `Conflict`
    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<Follow>;

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<bool>;

    async fn following(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>>;

    async fn followers(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>>;
}

const REVIEW_COLUMNS: &str = "r.id::text AS id, r.user_id, u.username, r.movie_id, r.movie_title, \
r.rating, r.content, r.created_at, r.updated_at";

#[async_trait::async_trait]
impl UserDataRepository for PgStore {
    async fn list_watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistItem>> {
        let items = sqlx::query_as::<_, WatchlistItem>(
            r#"
            SELECT id::text AS id, user_id, movie_id, title, poster_url, rating, year, added_at
            FROM watchlist
            WHERE user_id = $1
            ORDER BY added_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn add_watchlist_item(
        &self,
        user_id: Uuid,
        item: NewWatchlistItem,
    ) -> AppResult<WatchlistItem> {
        sqlx::query_as::<_, WatchlistItem>(
            r#"
            INSERT INTO watchlist (user_id, movie_id, title, poster_url, rating, year)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id::text AS id, user_id, movie_id, title, poster_url, rating, year, added_at
            "#,
        )
        .bind(user_id)
        .bind(item.movie_id)
        .bind(&item.title)
        .bind(&item.poster_url)
        .bind(item.rating)
        .bind(item.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "Movie is already in your watchlist"))
    }

    async fn remove_watchlist_item(&self, user_id: Uuid, movie_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM watchlist WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reviews_for_movie(&self, movie_id: i64) -> AppResult<Vec<Review>> {
        let query = format!(
            "SELECT {} FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.movie_id = $1 ORDER BY r.created_at DESC",
            REVIEW_COLUMNS
        );

        let reviews = sqlx::query_as::<_, Review>(&query)
            .bind(movie_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }

    async fn reviews_by_user(&self, user_id: Uuid) -> AppResult<Vec<Review>> {
        let query = format!(
            "SELECT {} FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.user_id = $1 ORDER BY r.created_at DESC",
            REVIEW_COLUMNS
        );

        let reviews = sqlx::query_as::<_, Review>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }

    async fn add_review(&self, user_id: Uuid, review: NewReview) -> AppResult<Review> {
        let query = format!(
            "WITH r AS ( \
                INSERT INTO reviews (user_id, movie_id, movie_title, rating, content) \
                VALUES ($1, $2, $3, $4, $5) RETURNING * \
             ) SELECT {} FROM r JOIN users u ON u.id = r.user_id",
            REVIEW_COLUMNS
        );

        sqlx::query_as::<_, Review>(&query)
            .bind(user_id)
            .bind(review.movie_id)
            .bind(&review.movie_title)
            .bind(review.rating)
            .bind(&review.content)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or(e, "You have already reviewed this movie"))
    }

    async fn update_review(
        &self,
        user_id: Uuid,
        update: ReviewUpdate,
    ) -> AppResult<Option<Review>> {
        let review_id = Uuid::parse_str(&update.review_id)
            .map_err(|_| AppError::InvalidInput("Invalid review id".to_string()))?;

        let query = format!(
            "WITH r AS ( \
                UPDATE reviews SET rating = $3, content = $4, updated_at = NOW() \
                WHERE id = $1 AND user_id = $2 RETURNING * \
             ) SELECT {} FROM r JOIN users u ON u.id = r.user_id",
            REVIEW_COLUMNS
        );

        let review = sqlx::query_as::<_, Review>(&query)
            .bind(review_id)
            .bind(user_id)
            .bind(update.rating)
            .bind(&update.content)
            .fetch_optional(&self.pool)
            .await?;

        Ok(review)
    }

    async fn delete_review(&self, user_id: Uuid, review_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1 AND user_id = $2")
            .bind(review_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn user_exists(&self, user_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<Follow> {
        sqlx::query_as::<_, Follow>(
            r#"
            INSERT INTO follows (follower_id, following_id)
            VALUES ($1, $2)
            RETURNING follower_id, following_id, created_at
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "You are already following this user"))
    }

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
                .bind(follower_id)
                .bind(following_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn following(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.display_name
            FROM follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn followers(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.display_name
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.following_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
