use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{conflict_or, PgStore};
use crate::{
    error::AppResult,
    models::{AuthenticatedUser, User},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts a user; a taken username or email is `Conflict`
    async fn create_user(&self, username: &str, email: &str, password_hash: &str)
        -> AppResult<User>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn create_session(
        &self,
        user_id: Uuid,
        token: Uuid,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Owner of an unexpired session
    async fn find_session_user(&self, token: Uuid) -> AppResult<Option<AuthenticatedUser>>;

    async fn delete_session(&self, token: Uuid) -> AppResult<()>;

    /// Drops the user's expired sessions, returning how many went
    async fn purge_expired_sessions(&self, user_id: Uuid) -> AppResult<u64>;
}

#[derive(sqlx::FromRow)]
struct SessionUserRow {
    id: Uuid,
    username: String,
    is_admin: bool,
}

#[async_trait::async_trait]
impl AccountRepository for PgStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, display_name)
            VALUES ($1, $2, $3, $4, $2)
            RETURNING id, username, email, password_hash, display_name, is_admin, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or(e, "Username is already taken"))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, display_name, is_admin, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        token: Uuid,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_session_user(&self, token: Uuid) -> AppResult<Option<AuthenticatedUser>> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            r#"
            SELECT u.id, u.username, u.is_admin
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| AuthenticatedUser {
            id: r.id,
            username: r.username,
            is_admin: r.is_admin,
        }))
    }

    async fn delete_session(&self, token: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn purge_expired_sessions(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= NOW()")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
