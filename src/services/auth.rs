/// Account and session handling
///
/// Users sign in with a username; storage is keyed by a synthetic email derived
/// from it so the username never has to be an address. Passwords are bcrypt
/// hashed off the async runtime. Sessions are opaque UUID tokens with an expiry.
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    db::repositories::AccountRepository,
    error::{AppError, AppResult},
    models::{AuthSession, AuthenticatedUser, Credentials},
};

pub const EMAIL_DOMAIN: &str = "moodflix.local";
pub const MIN_PASSWORD_LEN: usize = 6;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 30;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=30;

/// Email address a username is stored under
pub fn synthetic_email(username: &str) -> String {
    format!("{}@{}", username, EMAIL_DOMAIN)
}

/// Lowercases and validates a username
pub fn normalize_username(raw: &str) -> AppResult<String> {
    let username = raw.trim().to_lowercase();

    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(AppError::InvalidInput(format!(
            "Username must be {} to {} characters",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::InvalidInput(
            "Username may only contain letters, numbers and underscores".to_string(),
        ));
    }

    Ok(username)
}

pub struct AuthService {
    repo: Arc<dyn AccountRepository>,
    session_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    /// A lifetime that is not a positive number of hours chrono can
    /// represent falls back to the default
    pub fn new(repo: Arc<dyn AccountRepository>, session_ttl_hours: i64) -> Self {
        let session_ttl = Duration::try_hours(session_ttl_hours)
            .filter(|ttl| *ttl > Duration::zero())
            .unwrap_or_else(|| {
                tracing::warn!(session_ttl_hours, "Invalid session lifetime, using default");
                Duration::hours(DEFAULT_SESSION_TTL_HOURS)
            });

        Self {
            repo,
            session_ttl,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Overrides the bcrypt work factor
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub async fn signup(&self, credentials: Credentials) -> AppResult<AuthSession> {
        let username = normalize_username(&credentials.username)?;
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let cost = self.bcrypt_cost;
        let password = credentials.password;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

        let user = self
            .repo
            .create_user(&username, &synthetic_email(&username), &hash)
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User signed up");

        self.start_session(user.id, user.username).await
    }

    pub async fn login(&self, credentials: Credentials) -> AppResult<AuthSession> {
        let invalid = || AppError::Unauthorized("Invalid username or password".to_string());

        let username = normalize_username(&credentials.username).map_err(|_| invalid())?;
        let user = self
            .repo
            .find_user_by_email(&synthetic_email(&username))
            .await?
            .ok_or_else(invalid)?;

        let password = credentials.password;
        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

        if !verified {
            tracing::info!(username = %username, "Rejected login");
            return Err(invalid());
        }

        self.start_session(user.id, user.username).await
    }

    pub async fn logout(&self, token: &str) -> AppResult<()> {
        let token = parse_token(token)?;
        self.repo.delete_session(token).await
    }

    /// Resolves a bearer token to its user
    pub async fn authenticate(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let token = parse_token(token)?;
        self.repo.find_session_user(token).await?.ok_or_else(|| {
            AppError::Unauthorized("Session expired, please sign in again".to_string())
        })
    }

    async fn start_session(&self, user_id: Uuid, username: String) -> AppResult<AuthSession> {
        match self.repo.purge_expired_sessions(user_id).await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!(user_id = %user_id, purged, "Expired sessions removed"),
            Err(e) => tracing::warn!(error = %e, user_id = %user_id, "Failed to purge sessions"),
        }

        let token = Uuid::new_v4();
        let expires_at = Utc::now() + self.session_ttl;
        self.repo.create_session(user_id, token, expires_at).await?;

        Ok(AuthSession {
            token: token.to_string(),
            user_id,
            username,
            expires_at,
        })
    }
}

fn parse_token(token: &str) -> AppResult<Uuid> {
    Uuid::parse_str(token.trim())
        .map_err(|_| AppError::Unauthorized("Invalid session token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::MockAccountRepository;
    use crate::models::User;
    use tokio_test::{assert_err, assert_ok};

    fn user_with_password(password: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: "cinephile".to_string(),
            email: synthetic_email("cinephile"),
            password_hash: bcrypt::hash(password, 4).unwrap(),
            display_name: None,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  CinePhile_1 ").unwrap(), "cinephile_1");
        assert_err!(normalize_username("ab"));
        assert_err!(normalize_username("has space"));
        assert_err!(normalize_username("émile"));
        assert_ok!(normalize_username(&"a".repeat(30)));
        assert_err!(normalize_username(&"a".repeat(31)));
    }

    #[test]
    fn test_synthetic_email() {
        assert_eq!(synthetic_email("neo"), "neo@moodflix.local");
    }

    #[tokio::test]
    async fn test_signup_stores_hash_under_synthetic_email() {
        let mut repo = MockAccountRepository::new();
        repo.expect_create_user()
            .withf(|username, email, hash| {
                username == "neo" && email == "neo@moodflix.local" && hash.starts_with("$2")
            })
            .times(1)
            .returning(|username, email, hash| {
                Ok(User {
                    id: Uuid::new_v4(),
                    username: username.to_string(),
                    email: email.to_string(),
                    password_hash: hash.to_string(),
                    display_name: None,
                    is_admin: false,
                    created_at: Utc::now(),
                })
            });
        repo.expect_purge_expired_sessions().returning(|_| Ok(0));
        repo.expect_create_session().times(1).returning(|_, _, _| Ok(()));

        let service = AuthService::new(Arc::new(repo), 24).with_bcrypt_cost(4);
        let session = service.signup(credentials("Neo", "followthewhiterabbit")).await.unwrap();

        assert_eq!(session.username, "neo");
        assert!(Uuid::parse_str(&session.token).is_ok());
        assert!(session.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn test_signup_short_password_rejected_before_storage() {
        let mut repo = MockAccountRepository::new();
        repo.expect_create_user().never();

        let service = AuthService::new(Arc::new(repo), 24).with_bcrypt_cost(4);
        let result = service.signup(credentials("neo", "12345")).await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_is_unauthorized() {
        let user = user_with_password("correct-horse");
        let mut repo = MockAccountRepository::new();
        repo.expect_find_user_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_create_session().never();

        let service = AuthService::new(Arc::new(repo), 24);
        let result = service.login(credentials("cinephile", "wrong-horse")).await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_login_success_creates_session() {
        let user = user_with_password("correct-horse");
        let user_id = user.id;
        let mut repo = MockAccountRepository::new();
        repo.expect_find_user_by_email()
            .withf(|email| email == "cinephile@moodflix.local")
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_purge_expired_sessions()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(|_| Ok(3));
        repo.expect_create_session()
            .withf(move |id, _, _| *id == user_id)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = AuthService::new(Arc::new(repo), 24);
        let session = service.login(credentials("CINEPHILE", "correct-horse")).await.unwrap();

        assert_eq!(session.user_id, user_id);
    }

    #[tokio::test]
    async fn test_unknown_user_is_unauthorized() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_user_by_email().returning(|_| Ok(None));

        let service = AuthService::new(Arc::new(repo), 24);
        let result = service.login(credentials("ghost", "whatever")).await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_failed_purge_does_not_block_login() {
        let user = user_with_password("correct-horse");
        let mut repo = MockAccountRepository::new();
        repo.expect_find_user_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_purge_expired_sessions()
            .times(1)
            .returning(|_| Err(AppError::Internal("db busy".to_string())));
        repo.expect_create_session().times(1).returning(|_, _, _| Ok(()));

        let service = AuthService::new(Arc::new(repo), 24);
        assert_ok!(service.login(credentials("cinephile", "correct-horse")).await);
    }

    #[tokio::test]
    async fn test_unrepresentable_session_ttl_falls_back() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_user_by_email()
            .returning(|_| Ok(Some(user_with_password("correct-horse"))));
        repo.expect_purge_expired_sessions().returning(|_| Ok(0));
        repo.expect_create_session().returning(|_, _, _| Ok(()));

        let service = AuthService::new(Arc::new(repo), i64::MAX);
        let session = service
            .login(credentials("cinephile", "correct-horse"))
            .await
            .unwrap();

        let ttl = session.expires_at - Utc::now();
        assert!(ttl > Duration::hours(DEFAULT_SESSION_TTL_HOURS - 1));
        assert!(ttl <= Duration::hours(DEFAULT_SESSION_TTL_HOURS));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_malformed_token() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_session_user().never();

        let service = AuthService::new(Arc::new(repo), 24);
        let result = service.authenticate("not-a-uuid").await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_authenticate_expired_session() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_session_user().returning(|_| Ok(None));

        let service = AuthService::new(Arc::new(repo), 24);
        let result = service.authenticate(&Uuid::new_v4().to_string()).await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
