use std::sync::Arc;

use tokio::sync::RwLock;

use super::{
    notice::{Notice, NoticeSink},
    remote::AuthApi,
};
use crate::models::{AuthSession, Credentials};

/// Signed-in session and notice sink shared by every store of one client
#[derive(Clone)]
pub struct ClientContext {
    session: Arc<RwLock<Option<AuthSession>>>,
    notices: Arc<dyn NoticeSink>,
}

impl ClientContext {
    pub fn new(notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            session: Arc::new(RwLock::new(None)),
            notices,
        }
    }

    pub fn notify(&self, notice: Notice) {
        self.notices.push(notice);
    }

    pub async fn session(&self) -> Option<AuthSession> {
        self.session.read().await.clone()
    }

    pub async fn set_session(&self, session: Option<AuthSession>) {
        *self.session.write().await = session;
    }

    /// Current session or an error notice asking the user to sign in
    pub async fn require_session(&self, action: &str) -> Option<AuthSession> {
        let session = self.session().await;
        if session.is_none() {
            self.notify(Notice::error(
                "Sign in required",
                format!("Please sign in to {}.", action),
            ));
        }
        session
    }

    pub async fn sign_up(&self, api: &dyn AuthApi, credentials: Credentials) -> bool {
        match api.signup(&credentials).await {
            Ok(session) => {
                self.notify(Notice::success(
                    "Welcome to MoodFlix",
                    format!("Your account {} is ready.", session.username),
                ));
                self.set_session(Some(session)).await;
                true
            }
            Err(e) => {
                self.notify(Notice::from_error("Sign up failed", &e));
                false
            }
        }
    }

    pub async fn sign_in(&self, api: &dyn AuthApi, credentials: Credentials) -> bool {
        match api.login(&credentials).await {
            Ok(session) => {
                self.notify(Notice::success(
                    "Welcome back",
                    format!("Signed in as {}.", session.username),
                ));
                self.set_session(Some(session)).await;
                true
            }
            Err(e) => {
                self.notify(Notice::from_error("Sign in failed", &e));
                false
            }
        }
    }

    /// Drops the local session even when the server call fails
    pub async fn sign_out(&self, api: &dyn AuthApi) {
        let Some(session) = self.session.write().await.take() else {
            return;
        };

        if let Err(e) = api.logout(&session.token).await {
            tracing::warn!(error = %e, "Server-side logout failed");
        }
        self.notify(Notice::info("Signed out", "See you next time."));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::notice::{NoticeLevel, NoticeLog};
    use crate::client::remote::MockAuthApi;
    use crate::error::AppError;
    use chrono::Utc;
    use uuid::Uuid;

    fn session() -> AuthSession {
        AuthSession {
            token: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4(),
            username: "neo".to_string(),
            expires_at: Utc::now(),
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "neo".to_string(),
            password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_stores_session() {
        let log = Arc::new(NoticeLog::new());
        let ctx = ClientContext::new(log.clone());
        let mut api = MockAuthApi::new();
        api.expect_login().returning(|_| Ok(session()));

        assert!(ctx.sign_in(&api, credentials()).await);
        assert_eq!(ctx.session().await.unwrap().username, "neo");
        assert_eq!(log.count(NoticeLevel::Success), 1);
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_signed_out() {
        let log = Arc::new(NoticeLog::new());
        let ctx = ClientContext::new(log.clone());
        let mut api = MockAuthApi::new();
        api.expect_login()
            .returning(|_| Err(AppError::Unauthorized("Invalid username or password".into())));

        assert!(!ctx.sign_in(&api, credentials()).await);
        assert!(ctx.session().await.is_none());
        assert_eq!(log.count(NoticeLevel::Error), 1);
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_even_if_server_fails() {
        let log = Arc::new(NoticeLog::new());
        let ctx = ClientContext::new(log.clone());
        ctx.set_session(Some(session())).await;

        let mut api = MockAuthApi::new();
        api.expect_logout()
            .times(1)
            .returning(|_| Err(AppError::ExternalApi("down".into())));

        ctx.sign_out(&api).await;
        assert!(ctx.session().await.is_none());

        // second sign-out has nothing to do
        ctx.sign_out(&api).await;
    }

    #[tokio::test]
    async fn test_require_session_notifies_when_signed_out() {
        let log = Arc::new(NoticeLog::new());
        let ctx = ClientContext::new(log.clone());

        assert!(ctx.require_session("write reviews").await.is_none());
        assert_eq!(log.last().unwrap().title, "Sign in required");
    }
}
