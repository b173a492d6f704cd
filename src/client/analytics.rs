use std::sync::Arc;

use super::{context::ClientContext, remote::AnalyticsApi};
use crate::models::AdminAnalytics;

/// Admin dashboard data
///
/// A failed refresh keeps the last good data and records the error.
pub struct AnalyticsView {
    ctx: ClientContext,
    remote: Arc<dyn AnalyticsApi>,
    data: Option<AdminAnalytics>,
    error: Option<String>,
}

impl AnalyticsView {
    pub fn new(ctx: ClientContext, remote: Arc<dyn AnalyticsApi>) -> Self {
        Self {
            ctx,
            remote,
            data: None,
            error: None,
        }
    }

    pub fn data(&self) -> Option<&AdminAnalytics> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns whether fresh data was loaded
    pub async fn refetch(&mut self) -> bool {
        let Some(session) = self.ctx.session().await else {
            self.error = Some("Sign in as an admin to view analytics".to_string());
            return false;
        };

        match self.remote.admin_analytics(&session.token).await {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load analytics");
                self.error = Some(e.to_string());
                false
            }
        }
    }
}
