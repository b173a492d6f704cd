//! User-facing notices ("toasts")
//!
//! Every client operation reports its outcome as exactly one notice. Sinks
//! decide how notices reach the user; `NoticeLog` keeps them in memory and
//! `TracingSink` writes them to the log.
use std::sync::Mutex;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notice {
    fn new(level: NoticeLevel, title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description,
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, Some(description.into()))
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, Some(description.into()))
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, Some(description.into()))
    }

    /// Error notice for a failed operation, tailored to the kind of failure
    pub fn from_error(title: &str, error: &AppError) -> Self {
        match ErrorKind::classify(error) {
            ErrorKind::RateLimit => Self::error(
                "Too many requests",
                "You're going a bit fast. Please wait a moment and try again.",
            ),
            ErrorKind::Payment => Self::error(
                "Service credits exhausted",
                "The recommendation service is out of credits. Please try again later.",
            ),
            ErrorKind::Generic => Self::error(title, error.to_string()),
        }
    }
}

pub trait NoticeSink: Send + Sync {
    fn push(&self, notice: Notice);
}

/// Keeps every notice in order
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices().iter().filter(|n| n.level == level).count()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices().last().cloned()
    }

    pub fn clear(&self) {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl NoticeSink for NoticeLog {
    fn push(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice);
    }
}

/// Writes notices to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NoticeSink for TracingSink {
    fn push(&self, notice: Notice) {
        let description = notice.description.as_deref().unwrap_or_default();
        match notice.level {
            NoticeLevel::Error => {
                tracing::warn!(title = %notice.title, description = %description, "Notice")
            }
            _ => tracing::info!(title = %notice.title, description = %description, "Notice"),
        }
    }
}

/// Buckets a failure for the message shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimit,
    Payment,
    Generic,
}

impl ErrorKind {
    pub fn classify(error: &AppError) -> Self {
        match error {
            AppError::RateLimited(_) => ErrorKind::RateLimit,
            AppError::PaymentRequired(_) => ErrorKind::Payment,
            other => {
                let message = other.to_string();
                if message.contains("Rate limit") {
                    ErrorKind::RateLimit
                } else if message.contains("Payment") {
                    ErrorKind::Payment
                } else {
                    ErrorKind::Generic
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_variant() {
        assert_eq!(
            ErrorKind::classify(&AppError::RateLimited("slow down".into())),
            ErrorKind::RateLimit
        );
        assert_eq!(
            ErrorKind::classify(&AppError::PaymentRequired("no credits".into())),
            ErrorKind::Payment
        );
        assert_eq!(
            ErrorKind::classify(&AppError::NotFound("movie".into())),
            ErrorKind::Generic
        );
    }

    #[test]
    fn test_classify_by_message() {
        assert_eq!(
            ErrorKind::classify(&AppError::ExternalApi("Rate limit exceeded upstream".into())),
            ErrorKind::RateLimit
        );
        assert_eq!(
            ErrorKind::classify(&AppError::Internal("Payment required by gateway".into())),
            ErrorKind::Payment
        );
    }

    #[test]
    fn test_from_error_uses_title_for_generic_failures() {
        let notice = Notice::from_error(
            "Couldn't save",
            &AppError::Storage("disk full".into()),
        );
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.title, "Couldn't save");
        assert!(notice.description.unwrap().contains("disk full"));
    }

    #[test]
    fn test_notice_log_keeps_order() {
        let log = NoticeLog::new();
        log.push(Notice::info("a", "1"));
        log.push(Notice::error("b", "2"));

        assert_eq!(log.notices().len(), 2);
        assert_eq!(log.count(NoticeLevel::Error), 1);
        assert_eq!(log.last().unwrap().title, "b");
    }
}
