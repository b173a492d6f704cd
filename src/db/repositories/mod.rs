//! Persistence seams over Postgres
//!
//! Each concern gets its own trait so services can be tested against mocks;
//! `PgStore` implements all of them over one connection pool.

pub mod accounts;
pub mod analytics;
pub mod user_data;

use sqlx::PgPool;

use crate::error::AppError;

pub use accounts::AccountRepository;
pub use analytics::AnalyticsRepository;
pub use user_data::UserDataRepository;

#[cfg(test)]
pub use accounts::MockAccountRepository;
#[cfg(test)]
pub use analytics::MockAnalyticsRepository;
#[cfg(test)]
pub use user_data::MockUserDataRepository;

/// Postgres-backed implementation of every repository trait
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a unique-constraint violation to `Conflict`, everything else to
/// `Database`
fn conflict_or(e: sqlx::Error, what: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(what.to_string())
        }
        _ => AppError::Database(e),
    }
}
