use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use carelog_core::domain::exercise::{ExerciseSession, NewExerciseSession};
use carelog_core::domain::glucose::{GlucoseReading, GlucoseStats, NewGlucoseReading};
use carelog_core::domain::meal::{Meal, NewMeal};
use carelog_core::domain::user::User;
use carelog_core::errors::ValidationError;

pub mod exercise;
pub mod glucose;
pub mod meal;
pub mod memory;
pub mod user;

pub use exercise::SqlExerciseRepository;
pub use glucose::SqlGlucoseRepository;
pub use meal::SqlMealRepository;
pub use memory::{
    InMemoryExerciseRepository, InMemoryGlucoseRepository, InMemoryMealRepository,
    InMemoryUserRepository,
};
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("validation error: {0}")]
    Invalid(#[from] ValidationError),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, name: &str, is_demo_data: bool) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<User>, RepositoryError>;
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
}

#[async_trait]
pub trait GlucoseRepository: Send + Sync {
    async fn add(&self, reading: NewGlucoseReading) -> Result<GlucoseReading, RepositoryError>;

    /// Most recent readings first.
    async fn recent(&self, user_id: i64, limit: u32)
        -> Result<Vec<GlucoseReading>, RepositoryError>;

    /// Aggregates over the trailing `days` window. `None` when the window
    /// holds no readings.
    async fn stats(&self, user_id: i64, days: u32)
        -> Result<Option<GlucoseStats>, RepositoryError>;
}

#[async_trait]
pub trait MealRepository: Send + Sync {
    async fn add(&self, meal: NewMeal) -> Result<Meal, RepositoryError>;
    async fn recent(&self, user_id: i64, limit: u32) -> Result<Vec<Meal>, RepositoryError>;
}

#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    async fn add(&self, session: NewExerciseSession)
        -> Result<ExerciseSession, RepositoryError>;
    async fn recent(&self, user_id: i64, limit: u32)
        -> Result<Vec<ExerciseSession>, RepositoryError>;
}

/// Timestamps are stored as RFC 3339 text. Rows created by SQLite's
/// `CURRENT_TIMESTAMP` default use `YYYY-MM-DD HH:MM:SS` instead, so both
/// forms decode; anything else falls back to now rather than failing the row.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}
