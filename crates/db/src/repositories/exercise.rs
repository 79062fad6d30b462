use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use carelog_core::domain::exercise::{ExerciseSession, Intensity, NewExerciseSession};

use crate::DbPool;

use super::{parse_timestamp, ExerciseRepository, RepositoryError};

pub struct SqlExerciseRepository {
    pool: DbPool,
}

impl SqlExerciseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_intensity(raw: &str) -> Intensity {
    match raw {
        "low" => Intensity::Low,
        "high" => Intensity::High,
        _ => Intensity::Moderate,
    }
}

fn row_to_session(row: &SqliteRow) -> Result<ExerciseSession, RepositoryError> {
    let timestamp: String = row
        .try_get("timestamp")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let intensity: String = row
        .try_get("intensity")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(ExerciseSession {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        user_id: row
            .try_get("user_id")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        timestamp: parse_timestamp(&timestamp),
        activity_type: row
            .try_get("activity_type")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        duration_minutes: row
            .try_get("duration_minutes")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        calories_burned: row
            .try_get("calories_burned")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        intensity: parse_intensity(&intensity),
        is_demo_data: row
            .try_get::<i64, _>("is_demo_data")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?
            != 0,
    })
}

#[async_trait]
impl ExerciseRepository for SqlExerciseRepository {
    async fn add(
        &self,
        session: NewExerciseSession,
    ) -> Result<ExerciseSession, RepositoryError> {
        session.validate()?;

        let result = sqlx::query(
            "INSERT INTO exercise (user_id, timestamp, activity_type, duration_minutes, calories_burned, intensity, is_demo_data)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(session.user_id)
        .bind(session.timestamp.to_rfc3339())
        .bind(&session.activity_type)
        .bind(session.duration_minutes)
        .bind(session.calories_burned)
        .bind(session.intensity.label())
        .bind(session.is_demo_data as i64)
        .execute(&self.pool)
        .await?;

        Ok(ExerciseSession {
            id: result.last_insert_rowid(),
            user_id: session.user_id,
            timestamp: session.timestamp,
            activity_type: session.activity_type,
            duration_minutes: session.duration_minutes,
            calories_burned: session.calories_burned,
            intensity: session.intensity,
            is_demo_data: session.is_demo_data,
        })
    }

    async fn recent(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<ExerciseSession>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, timestamp, activity_type, duration_minutes, calories_burned, intensity, is_demo_data
             FROM exercise
             WHERE user_id = ?
             ORDER BY timestamp DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_session).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    async fn insert_user(pool: &DbPool) -> i64 {
        sqlx::query("INSERT INTO users (name, created, is_demo_data) VALUES (?, ?, 0)")
            .bind("test user")
            .bind(Utc::now().to_rfc3339())
            .execute(pool)
            .await
            .expect("insert user")
            .last_insert_rowid()
    }

    fn sample_session(
        user_id: i64,
        activity: &str,
        minutes: i64,
        timestamp: DateTime<Utc>,
    ) -> NewExerciseSession {
        NewExerciseSession {
            user_id,
            timestamp,
            activity_type: activity.to_string(),
            duration_minutes: minutes,
            calories_burned: (minutes * 8) as f64,
            intensity: Intensity::Moderate,
            is_demo_data: false,
        }
    }

    #[tokio::test]
    async fn add_then_recent_round_trips_intensity() {
        let pool = setup().await;
        let user_id = insert_user(&pool).await;
        let repo = SqlExerciseRepository::new(pool);

        let now = Utc::now();
        repo.add(sample_session(user_id, "running", 45, now - Duration::days(1)))
            .await
            .expect("add older");
        repo.add(NewExerciseSession {
            intensity: Intensity::High,
            ..sample_session(user_id, "cycling", 50, now - Duration::hours(2))
        })
        .await
        .expect("add newer");

        let recent = repo.recent(user_id, 10).await.expect("recent");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].activity_type, "cycling");
        assert_eq!(recent[0].intensity, Intensity::High);
        assert_eq!(recent[1].activity_type, "running");
        assert_eq!(recent[1].intensity, Intensity::Moderate);
    }

    #[tokio::test]
    async fn zero_duration_sessions_are_rejected() {
        let pool = setup().await;
        let user_id = insert_user(&pool).await;
        let repo = SqlExerciseRepository::new(pool);

        let rejected = repo
            .add(sample_session(user_id, "running", 0, Utc::now()))
            .await;
        assert!(matches!(rejected, Err(RepositoryError::Invalid(_))));
    }

    #[tokio::test]
    async fn recent_is_scoped_to_the_requesting_user() {
        let pool = setup().await;
        let first_user = insert_user(&pool).await;
        let second_user = sqlx::query("INSERT INTO users (name, created, is_demo_data) VALUES (?, ?, 0)")
            .bind("other user")
            .bind(Utc::now().to_rfc3339())
            .execute(&pool)
            .await
            .expect("insert second user")
            .last_insert_rowid();
        let repo = SqlExerciseRepository::new(pool);

        repo.add(sample_session(first_user, "yoga", 40, Utc::now()))
            .await
            .expect("add for first");

        let other = repo.recent(second_user, 10).await.expect("recent");
        assert!(other.is_empty());
    }
}
