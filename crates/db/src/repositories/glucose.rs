use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use carelog_core::domain::glucose::{GlucoseReading, GlucoseStats, NewGlucoseReading};

use crate::DbPool;

use super::{parse_timestamp, GlucoseRepository, RepositoryError};

pub struct SqlGlucoseRepository {
    pool: DbPool,
}

impl SqlGlucoseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_reading(row: &SqliteRow) -> Result<GlucoseReading, RepositoryError> {
    let timestamp: String = row
        .try_get("timestamp")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(GlucoseReading {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        user_id: row
            .try_get("user_id")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        timestamp: parse_timestamp(&timestamp),
        level: row
            .try_get("level")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        notes: row
            .try_get("notes")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        is_demo_data: row
            .try_get::<i64, _>("is_demo_data")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?
            != 0,
    })
}

#[async_trait]
impl GlucoseRepository for SqlGlucoseRepository {
    async fn add(&self, reading: NewGlucoseReading) -> Result<GlucoseReading, RepositoryError> {
        reading.validate()?;

        let result = sqlx::query(
            "INSERT INTO glucose_readings (user_id, timestamp, level, notes, is_demo_data)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(reading.user_id)
        .bind(reading.timestamp.to_rfc3339())
        .bind(reading.level)
        .bind(&reading.notes)
        .bind(reading.is_demo_data as i64)
        .execute(&self.pool)
        .await?;

        Ok(GlucoseReading {
            id: result.last_insert_rowid(),
            user_id: reading.user_id,
            timestamp: reading.timestamp,
            level: reading.level,
            notes: reading.notes,
            is_demo_data: reading.is_demo_data,
        })
    }

    async fn recent(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<GlucoseReading>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, timestamp, level, notes, is_demo_data
             FROM glucose_readings
             WHERE user_id = ?
             ORDER BY timestamp DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reading).collect::<Result<Vec<_>, _>>()
    }

    async fn stats(
        &self,
        user_id: i64,
        days: u32,
    ) -> Result<Option<GlucoseStats>, RepositoryError> {
        // Stored timestamps are RFC 3339 in UTC, so a plain text comparison
        // against an RFC 3339 cutoff is chronological.
        let cutoff = Utc::now() - Duration::days(i64::from(days));

        let row = sqlx::query(
            "SELECT AVG(level) AS average, MIN(level) AS minimum,
                    MAX(level) AS maximum, COUNT(*) AS reading_count
             FROM glucose_readings
             WHERE user_id = ? AND timestamp >= ?",
        )
        .bind(user_id)
        .bind(cutoff.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let reading_count: i64 = row
            .try_get("reading_count")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        if reading_count == 0 {
            return Ok(None);
        }

        let average: Option<f64> = row
            .try_get("average")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let minimum: Option<f64> = row
            .try_get("minimum")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let maximum: Option<f64> = row
            .try_get("maximum")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        match (average, minimum, maximum) {
            (Some(average), Some(minimum), Some(maximum)) => Ok(Some(GlucoseStats {
                average,
                minimum,
                maximum,
                reading_count,
            })),
            _ => Err(RepositoryError::Decode(
                "aggregate columns were null despite a non-zero count".to_string(),
            )),
        }
    }
}
