use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use carelog_core::domain::user::{validate_name, User};

use crate::DbPool;

use super::{parse_timestamp, RepositoryError, UserRepository};

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User, RepositoryError> {
    let created: String = row
        .try_get("created")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(User {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        name: row
            .try_get("name")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        created: parse_timestamp(&created),
        is_demo_data: row
            .try_get::<i64, _>("is_demo_data")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?
            != 0,
    })
}

#[async_trait]
impl UserRepository for SqlUserRepository {
    async fn create(&self, name: &str, is_demo_data: bool) -> Result<User, RepositoryError> {
        validate_name(name)?;
        let created = Utc::now();

        let result = sqlx::query(
            "INSERT INTO users (name, created, is_demo_data) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(created.to_rfc3339())
        .bind(is_demo_data as i64)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            created,
            is_demo_data,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, created, is_demo_data FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, created, is_demo_data FROM users WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, created, is_demo_data FROM users ORDER BY created DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let pool = setup().await;
        let repo = SqlUserRepository::new(pool);

        let created = repo.create("Sarah (Demo)", true).await.expect("create");
        assert!(created.id > 0);
        assert!(created.is_demo_data);

        let by_id = repo
            .find_by_id(created.id)
            .await
            .expect("find by id")
            .expect("present");
        assert_eq!(by_id, created);

        let by_name = repo
            .find_by_name("Sarah (Demo)")
            .await
            .expect("find by name")
            .expect("present");
        assert_eq!(by_name.id, created.id);
    }

    #[tokio::test]
    async fn find_by_name_misses_cleanly() {
        let pool = setup().await;
        let repo = SqlUserRepository::new(pool);

        let missing = repo.find_by_name("nobody").await.expect("query");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn blank_names_are_rejected_before_insert() {
        let pool = setup().await;
        let repo = SqlUserRepository::new(pool);

        let err = repo.create("   ", false).await;
        assert!(matches!(err, Err(RepositoryError::Invalid(_))));

        let all = repo.list().await.expect("list");
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn duplicate_names_surface_a_database_error() {
        let pool = setup().await;
        let repo = SqlUserRepository::new(pool);

        repo.create("Sarah (Demo)", true).await.expect("first create");
        let second = repo.create("Sarah (Demo)", true).await;
        assert!(matches!(second, Err(RepositoryError::Database(_))));
    }
}
