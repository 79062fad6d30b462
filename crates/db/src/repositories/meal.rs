use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use carelog_core::domain::meal::{Meal, MealCategory, NewMeal};

use crate::DbPool;

use super::{parse_timestamp, MealRepository, RepositoryError};

pub struct SqlMealRepository {
    pool: DbPool,
}

impl SqlMealRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_category(raw: &str) -> MealCategory {
    match raw {
        "breakfast" => MealCategory::Breakfast,
        "lunch" => MealCategory::Lunch,
        "dinner" => MealCategory::Dinner,
        _ => MealCategory::Snack,
    }
}

fn row_to_meal(row: &SqliteRow) -> Result<Meal, RepositoryError> {
    let timestamp: String = row
        .try_get("timestamp")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String = row
        .try_get("category")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Meal {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        user_id: row
            .try_get("user_id")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        timestamp: parse_timestamp(&timestamp),
        name: row
            .try_get("name")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        category: parse_category(&category),
        calories: row
            .try_get("calories")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        carbs: row
            .try_get("carbs")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        protein: row
            .try_get("protein")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        fat: row
            .try_get("fat")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        is_demo_data: row
            .try_get::<i64, _>("is_demo_data")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?
            != 0,
    })
}

#[async_trait]
impl MealRepository for SqlMealRepository {
    async fn add(&self, meal: NewMeal) -> Result<Meal, RepositoryError> {
        meal.validate()?;

        let result = sqlx::query(
            "INSERT INTO meals (user_id, timestamp, name, category, calories, carbs, protein, fat, is_demo_data)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(meal.user_id)
        .bind(meal.timestamp.to_rfc3339())
        .bind(&meal.name)
        .bind(meal.category.label())
        .bind(meal.calories)
        .bind(meal.carbs)
        .bind(meal.protein)
        .bind(meal.fat)
        .bind(meal.is_demo_data as i64)
        .execute(&self.pool)
        .await?;

        Ok(Meal {
            id: result.last_insert_rowid(),
            user_id: meal.user_id,
            timestamp: meal.timestamp,
            name: meal.name,
            category: meal.category,
            calories: meal.calories,
            carbs: meal.carbs,
            protein: meal.protein,
            fat: meal.fat,
            is_demo_data: meal.is_demo_data,
        })
    }

    async fn recent(&self, user_id: i64, limit: u32) -> Result<Vec<Meal>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, timestamp, name, category, calories, carbs, protein, fat, is_demo_data
             FROM meals
             WHERE user_id = ?
             ORDER BY timestamp DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_meal).collect::<Result<Vec<_>, _>>()
    }
}
