//! In-memory repositories for tests and offline development. They mirror
//! the SQL implementations, including validation and window semantics.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use carelog_core::domain::exercise::{ExerciseSession, NewExerciseSession};
use carelog_core::domain::glucose::{GlucoseReading, GlucoseStats, NewGlucoseReading};
use carelog_core::domain::meal::{Meal, NewMeal};
use carelog_core::domain::user::{validate_name, User};

use super::{
    ExerciseRepository, GlucoseRepository, MealRepository, RepositoryError, UserRepository,
};

struct Table<T> {
    next_id: i64,
    rows: Vec<T>,
}

// Manual impl: the derive would bound `T: Default`, which the row
// types do not implement.
impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { next_id: 0, rows: Vec::new() }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Table<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, name: &str, is_demo_data: bool) -> Result<User, RepositoryError> {
        validate_name(name)?;
        let mut users = self.users.write().await;
        let user = User {
            id: users.allocate_id(),
            name: name.to_string(),
            created: Utc::now(),
            is_demo_data,
        };
        users.rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.rows.iter().find(|u| u.name == name).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.read().await;
        let mut all = users.rows.clone();
        all.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(all)
    }
}

#[derive(Default)]
pub struct InMemoryGlucoseRepository {
    readings: RwLock<Table<GlucoseReading>>,
}

#[async_trait]
impl GlucoseRepository for InMemoryGlucoseRepository {
    async fn add(&self, reading: NewGlucoseReading) -> Result<GlucoseReading, RepositoryError> {
        reading.validate()?;
        let mut readings = self.readings.write().await;
        let stored = GlucoseReading {
            id: readings.allocate_id(),
            user_id: reading.user_id,
            timestamp: reading.timestamp,
            level: reading.level,
            notes: reading.notes,
            is_demo_data: reading.is_demo_data,
        };
        readings.rows.push(stored.clone());
        Ok(stored)
    }

    async fn recent(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<GlucoseReading>, RepositoryError> {
        let readings = self.readings.read().await;
        let mut matching: Vec<GlucoseReading> = readings
            .rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn stats(
        &self,
        user_id: i64,
        days: u32,
    ) -> Result<Option<GlucoseStats>, RepositoryError> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let readings = self.readings.read().await;
        let levels: Vec<f64> = readings
            .rows
            .iter()
            .filter(|r| r.user_id == user_id && r.timestamp >= cutoff)
            .map(|r| r.level)
            .collect();

        if levels.is_empty() {
            return Ok(None);
        }

        let sum: f64 = levels.iter().sum();
        let minimum = levels.iter().copied().fold(f64::INFINITY, f64::min);
        let maximum = levels.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Some(GlucoseStats {
            average: sum / levels.len() as f64,
            minimum,
            maximum,
            reading_count: levels.len() as i64,
        }))
    }
}

#[derive(Default)]
pub struct InMemoryMealRepository {
    meals: RwLock<Table<Meal>>,
}

#[async_trait]
impl MealRepository for InMemoryMealRepository {
    async fn add(&self, meal: NewMeal) -> Result<Meal, RepositoryError> {
        meal.validate()?;
        let mut meals = self.meals.write().await;
        let stored = Meal {
            id: meals.allocate_id(),
            user_id: meal.user_id,
            timestamp: meal.timestamp,
            name: meal.name,
            category: meal.category,
            calories: meal.calories,
            carbs: meal.carbs,
            protein: meal.protein,
            fat: meal.fat,
            is_demo_data: meal.is_demo_data,
        };
        meals.rows.push(stored.clone());
        Ok(stored)
    }

    async fn recent(&self, user_id: i64, limit: u32) -> Result<Vec<Meal>, RepositoryError> {
        let meals = self.meals.read().await;
        let mut matching: Vec<Meal> = meals
            .rows
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}

#[derive(Default)]
pub struct InMemoryExerciseRepository {
    sessions: RwLock<Table<ExerciseSession>>,
}

#[async_trait]
impl ExerciseRepository for InMemoryExerciseRepository {
    async fn add(
        &self,
        session: NewExerciseSession,
    ) -> Result<ExerciseSession, RepositoryError> {
        session.validate()?;
        let mut sessions = self.sessions.write().await;
        let stored = ExerciseSession {
            id: sessions.allocate_id(),
            user_id: session.user_id,
            timestamp: session.timestamp,
            activity_type: session.activity_type,
            duration_minutes: session.duration_minutes,
            calories_burned: session.calories_burned,
            intensity: session.intensity,
            is_demo_data: session.is_demo_data,
        };
        sessions.rows.push(stored.clone());
        Ok(stored)
    }

    async fn recent(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<ExerciseSession>, RepositoryError> {
        let sessions = self.sessions.read().await;
        let mut matching: Vec<ExerciseSession> = sessions
            .rows
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}
