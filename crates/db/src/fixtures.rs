use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use carelog_core::domain::exercise::{Intensity, NewExerciseSession};
use carelog_core::domain::glucose::NewGlucoseReading;
use carelog_core::domain::meal::{MealCategory, NewMeal};

use crate::connection::DbPool;
use crate::repositories::{
    ExerciseRepository, GlucoseRepository, MealRepository, RepositoryError,
    SqlExerciseRepository, SqlGlucoseRepository, SqlMealRepository, SqlUserRepository,
    UserRepository,
};

pub const DEMO_USER_NAME: &str = "Sarah (Demo)";

const DEMO_DAYS: i64 = 7;
const DEMO_SEED: u64 = 2024;

/// Days-ago offsets without a workout, so weekly summaries show rest days.
const REST_DAYS_AGO: &[i64] = &[2, 6];

struct GlucoseSlot {
    hour: u32,
    minute: u32,
    low: i64,
    high: i64,
    note: &'static str,
}

const GLUCOSE_SCHEDULE: &[GlucoseSlot] = &[
    GlucoseSlot { hour: 7, minute: 15, low: 95, high: 125, note: "Morning" },
    GlucoseSlot { hour: 9, minute: 30, low: 130, high: 160, note: "After breakfast" },
    GlucoseSlot { hour: 14, minute: 0, low: 140, high: 170, note: "After lunch" },
    GlucoseSlot { hour: 21, minute: 0, low: 110, high: 140, note: "Evening" },
];

struct MealSlot {
    hour: u32,
    minute: u32,
    name: &'static str,
    category: MealCategory,
    calories: f64,
    carbs: f64,
    protein: f64,
    fat: f64,
}

const MEAL_SCHEDULE: &[MealSlot] = &[
    MealSlot {
        hour: 7,
        minute: 30,
        name: "Oatmeal with berries",
        category: MealCategory::Breakfast,
        calories: 320.0,
        carbs: 48.0,
        protein: 12.0,
        fat: 8.0,
    },
    MealSlot {
        hour: 12,
        minute: 30,
        name: "Chicken salad",
        category: MealCategory::Lunch,
        calories: 420.0,
        carbs: 18.0,
        protein: 35.0,
        fat: 22.0,
    },
    MealSlot {
        hour: 19,
        minute: 0,
        name: "Salmon with vegetables",
        category: MealCategory::Dinner,
        calories: 520.0,
        carbs: 28.0,
        protein: 42.0,
        fat: 24.0,
    },
];

const EXERCISE_ROTATION: &[(&str, i64)] = &[
    ("running", 45),
    ("yoga", 40),
    ("running", 30),
    ("strength training", 35),
    ("cycling", 50),
];
const EXERCISE_HOUR: u32 = 17;
const EXERCISE_MINUTE: u32 = 30;
const EXERCISE_CALORIES_PER_MINUTE: f64 = 8.0;

const EXPECTED_GLUCOSE_ROWS: i64 = DEMO_DAYS * GLUCOSE_SCHEDULE.len() as i64;
const EXPECTED_MEAL_ROWS: i64 = DEMO_DAYS * MEAL_SCHEDULE.len() as i64;
const EXPECTED_EXERCISE_ROWS: i64 = DEMO_DAYS - REST_DAYS_AGO.len() as i64;

/// Seven days of realistic demo history for one flagged user.
///
/// Loading is idempotent, every seeded row carries the demo flag, and
/// cleaning removes exactly the flagged rows so personal data is never
/// touched.
pub struct DemoDataset;

impl DemoDataset {
    pub async fn load(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
        let users = SqlUserRepository::new(pool.clone());
        let user = match users.find_by_name(DEMO_USER_NAME).await? {
            Some(user) => user,
            None => users.create(DEMO_USER_NAME, true).await?,
        };

        let already_seeded: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM glucose_readings WHERE user_id = ?1 AND is_demo_data = 1",
        )
        .bind(user.id)
        .fetch_one(pool)
        .await?;
        if already_seeded > 0 {
            return Self::summary(pool, user.id).await;
        }

        let glucose = SqlGlucoseRepository::new(pool.clone());
        let meals = SqlMealRepository::new(pool.clone());
        let exercise = SqlExerciseRepository::new(pool.clone());
        let mut rng = StdRng::seed_from_u64(DEMO_SEED);
        let today = Utc::now().date_naive();

        for days_ago in (0..DEMO_DAYS).rev() {
            let day = today - Duration::days(days_ago);

            for slot in GLUCOSE_SCHEDULE {
                let level = rng.gen_range(slot.low..=slot.high) as f64;
                glucose
                    .add(NewGlucoseReading {
                        user_id: user.id,
                        timestamp: day_time(day, slot.hour, slot.minute),
                        level,
                        notes: Some(slot.note.to_string()),
                        is_demo_data: true,
                    })
                    .await?;
            }

            for slot in MEAL_SCHEDULE {
                meals
                    .add(NewMeal {
                        user_id: user.id,
                        timestamp: day_time(day, slot.hour, slot.minute),
                        name: slot.name.to_string(),
                        category: slot.category,
                        calories: slot.calories,
                        carbs: slot.carbs,
                        protein: slot.protein,
                        fat: slot.fat,
                        is_demo_data: true,
                    })
                    .await?;
            }

            if !REST_DAYS_AGO.contains(&days_ago) {
                let (activity, minutes) = EXERCISE_ROTATION[(days_ago % 5) as usize];
                exercise
                    .add(NewExerciseSession {
                        user_id: user.id,
                        timestamp: day_time(day, EXERCISE_HOUR, EXERCISE_MINUTE),
                        activity_type: activity.to_string(),
                        duration_minutes: minutes,
                        calories_burned: minutes as f64 * EXERCISE_CALORIES_PER_MINUTE,
                        intensity: Intensity::Moderate,
                        is_demo_data: true,
                    })
                    .await?;
            }
        }

        Self::summary(pool, user.id).await
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let users = SqlUserRepository::new(pool.clone());
        let Some(user) = users.find_by_name(DEMO_USER_NAME).await? else {
            return Ok(VerificationResult {
                all_present: false,
                checks: vec![("demo-user", false)],
            });
        };

        let mut checks = vec![("demo-user", user.is_demo_data)];

        let summary = Self::summary(pool, user.id).await?;
        checks.push(("glucose-rows", summary.glucose_readings == EXPECTED_GLUCOSE_ROWS));
        checks.push(("meal-rows", summary.meals == EXPECTED_MEAL_ROWS));
        checks.push(("exercise-rows", summary.exercise_sessions == EXPECTED_EXERCISE_ROWS));

        let exercise_days: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT substr(timestamp, 1, 10))
             FROM exercise WHERE user_id = ?1 AND is_demo_data = 1",
        )
        .bind(user.id)
        .fetch_one(pool)
        .await?;
        checks.push(("exercise-rest-days", exercise_days == EXPECTED_EXERCISE_ROWS));

        let out_of_band: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM glucose_readings
             WHERE user_id = ?1 AND is_demo_data = 1 AND (level < 95 OR level > 170)",
        )
        .bind(user.id)
        .fetch_one(pool)
        .await?;
        checks.push(("glucose-plausible-levels", out_of_band == 0));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Deletes every row carrying the demo flag and returns how many rows
    /// went away. Non-demo data is left untouched.
    pub async fn clean(pool: &DbPool) -> Result<u64, RepositoryError> {
        let mut tx = pool.begin().await?;

        let mut removed = 0;
        for table in ["glucose_readings", "meals", "exercise", "users"] {
            let result = sqlx::query(&format!("DELETE FROM {table} WHERE is_demo_data = 1"))
                .execute(&mut *tx)
                .await?;
            removed += result.rows_affected();
        }

        tx.commit().await?;
        Ok(removed)
    }

    async fn summary(pool: &DbPool, user_id: i64) -> Result<SeedSummary, RepositoryError> {
        let glucose_readings: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM glucose_readings WHERE user_id = ?1 AND is_demo_data = 1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        let meals: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM meals WHERE user_id = ?1 AND is_demo_data = 1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        let exercise_sessions: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM exercise WHERE user_id = ?1 AND is_demo_data = 1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(SeedSummary { user_id, glucose_readings, meals, exercise_sessions })
    }
}

fn day_time(day: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    day.and_time(time).and_utc()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub user_id: i64,
    pub glucose_readings: i64,
    pub meals: i64,
    pub exercise_sessions: i64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
