//! Cross-record pattern analysis. Pulls recent history from every store
//! and runs the statistical probes in [`carelog_core::analysis`] over it.
//! Below the history threshold it reports the gap instead of guessing.

use std::sync::Arc;

use carelog_core::analysis;
use carelog_core::Finding;
use carelog_db::repositories::{ExerciseRepository, GlucoseRepository, MealRepository};

use crate::error::AgentError;

const GLUCOSE_FETCH_LIMIT: u32 = 200;
const MEAL_FETCH_LIMIT: u32 = 100;
const EXERCISE_FETCH_LIMIT: u32 = 100;

pub struct PatternAnalyzer {
    glucose: Arc<dyn GlucoseRepository>,
    meals: Arc<dyn MealRepository>,
    exercise: Arc<dyn ExerciseRepository>,
    min_history: usize,
}

impl PatternAnalyzer {
    pub fn new(
        glucose: Arc<dyn GlucoseRepository>,
        meals: Arc<dyn MealRepository>,
        exercise: Arc<dyn ExerciseRepository>,
        min_history: usize,
    ) -> Self {
        Self { glucose, meals, exercise, min_history }
    }

    pub async fn analyze(&self, user_id: i64) -> Result<Vec<Finding>, AgentError> {
        let readings = self.glucose.recent(user_id, GLUCOSE_FETCH_LIMIT).await?;
        if readings.len() < self.min_history {
            return Ok(vec![Finding {
                title: "Not enough data yet",
                body: format!(
                    "I have {} glucose readings so far and need at least {} to spot patterns. Keep logging and ask me again soon.",
                    readings.len(),
                    self.min_history
                ),
            }]);
        }

        let meals = self.meals.recent(user_id, MEAL_FETCH_LIMIT).await?;
        let sessions = self.exercise.recent(user_id, EXERCISE_FETCH_LIMIT).await?;

        let findings: Vec<Finding> = [
            analysis::exercise_glucose_contrast(&readings, &sessions),
            analysis::meal_glucose_impact(&readings, &meals),
            analysis::time_of_day_profile(&readings),
            analysis::exercise_timing_contrast(&readings, &sessions),
        ]
        .into_iter()
        .flatten()
        .collect();

        if findings.is_empty() {
            return Ok(vec![Finding {
                title: "No strong patterns yet",
                body: "Nothing stands out in your recent data. Keep logging meals, exercise and readings and I'll keep watching.".to_string(),
            }]);
        }
        Ok(findings)
    }
}
