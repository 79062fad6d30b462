use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Longest single session accepted, in minutes.
pub const MAX_DURATION_MINUTES: i64 = 480;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intensity {
    Low,
    #[default]
    Moderate,
    High,
}

impl Intensity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    /// Scales the per-minute burn rate of an activity.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Low => 0.8,
            Self::Moderate => 1.0,
            Self::High => 1.25,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSession {
    pub id: i64,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub activity_type: String,
    pub duration_minutes: i64,
    pub calories_burned: f64,
    pub intensity: Intensity,
    pub is_demo_data: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewExerciseSession {
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub activity_type: String,
    pub duration_minutes: i64,
    pub calories_burned: f64,
    pub intensity: Intensity,
    pub is_demo_data: bool,
}

impl NewExerciseSession {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.activity_type.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "activity" });
        }
        if self.duration_minutes < 1 || self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(ValidationError::DurationOutOfRange {
                minutes: self.duration_minutes,
                max: MAX_DURATION_MINUTES,
            });
        }
        Ok(())
    }
}

/// Totals across a set of logged sessions, with the distinct activity
/// names in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityTotals {
    pub total_minutes: i64,
    pub total_calories: f64,
    pub session_count: usize,
    pub activities: Vec<String>,
}

impl ActivityTotals {
    pub fn from_sessions(sessions: &[ExerciseSession]) -> Self {
        let mut totals = Self::default();
        for session in sessions {
            totals.total_minutes += session.duration_minutes;
            totals.total_calories += session.calories_burned;
            totals.session_count += 1;
            if !totals.activities.iter().any(|a| a == &session.activity_type) {
                totals.activities.push(session.activity_type.clone());
            }
        }
        totals
    }
}
