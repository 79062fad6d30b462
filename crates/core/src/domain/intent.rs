use serde::{Deserialize, Serialize};

use crate::domain::exercise::Intensity;
use crate::domain::meal::MealCategory;

/// One recognized request inside a chat message. A single message can
/// carry several, such as a meal and a glucose reading in one sentence.
/// `category` is only set when the text names a meal slot explicitly;
/// otherwise the nutrition agent infers one from the clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    LogGlucose { level: f64, notes: Option<String> },
    LogMeal { description: String, category: Option<MealCategory> },
    LogExercise { activity: String, duration_minutes: Option<i64>, intensity: Option<Intensity> },
    PatternQuery { question: String },
    GeneralQuestion { question: String },
}

impl Intent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LogGlucose { .. } => "log_glucose",
            Self::LogMeal { .. } => "log_meal",
            Self::LogExercise { .. } => "log_exercise",
            Self::PatternQuery { .. } => "pattern_query",
            Self::GeneralQuestion { .. } => "general_question",
        }
    }
}
