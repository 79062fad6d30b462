pub mod analysis;
pub mod config;
pub mod domain;
pub mod errors;
pub mod estimates;

pub use analysis::Finding;
pub use config::{
    AgentConfig, AppConfig, ConfigError, ConfigOverrides, DatabaseConfig, KnowledgeConfig,
    LlmConfig, LlmProvider, LoadOptions, LogFormat, LoggingConfig, ServerConfig,
};
pub use domain::exercise::{
    ActivityTotals, ExerciseSession, Intensity, NewExerciseSession, MAX_DURATION_MINUTES,
};
pub use domain::glucose::{
    GlucoseBands, GlucoseReading, GlucoseStats, GlucoseZone, NewGlucoseReading, MAX_LEVEL_MG_DL,
};
pub use domain::intent::Intent;
pub use domain::meal::{Meal, MealCategory, NewMeal, NutritionTotals};
pub use domain::user::User;
pub use errors::ValidationError;
pub use estimates::MealEstimate;
