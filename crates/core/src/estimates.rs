//! Keyword-based nutrition and calorie-burn estimates.
//!
//! These are deliberately coarse lookup tables for common foods and
//! activities so that a plain sentence like "I ate pasta" still yields a
//! usable log entry without asking the user for macros.

use crate::domain::exercise::Intensity;
use crate::domain::meal::MealCategory;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MealEstimate {
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
}

const fn meal(calories: f64, carbs: f64, protein: f64, fat: f64) -> MealEstimate {
    MealEstimate { calories, carbs, protein, fat }
}

pub const DEFAULT_MEAL_ESTIMATE: MealEstimate = meal(300.0, 40.0, 15.0, 10.0);

// Ordered: the first keyword found in the description wins, so
// "chicken salad" resolves as a salad.
const MEAL_ESTIMATES: &[(&str, MealEstimate)] = &[
    ("salad", meal(200.0, 15.0, 10.0, 10.0)),
    ("chicken", meal(350.0, 5.0, 40.0, 15.0)),
    ("oatmeal", meal(300.0, 50.0, 10.0, 6.0)),
    ("eggs", meal(150.0, 2.0, 12.0, 10.0)),
    ("yogurt", meal(150.0, 20.0, 10.0, 3.0)),
    ("sandwich", meal(400.0, 45.0, 20.0, 15.0)),
    ("pizza", meal(500.0, 60.0, 20.0, 20.0)),
    ("pasta", meal(450.0, 70.0, 15.0, 10.0)),
    ("rice", meal(350.0, 75.0, 7.0, 1.0)),
    ("burger", meal(600.0, 45.0, 30.0, 30.0)),
];

pub fn estimate_meal(description: &str) -> MealEstimate {
    let description = description.to_ascii_lowercase();
    for (keyword, estimate) in MEAL_ESTIMATES {
        if description.contains(keyword) {
            return *estimate;
        }
    }
    DEFAULT_MEAL_ESTIMATE
}

/// Categorizes a meal from an explicit slot word in the text, falling
/// back to the local hour it was logged at.
pub fn categorize_meal(description: &str, hour: u32) -> MealCategory {
    let description = description.to_ascii_lowercase();
    if description.contains("breakfast") {
        MealCategory::Breakfast
    } else if description.contains("lunch") {
        MealCategory::Lunch
    } else if description.contains("dinner") {
        MealCategory::Dinner
    } else if description.contains("snack") {
        MealCategory::Snack
    } else {
        MealCategory::for_hour(hour)
    }
}

pub const DEFAULT_BURN_RATE: f64 = 5.0;

const ACTIVITY_BURN_RATES: &[(&str, f64)] = &[
    ("run", 10.0),
    ("running", 10.0),
    ("jog", 8.0),
    ("jogging", 8.0),
    ("walk", 4.0),
    ("walking", 4.0),
    ("yoga", 3.0),
    ("swim", 9.0),
    ("swimming", 9.0),
    ("bike", 8.0),
    ("biking", 8.0),
    ("cycling", 8.0),
    ("strength", 5.0),
    ("weights", 5.0),
    ("gym", 6.0),
    ("workout", 6.0),
];

/// Calories burned per minute for the given activity name, for an
/// average adult at moderate effort.
pub fn burn_rate_per_minute(activity: &str) -> f64 {
    let activity = activity.to_ascii_lowercase();
    ACTIVITY_BURN_RATES
        .iter()
        .find(|(name, _)| *name == activity)
        .map(|(_, rate)| *rate)
        .unwrap_or(DEFAULT_BURN_RATE)
}

pub fn estimate_burned_calories(activity: &str, minutes: i64, intensity: Intensity) -> f64 {
    burn_rate_per_minute(activity) * minutes as f64 * intensity.multiplier()
}
