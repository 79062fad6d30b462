use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealCategory {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }

    /// Fallback categorization by local hour when the text itself does
    /// not name a meal slot.
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            5..=10 => Self::Breakfast,
            11..=14 => Self::Lunch,
            17..=21 => Self::Dinner,
            _ => Self::Snack,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub category: MealCategory,
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub is_demo_data: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewMeal {
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub category: MealCategory,
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub is_demo_data: bool,
}

impl NewMeal {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "meal description" });
        }
        Ok(())
    }
}

/// Running totals across a set of logged meals.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub meal_count: usize,
}

impl NutritionTotals {
    pub fn from_meals(meals: &[Meal]) -> Self {
        let mut totals = Self::default();
        for meal in meals {
            totals.calories += meal.calories;
            totals.carbs += meal.carbs;
            totals.protein += meal.protein;
            totals.fat += meal.fat;
            totals.meal_count += 1;
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Meal, MealCategory, NewMeal, NutritionTotals};

    #[test]
    fn hour_fallback_covers_the_day() {
        assert_eq!(MealCategory::for_hour(7), MealCategory::Breakfast);
        assert_eq!(MealCategory::for_hour(12), MealCategory::Lunch);
        assert_eq!(MealCategory::for_hour(19), MealCategory::Dinner);
        assert_eq!(MealCategory::for_hour(23), MealCategory::Snack);
        assert_eq!(MealCategory::for_hour(3), MealCategory::Snack);
    }

    #[test]
    fn blank_description_is_rejected() {
        let meal = NewMeal {
            user_id: 1,
            timestamp: Utc::now(),
            name: "  ".to_string(),
            category: MealCategory::Snack,
            calories: 100.0,
            carbs: 10.0,
            protein: 5.0,
            fat: 2.0,
            is_demo_data: false,
        };

        assert!(meal.validate().is_err());
    }

    #[test]
    fn totals_accumulate_across_meals() {
        let meal = |calories: f64, carbs: f64| Meal {
            id: 0,
            user_id: 1,
            timestamp: Utc::now(),
            name: "oatmeal".to_string(),
            category: MealCategory::Breakfast,
            calories,
            carbs,
            protein: 10.0,
            fat: 5.0,
            is_demo_data: false,
        };

        let totals = NutritionTotals::from_meals(&[meal(300.0, 50.0), meal(200.0, 15.0)]);

        assert_eq!(totals.calories, 500.0);
        assert_eq!(totals.carbs, 65.0);
        assert_eq!(totals.meal_count, 2);
    }
}
