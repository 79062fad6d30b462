//! Pure pattern detection over logged health data.
//!
//! Each probe inspects slices of already-fetched history and either
//! returns a [`Finding`] worth surfacing or `None` when the data is too
//! thin or the effect too small to mention. Thresholds follow the idea
//! that a difference under 10 mg/dL is noise for a consumer meter.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, Timelike};

use crate::domain::exercise::ExerciseSession;
use crate::domain::glucose::GlucoseReading;
use crate::domain::meal::Meal;

const MIN_SESSIONS_FOR_CONTRAST: usize = 3;
const MIN_MEALS_FOR_IMPACT: usize = 5;
const MIN_IMPACT_SAMPLES: usize = 3;
const MIN_READINGS_FOR_TIME_PROFILE: usize = 10;

const CONTRAST_THRESHOLD_MG_DL: f64 = 10.0;
const STRONG_CONTRAST_MG_DL: f64 = 20.0;
const TIME_SPREAD_THRESHOLD_MG_DL: f64 = 20.0;
const TIMING_THRESHOLD_MG_DL: f64 = 15.0;

/// One detected pattern, ready to be rendered into a reply.
#[derive(Clone, Debug, PartialEq)]
pub struct Finding {
    pub title: &'static str,
    pub body: String,
}

fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn by_value(a: &(&str, f64), b: &(&str, f64)) -> Ordering {
    a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)
}

fn session_dates<'a, I>(sessions: I) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = &'a ExerciseSession>,
{
    sessions.into_iter().map(|s| s.timestamp.date_naive()).collect()
}

fn mean_level_on(readings: &[GlucoseReading], dates: &BTreeSet<NaiveDate>) -> Option<f64> {
    mean(
        readings
            .iter()
            .filter(|r| dates.contains(&r.timestamp.date_naive()))
            .map(|r| r.level),
    )
}

/// Compares average glucose on exercise days against rest days.
pub fn exercise_glucose_contrast(
    readings: &[GlucoseReading],
    sessions: &[ExerciseSession],
) -> Option<Finding> {
    if sessions.len() < MIN_SESSIONS_FOR_CONTRAST {
        return None;
    }

    let exercise_dates = session_dates(sessions);
    let on_days = mean_level_on(readings, &exercise_dates)?;
    let off_days = mean(
        readings
            .iter()
            .filter(|r| !exercise_dates.contains(&r.timestamp.date_naive()))
            .map(|r| r.level),
    )?;

    let delta = off_days - on_days;
    if delta.abs() <= CONTRAST_THRESHOLD_MG_DL {
        return None;
    }

    let direction = if delta > 0.0 { "lower" } else { "higher" };
    let strength = if delta.abs() > STRONG_CONTRAST_MG_DL { "strong" } else { "moderate" };
    Some(Finding {
        title: "Exercise and glucose",
        body: format!(
            "Your glucose averages {:.0} mg/dL {direction} on days you exercise.\n\
             - Exercise days: {on_days:.0} mg/dL average\n\
             - Rest days: {off_days:.0} mg/dL average\n\
             - Pattern strength: {strength}",
            delta.abs()
        ),
    })
}

/// Ranks meals by the glucose readings taken one to three hours after
/// eating them.
pub fn meal_glucose_impact(readings: &[GlucoseReading], meals: &[Meal]) -> Option<Finding> {
    if meals.len() < MIN_MEALS_FOR_IMPACT {
        return None;
    }

    let mut impacts: Vec<(&str, f64)> = Vec::new();
    for meal in meals {
        let window_start = meal.timestamp + Duration::hours(1);
        let window_end = meal.timestamp + Duration::hours(3);
        let post_meal = mean(
            readings
                .iter()
                .filter(|r| r.timestamp > window_start && r.timestamp < window_end)
                .map(|r| r.level),
        );
        if let Some(level) = post_meal {
            impacts.push((meal.name.as_str(), level));
        }
    }

    if impacts.len() < MIN_IMPACT_SAMPLES {
        return None;
    }

    impacts.sort_by(by_value);
    let steadiest = &impacts[..2.min(impacts.len())];
    let spikiest = &impacts[impacts.len().saturating_sub(2)..];

    let high_avg = mean(spikiest.iter().map(|(_, v)| *v))?;
    let low_avg = mean(steadiest.iter().map(|(_, v)| *v))?;
    let high_names: Vec<&str> = spikiest.iter().rev().map(|(n, _)| *n).collect();
    let low_names: Vec<&str> = steadiest.iter().map(|(n, _)| *n).collect();

    Some(Finding {
        title: "Meals and glucose",
        body: format!(
            "Different meals move your glucose differently.\n\
             - Bigger rises after: {} (around {high_avg:.0} mg/dL)\n\
             - Smaller rises after: {} (around {low_avg:.0} mg/dL)\n\
             - Meals like {} tend to keep you steadier.",
            high_names.join(", "),
            low_names.join(", "),
            low_names[0]
        ),
    })
}

/// Splits readings into morning, afternoon and evening and reports a
/// meaningful spread between the extremes.
pub fn time_of_day_profile(readings: &[GlucoseReading]) -> Option<Finding> {
    if readings.len() < MIN_READINGS_FOR_TIME_PROFILE {
        return None;
    }

    let bucket = |range: std::ops::RangeInclusive<u32>| {
        mean(
            readings
                .iter()
                .filter(|r| range.contains(&r.timestamp.hour()))
                .map(|r| r.level),
        )
    };

    let mut periods: Vec<(&str, f64)> = Vec::new();
    if let Some(level) = bucket(6..=11) {
        periods.push(("morning", level));
    }
    if let Some(level) = bucket(12..=17) {
        periods.push(("afternoon", level));
    }
    if let Some(level) = bucket(18..=23) {
        periods.push(("evening", level));
    }

    let highest = *periods.iter().max_by(|a, b| by_value(a, b))?;
    let lowest = *periods.iter().min_by(|a, b| by_value(a, b))?;
    let spread = highest.1 - lowest.1;
    if spread <= TIME_SPREAD_THRESHOLD_MG_DL {
        return None;
    }

    Some(Finding {
        title: "Time of day",
        body: format!(
            "Your glucose varies by time of day.\n\
             - Highest around the {}: {:.0} mg/dL\n\
             - Lowest around the {}: {:.0} mg/dL\n\
             - That is a {spread:.0} mg/dL spread; the {} deserves the most attention.",
            highest.0, highest.1, lowest.0, lowest.1, highest.0
        ),
    })
}

/// Checks whether morning or evening workouts line up with better
/// glucose on the same day.
pub fn exercise_timing_contrast(
    readings: &[GlucoseReading],
    sessions: &[ExerciseSession],
) -> Option<Finding> {
    if sessions.len() < MIN_SESSIONS_FOR_CONTRAST {
        return None;
    }

    let morning_dates =
        session_dates(sessions.iter().filter(|s| (5..=11).contains(&s.timestamp.hour())));
    let evening_dates =
        session_dates(sessions.iter().filter(|s| (17..=21).contains(&s.timestamp.hour())));

    let morning = mean_level_on(readings, &morning_dates)?;
    let evening = mean_level_on(readings, &evening_dates)?;
    if (morning - evening).abs() <= TIMING_THRESHOLD_MG_DL {
        return None;
    }

    let (better, better_avg, other, other_avg) = if morning < evening {
        ("morning", morning, "evening", evening)
    } else {
        ("evening", evening, "morning", morning)
    };

    Some(Finding {
        title: "Exercise timing",
        body: format!(
            "Your {better} workouts line up with better glucose.\n\
             - Days with {better} exercise: {better_avg:.0} mg/dL average\n\
             - Days with {other} exercise: {other_avg:.0} mg/dL average\n\
             - Consider shifting more sessions to the {better}.",
        ),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::domain::exercise::{ExerciseSession, Intensity};
    use crate::domain::glucose::GlucoseReading;
    use crate::domain::meal::{Meal, MealCategory};

    use super::{
        exercise_glucose_contrast, exercise_timing_contrast, meal_glucose_impact,
        time_of_day_profile,
    };

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn reading(day: u32, hour: u32, level: f64) -> GlucoseReading {
        GlucoseReading {
            id: 0,
            user_id: 1,
            timestamp: at(day, hour),
            level,
            notes: None,
            is_demo_data: false,
        }
    }

    fn session(day: u32, hour: u32) -> ExerciseSession {
        ExerciseSession {
            id: 0,
            user_id: 1,
            timestamp: at(day, hour),
            activity_type: "running".to_string(),
            duration_minutes: 30,
            calories_burned: 300.0,
            intensity: Intensity::Moderate,
            is_demo_data: false,
        }
    }

    fn meal(name: &str, day: u32, hour: u32) -> Meal {
        Meal {
            id: 0,
            user_id: 1,
            timestamp: at(day, hour),
            name: name.to_string(),
            category: MealCategory::Lunch,
            calories: 400.0,
            carbs: 40.0,
            protein: 20.0,
            fat: 10.0,
            is_demo_data: false,
        }
    }

    #[test]
    fn contrast_reports_lower_glucose_on_exercise_days() {
        let sessions = vec![session(1, 17), session(2, 17), session(3, 17)];
        let readings = vec![
            reading(1, 9, 100.0),
            reading(2, 9, 104.0),
            reading(3, 9, 102.0),
            reading(4, 9, 132.0),
            reading(5, 9, 128.0),
        ];

        let finding = exercise_glucose_contrast(&readings, &sessions).unwrap();

        assert!(finding.body.contains("lower"));
        assert!(finding.body.contains("strong"));
    }

    #[test]
    fn contrast_needs_three_sessions() {
        let sessions = vec![session(1, 17), session(2, 17)];
        let readings = vec![reading(1, 9, 100.0), reading(4, 9, 140.0)];

        assert!(exercise_glucose_contrast(&readings, &sessions).is_none());
    }

    #[test]
    fn contrast_ignores_noise_level_differences() {
        let sessions = vec![session(1, 17), session(2, 17), session(3, 17)];
        let readings = vec![reading(1, 9, 118.0), reading(2, 9, 120.0), reading(4, 9, 124.0)];

        assert!(exercise_glucose_contrast(&readings, &sessions).is_none());
    }

    #[test]
    fn meal_impact_ranks_spiky_and_steady_meals() {
        let meals = vec![
            meal("pizza", 1, 12),
            meal("pasta", 2, 12),
            meal("salad", 3, 12),
            meal("chicken salad", 4, 12),
            meal("oatmeal", 5, 12),
        ];
        let readings = vec![
            reading(1, 14, 185.0),
            reading(2, 14, 175.0),
            reading(3, 14, 112.0),
            reading(4, 14, 108.0),
            reading(5, 14, 140.0),
        ];

        let finding = meal_glucose_impact(&readings, &meals).unwrap();

        assert!(finding.body.contains("pizza"));
        assert!(finding.body.contains("chicken salad"));
        assert!(finding.body.contains("steadier"));
    }

    #[test]
    fn meal_impact_requires_post_meal_readings() {
        let meals = vec![
            meal("pizza", 1, 12),
            meal("pasta", 2, 12),
            meal("salad", 3, 12),
            meal("eggs", 4, 12),
            meal("rice", 5, 12),
        ];
        // All readings are taken before the meals, never in the window.
        let readings = vec![reading(1, 8, 110.0), reading(2, 8, 112.0), reading(3, 8, 114.0)];

        assert!(meal_glucose_impact(&readings, &meals).is_none());
    }

    #[test]
    fn time_profile_flags_a_wide_spread() {
        let mut readings = Vec::new();
        for day in 1..=6 {
            readings.push(reading(day, 7, 100.0));
            readings.push(reading(day, 20, 145.0));
        }

        let finding = time_of_day_profile(&readings).unwrap();

        assert!(finding.body.contains("evening"));
        assert!(finding.body.contains("45 mg/dL spread"));
    }

    #[test]
    fn time_profile_needs_ten_readings() {
        let readings = vec![reading(1, 7, 90.0), reading(1, 20, 160.0)];

        assert!(time_of_day_profile(&readings).is_none());
    }

    #[test]
    fn timing_contrast_prefers_the_lower_average() {
        let sessions = vec![session(1, 7), session(2, 7), session(3, 18), session(4, 18)];
        let readings = vec![
            reading(1, 12, 100.0),
            reading(2, 12, 102.0),
            reading(3, 12, 126.0),
            reading(4, 12, 130.0),
        ];

        let finding = exercise_timing_contrast(&readings, &sessions).unwrap();

        assert!(finding.body.contains("morning workouts"));
    }

    #[test]
    fn timing_contrast_needs_both_windows() {
        let sessions = vec![session(1, 7), session(2, 7), session(3, 7)];
        let readings = vec![reading(1, 12, 100.0), reading(2, 12, 101.0)];

        assert!(exercise_timing_contrast(&readings, &sessions).is_none());
    }
}
