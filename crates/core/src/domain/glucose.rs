use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Hard ceiling for a single reading. Values above this are treated as
/// entry mistakes rather than physiology.
pub const MAX_LEVEL_MG_DL: f64 = 600.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    pub id: i64,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub level: f64,
    pub notes: Option<String>,
    pub is_demo_data: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewGlucoseReading {
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub level: f64,
    pub notes: Option<String>,
    pub is_demo_data: bool,
}

impl NewGlucoseReading {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.level <= 0.0 || self.level > MAX_LEVEL_MG_DL {
            return Err(ValidationError::GlucoseOutOfRange {
                level: self.level,
                max: MAX_LEVEL_MG_DL,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlucoseZone {
    Low,
    InRange,
    Elevated,
    High,
}

impl GlucoseZone {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::InRange => "in range",
            Self::Elevated => "elevated",
            Self::High => "high",
        }
    }
}

/// Band edges for classifying a reading against the before-meal target
/// range. The in-range ceiling is inclusive, so 130 mg/dL still counts
/// as in range and 131 mg/dL is elevated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlucoseBands {
    pub low_below: f64,
    pub in_range_max: f64,
    pub elevated_max: f64,
}

impl Default for GlucoseBands {
    fn default() -> Self {
        Self { low_below: 80.0, in_range_max: 130.0, elevated_max: 180.0 }
    }
}

impl GlucoseBands {
    pub fn classify(&self, level: f64) -> GlucoseZone {
        if level < self.low_below {
            GlucoseZone::Low
        } else if level <= self.in_range_max {
            GlucoseZone::InRange
        } else if level <= self.elevated_max {
            GlucoseZone::Elevated
        } else {
            GlucoseZone::High
        }
    }
}

/// Aggregates over a trailing window of readings, as produced by the
/// stats query. Absent entirely when the window holds no readings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlucoseStats {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub reading_count: i64,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{GlucoseBands, GlucoseZone, NewGlucoseReading};

    fn reading(level: f64) -> NewGlucoseReading {
        NewGlucoseReading {
            user_id: 1,
            timestamp: Utc::now(),
            level,
            notes: None,
            is_demo_data: false,
        }
    }

    #[test]
    fn classifies_each_band() {
        let bands = GlucoseBands::default();

        assert_eq!(bands.classify(65.0), GlucoseZone::Low);
        assert_eq!(bands.classify(79.0), GlucoseZone::Low);
        assert_eq!(bands.classify(80.0), GlucoseZone::InRange);
        assert_eq!(bands.classify(125.0), GlucoseZone::InRange);
        assert_eq!(bands.classify(150.0), GlucoseZone::Elevated);
        assert_eq!(bands.classify(181.0), GlucoseZone::High);
    }

    #[test]
    fn in_range_ceiling_is_inclusive() {
        let bands = GlucoseBands::default();

        assert_eq!(bands.classify(130.0), GlucoseZone::InRange);
        assert_eq!(bands.classify(131.0), GlucoseZone::Elevated);
        assert_eq!(bands.classify(180.0), GlucoseZone::Elevated);
    }

    #[test]
    fn rejects_non_positive_levels() {
        assert!(reading(-5.0).validate().is_err());
        assert!(reading(0.0).validate().is_err());
    }

    #[test]
    fn accepts_levels_up_to_the_ceiling() {
        assert!(reading(600.0).validate().is_ok());
        assert!(reading(600.1).validate().is_err());
    }
}
