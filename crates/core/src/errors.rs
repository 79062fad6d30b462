use thiserror::Error;

/// Rejections raised while validating health entries before they are
/// persisted. Every variant carries enough context to render a precise
/// user-facing message without consulting the caller.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("glucose level {level} mg/dL must be above 0 and at most {max} mg/dL")]
    GlucoseOutOfRange { level: f64, max: f64 },
    #[error("exercise duration {minutes} minutes must be between 1 and {max} minutes")]
    DurationOutOfRange { minutes: i64, max: i64 },
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}

impl ValidationError {
    /// Short phrasing suitable for echoing back in a chat reply.
    pub fn user_message(&self) -> String {
        match self {
            Self::GlucoseOutOfRange { level, max } => format!(
                "That glucose reading ({level} mg/dL) doesn't look right. \
                 Readings must be above 0 and at most {max} mg/dL."
            ),
            Self::DurationOutOfRange { minutes, max } => format!(
                "That exercise duration ({minutes} minutes) doesn't look right. \
                 Sessions must be between 1 minute and {max} minutes."
            ),
            Self::EmptyField { field } => format!("Please provide a {field}."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ValidationError;

    #[test]
    fn glucose_rejection_names_the_bounds() {
        let err = ValidationError::GlucoseOutOfRange { level: -5.0, max: 600.0 };

        assert_eq!(
            err.to_string(),
            "glucose level -5 mg/dL must be above 0 and at most 600 mg/dL"
        );
        assert!(err.user_message().contains("-5 mg/dL"));
    }

    #[test]
    fn duration_rejection_names_the_bounds() {
        let err = ValidationError::DurationOutOfRange { minutes: 0, max: 480 };

        assert_eq!(
            err.to_string(),
            "exercise duration 0 minutes must be between 1 and 480 minutes"
        );
        assert!(err.user_message().contains("480 minutes"));
    }

    #[test]
    fn empty_field_rejection_names_the_field() {
        let err = ValidationError::EmptyField { field: "meal description" };

        assert_eq!(err.user_message(), "Please provide a meal description.");
    }
}
