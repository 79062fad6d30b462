//! Small text helpers shared by the router's extraction passes.

pub(crate) fn normalize(text: &str) -> String {
    text.to_ascii_lowercase()
}

/// Splits on whitespace after blanking punctuation, keeping the characters
/// that matter for health logs: digits with decimal points, a leading minus
/// sign, and the slash in "mg/dl".
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    let sanitized: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '/' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();
    sanitized.split_whitespace().map(str::to_string).collect()
}

/// Reads a token as a number if the whole token is one. Hyphenated words
/// and ranges like "80-130" do not parse and are skipped by callers.
pub(crate) fn parse_number(token: &str) -> Option<f64> {
    let trimmed = token.trim_matches('.');
    if !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::{normalize, parse_number, tokenize};

    #[test]
    fn tokenize_keeps_readings_and_units_together() {
        let tokens = tokenize(&normalize("My blood sugar is 160 mg/dL!"));

        assert_eq!(tokens, vec!["my", "blood", "sugar", "is", "160", "mg/dl"]);
    }

    #[test]
    fn tokenize_preserves_negative_numbers() {
        let tokens = tokenize("blood sugar is -5");

        assert_eq!(tokens.last().map(String::as_str), Some("-5"));
    }

    #[test]
    fn numbers_parse_with_trailing_punctuation() {
        assert_eq!(parse_number("160."), Some(160.0));
        assert_eq!(parse_number("98.6"), Some(98.6));
        assert_eq!(parse_number("-5"), Some(-5.0));
    }

    #[test]
    fn words_and_ranges_do_not_parse() {
        assert_eq!(parse_number("pasta"), None);
        assert_eq!(parse_number("80-130"), None);
        assert_eq!(parse_number("..."), None);
    }
}
