//! Message classification and field extraction.
//!
//! A deterministic lexical pass finds everything that should be logged:
//! glucose numbers near glucose words, meal descriptions after eating
//! phrases, activities with optional durations. Only when that pass finds
//! nothing at all is the language model consulted, and then only to split
//! "asks about the user's own history" from "asks about the world". A
//! failed or unparseable model call falls open to a general question; the
//! router never returns an empty intent list.

use std::sync::Arc;

use carelog_core::domain::exercise::Intensity;
use carelog_core::domain::meal::MealCategory;
use carelog_core::Intent;

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::prompts;
use crate::text::{normalize, parse_number, tokenize};

const GLUCOSE_KEYWORDS: &[&str] = &["glucose", "sugar", "bg", "mg/dl"];

// A number directly followed by one of these belongs to some other
// quantity and is never read as a glucose level.
const NON_GLUCOSE_UNITS: &[&str] = &[
    "minutes", "minute", "mins", "min", "hours", "hour", "hrs", "hr", "grams", "gram", "g",
    "carbs", "calories", "kcal", "cal", "steps", "miles", "mile", "km", "pounds", "lbs", "kg",
    "days", "years",
];

// Checked in order; the specific phrasings sit before the bare verbs so
// "i just ate" wins over "ate".
const MEAL_PREFIXES: &[&str] = &[
    "i just ate ",
    "i just had ",
    "i ate ",
    "i had ",
    "log meal: ",
    "log meal ",
    "meal: ",
    "for breakfast ",
    "for lunch ",
    "for dinner ",
    "ate ",
    "had ",
];

// Phrases that end a meal description when no punctuation does.
const MEAL_BOUNDARIES: &[&str] = &[
    " and my ",
    " and i ",
    " and then ",
    " and went ",
    " then ",
    " for breakfast",
    " for lunch",
    " for dinner",
    " for a snack",
    " as a snack",
    " this morning",
    " this afternoon",
    " this evening",
    " today",
    " tonight",
    " yesterday",
];

const LEADING_ARTICLES: &[&str] = &["a ", "an ", "some ", "the ", "my "];

// Keyword to stored activity name. Past tenses map onto the form the
// calorie-burn table knows.
const ACTIVITY_KEYWORDS: &[(&str, &str)] = &[
    ("running", "running"),
    ("run", "running"),
    ("ran", "running"),
    ("jogging", "jogging"),
    ("jog", "jogging"),
    ("jogged", "jogging"),
    ("walking", "walking"),
    ("walk", "walking"),
    ("walked", "walking"),
    ("yoga", "yoga"),
    ("pilates", "pilates"),
    ("swimming", "swimming"),
    ("swim", "swimming"),
    ("swam", "swimming"),
    ("cycling", "cycling"),
    ("biking", "cycling"),
    ("biked", "cycling"),
    ("bike", "cycling"),
    ("lifting", "weights"),
    ("lifted", "weights"),
    ("weights", "weights"),
    ("strength", "strength"),
    ("gym", "gym"),
    ("workout", "workout"),
    ("exercised", "exercise"),
    ("exercise", "exercise"),
];

const DURATION_UNITS: &[&str] = &["minutes", "minute", "mins", "min"];

const INTERROGATIVES: &[&str] = &[
    "how", "what", "why", "when", "where", "which", "who", "should", "can", "could", "would",
    "will", "does", "do", "is", "are", "am",
];

const PATTERN_WORDS: &[&str] = &[
    "pattern", "patterns", "trend", "trends", "trending", "average", "averages", "correlation",
    "correlations", "correlate", "insight", "insights", "history", "progress", "summary",
    "weekly", "lately", "affect", "affects", "affecting", "impact", "impacts",
];

const OPTIMIZATION_WORDS: &[&str] =
    &["improve", "improving", "optimize", "better", "reduce", "lower", "increase"];

const GREETINGS: &[&str] = &["hi", "hello", "hey", "howdy", "thanks", "thank", "help"];

pub(crate) const DIABETES_TOPIC: &[&str] =
    &["glucose", "sugar", "blood", "diabetes", "high", "low"];
pub(crate) const NUTRITION_TOPIC: &[&str] =
    &["food", "meal", "meals", "eat", "eating", "diet", "nutrition", "carb", "carbs"];
pub(crate) const FITNESS_TOPIC: &[&str] =
    &["exercise", "workout", "workouts", "activity", "tired", "energy"];

pub(crate) fn mentions_any(tokens: &[String], words: &[&str]) -> bool {
    tokens.iter().any(|token| words.contains(&token.as_str()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QuestionKind {
    Pattern,
    General,
}

pub struct Router {
    llm: Arc<dyn LlmClient>,
}

impl Router {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Classifies one message into at least one intent, in the fixed order
    /// glucose, meal, exercise, question.
    pub async fn route(&self, message: &str) -> Vec<Intent> {
        let text = normalize(message);
        let tokens = tokenize(&text);

        let structured = extract_structured(&text, &tokens);
        if !structured.is_empty() {
            return structured;
        }

        let kind = match question_kind_lexical(&tokens) {
            Some(kind) => kind,
            None => match self.classify_with_llm(message).await {
                Ok(kind) => kind,
                Err(error) => {
                    tracing::debug!(
                        event_name = "agent.route",
                        fallback = "general_question",
                        error = %error,
                        "question tiebreak failed open"
                    );
                    QuestionKind::General
                }
            },
        };

        match kind {
            QuestionKind::Pattern => vec![Intent::PatternQuery { question: message.to_string() }],
            QuestionKind::General => {
                vec![Intent::GeneralQuestion { question: message.to_string() }]
            }
        }
    }

    async fn classify_with_llm(&self, message: &str) -> Result<QuestionKind, AgentError> {
        let prompt = prompts::question_kind(message);
        let reply = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|error| AgentError::Llm(error.to_string()))?;
        parse_question_kind(&reply).ok_or(AgentError::Classification)
    }
}

/// Topic groups the message touches, used both for the pattern-question
/// heuristic and by the coordinator when picking corpora to consult.
pub(crate) fn topic_group_count(tokens: &[String]) -> usize {
    [DIABETES_TOPIC, NUTRITION_TOPIC, FITNESS_TOPIC]
        .iter()
        .filter(|group| mentions_any(tokens, group))
        .count()
}

fn extract_structured(text: &str, tokens: &[String]) -> Vec<Intent> {
    let question = question_shaped(text, tokens);
    let mut intents = Vec::new();

    // Glucose extraction stays on even for question-shaped text: a number
    // next to glucose language is always worth logging.
    if let Some(level) = extract_glucose_level(tokens) {
        intents.push(Intent::LogGlucose { level, notes: None });
    }

    if !question {
        if let Some((description, category)) = extract_meal(text) {
            intents.push(Intent::LogMeal { description, category });
        }
        if let Some((activity, duration_minutes, intensity)) = extract_exercise(tokens) {
            intents.push(Intent::LogExercise { activity, duration_minutes, intensity });
        }
    }

    intents
}

fn question_shaped(text: &str, tokens: &[String]) -> bool {
    text.contains('?')
        || tokens
            .first()
            .map(|first| INTERROGATIVES.contains(&first.as_str()))
            .unwrap_or(false)
}

fn extract_glucose_level(tokens: &[String]) -> Option<f64> {
    let keyword_positions: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| GLUCOSE_KEYWORDS.contains(&token.as_str()))
        .map(|(index, _)| index)
        .collect();
    if keyword_positions.is_empty() {
        return None;
    }

    // The number closest to a glucose word wins, so "ran 30 minutes, sugar
    // is 140" reads the 140.
    let mut best: Option<(usize, f64)> = None;
    for (index, token) in tokens.iter().enumerate() {
        let Some(value) = parse_number(token) else { continue };
        let other_unit = tokens
            .get(index + 1)
            .map(|next| NON_GLUCOSE_UNITS.contains(&next.as_str()))
            .unwrap_or(false);
        if other_unit {
            continue;
        }
        let distance = keyword_positions
            .iter()
            .map(|keyword| keyword.abs_diff(index))
            .min()
            .unwrap_or(usize::MAX);
        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, value));
        }
    }
    best.map(|(_, value)| value)
}

fn extract_meal(text: &str) -> Option<(String, Option<MealCategory>)> {
    let mut remainder = split_after_meal_prefix(text)?;

    // One nested peel for phrasings like "i ate for lunch a sandwich".
    for nested in MEAL_PREFIXES {
        if let Some(rest) = remainder.strip_prefix(nested) {
            remainder = rest;
            break;
        }
    }

    let mut description = clause_head(remainder);
    for article in LEADING_ARTICLES {
        if let Some(rest) = description.strip_prefix(article) {
            description = rest;
            break;
        }
    }

    let description =
        description.trim().trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?')).trim();
    if description.is_empty() {
        return None;
    }

    Some((description.to_string(), explicit_category(text)))
}

/// Finds the first meal prefix that starts at a word boundary and returns
/// the text after it. The boundary check keeps "plate" from reading as
/// "ate".
fn split_after_meal_prefix(text: &str) -> Option<&str> {
    for prefix in MEAL_PREFIXES {
        let mut search_from = 0;
        while let Some(found) = text[search_from..].find(prefix) {
            let absolute = search_from + found;
            if absolute == 0 || text.as_bytes()[absolute - 1] == b' ' {
                return Some(&text[absolute + prefix.len()..]);
            }
            search_from = absolute + 1;
        }
    }
    None
}

fn clause_head(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut end = text.len();
    for (index, ch) in text.char_indices() {
        let boundary = match ch {
            ',' | ';' | '!' | '?' => true,
            '.' => bytes.get(index + 1).map_or(true, |next| next.is_ascii_whitespace()),
            _ => false,
        };
        if boundary {
            end = index;
            break;
        }
    }

    let mut head = &text[..end];
    for phrase in MEAL_BOUNDARIES {
        if let Some(found) = head.find(phrase) {
            head = &head[..found];
        }
    }
    head
}

fn explicit_category(text: &str) -> Option<MealCategory> {
    if text.contains("breakfast") {
        Some(MealCategory::Breakfast)
    } else if text.contains("lunch") {
        Some(MealCategory::Lunch)
    } else if text.contains("dinner") {
        Some(MealCategory::Dinner)
    } else if text.contains("snack") {
        Some(MealCategory::Snack)
    } else {
        None
    }
}

fn extract_exercise(tokens: &[String]) -> Option<(String, Option<i64>, Option<Intensity>)> {
    let activity = find_activity(tokens)?;
    Some((activity.to_string(), extract_duration(tokens), extract_intensity(tokens)))
}

fn find_activity(tokens: &[String]) -> Option<&'static str> {
    for (index, token) in tokens.iter().enumerate() {
        if matches!(token.as_str(), "work" | "worked" | "working")
            && tokens.get(index + 1).map(String::as_str) == Some("out")
        {
            return Some("workout");
        }
        if let Some((_, canonical)) =
            ACTIVITY_KEYWORDS.iter().find(|(keyword, _)| *keyword == token.as_str())
        {
            return Some(canonical);
        }
    }
    None
}

fn extract_duration(tokens: &[String]) -> Option<i64> {
    for (index, token) in tokens.iter().enumerate() {
        if let Some(value) = parse_number(token) {
            let unit_next = tokens
                .get(index + 1)
                .map(|next| DURATION_UNITS.contains(&next.as_str()))
                .unwrap_or(false);
            if unit_next {
                return Some(value.round() as i64);
            }
        } else if let Some(value) = joined_duration(token) {
            // Out-of-range values still come back so validation can name
            // the rejection instead of silently dropping the number.
            return Some(value);
        }
    }
    None
}

/// Reads "30min" style tokens where the unit is glued to the number.
fn joined_duration(token: &str) -> Option<i64> {
    for unit in DURATION_UNITS {
        if let Some(prefix) = token.strip_suffix(unit) {
            if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) {
                return prefix.parse::<i64>().ok();
            }
        }
    }
    None
}

fn extract_intensity(tokens: &[String]) -> Option<Intensity> {
    for token in tokens {
        if token.starts_with("intens") || matches!(token.as_str(), "hard" | "vigorous") {
            return Some(Intensity::High);
        }
        if matches!(token.as_str(), "light" | "easy" | "gentle" | "slow") {
            return Some(Intensity::Low);
        }
    }
    None
}

fn question_kind_lexical(tokens: &[String]) -> Option<QuestionKind> {
    if tokens.len() <= 4 && tokens.iter().any(|t| GREETINGS.contains(&t.as_str())) {
        return Some(QuestionKind::General);
    }
    if tokens.first().map(String::as_str) == Some("why") {
        return Some(QuestionKind::Pattern);
    }
    if tokens.iter().any(|t| PATTERN_WORDS.contains(&t.as_str())) {
        return Some(QuestionKind::Pattern);
    }

    let topics = topic_group_count(tokens);
    if topics >= 2 {
        return Some(QuestionKind::Pattern);
    }
    if topics >= 1 && tokens.iter().any(|t| OPTIMIZATION_WORDS.contains(&t.as_str())) {
        return Some(QuestionKind::Pattern);
    }
    None
}

fn parse_question_kind(reply: &str) -> Option<QuestionKind> {
    let normalized = reply.to_ascii_lowercase();
    if normalized.contains("pattern") {
        Some(QuestionKind::Pattern)
    } else if normalized.contains("general") {
        Some(QuestionKind::General)
    } else {
        None
    }
}
