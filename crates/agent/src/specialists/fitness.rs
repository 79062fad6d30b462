//! Exercise logging specialist. Asks for a duration when the message
//! left it out, estimates burned calories, warns when the latest glucose
//! reading makes intense exercise unsafe, and tracks weekly minutes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use carelog_core::estimates;
use carelog_core::{Intent, NewExerciseSession};
use carelog_db::repositories::{ExerciseRepository, GlucoseRepository};
use carelog_rag::{CorpusId, KnowledgeRetriever};

use crate::error::AgentError;
use crate::specialists::{guidance_lines, Specialist, SpecialistReply, DEGRADED_NOTE};

/// Above this, intense exercise can push glucose higher instead of lower.
const HIGH_GLUCOSE_EXERCISE_MG_DL: f64 = 250.0;
const WEEKLY_GOAL_MINUTES: i64 = 150;
const WEEKLY_FETCH_LIMIT: u32 = 50;
const RETRIEVAL_TOP_K: usize = 1;

pub struct FitnessSpecialist {
    exercise: Arc<dyn ExerciseRepository>,
    glucose: Arc<dyn GlucoseRepository>,
    retriever: Arc<dyn KnowledgeRetriever>,
}

impl FitnessSpecialist {
    pub fn new(
        exercise: Arc<dyn ExerciseRepository>,
        glucose: Arc<dyn GlucoseRepository>,
        retriever: Arc<dyn KnowledgeRetriever>,
    ) -> Self {
        Self { exercise, glucose, retriever }
    }

    fn motivation(minutes: i64) -> &'static str {
        if minutes >= 45 {
            "Excellent work! That's a substantial session."
        } else if minutes >= 30 {
            "Great job getting a solid workout in!"
        } else if minutes >= 15 {
            "Nice work - every session counts."
        } else {
            "Good start - even short activity helps."
        }
    }

    fn weekly_tier(total: i64) -> Option<&'static str> {
        if total >= WEEKLY_GOAL_MINUTES {
            Some("You've hit the recommended 150 minutes per week. Outstanding!")
        } else if total >= 100 {
            Some("You're closing in on the recommended 150 minutes per week.")
        } else if total >= 50 {
            Some("Good momentum. Keep building toward 150 minutes per week.")
        } else {
            None
        }
    }

    /// Checks the most recent reading. Store errors skip the check rather
    /// than blocking the log.
    async fn safety_lines(&self, user_id: i64) -> Vec<String> {
        let latest = match self.glucose.recent(user_id, 1).await {
            Ok(readings) => readings.into_iter().next(),
            Err(error) => {
                tracing::warn!(event_name = "agent.degraded", specialist = "fitness", reason = %error);
                None
            }
        };
        let Some(reading) = latest else {
            return Vec::new();
        };
        if reading.level <= HIGH_GLUCOSE_EXERCISE_MG_DL {
            return Vec::new();
        }

        let mut lines = vec![format!(
            "Heads up: your last glucose reading was {:.0} mg/dL. It's safer to hold off on intense exercise until you're back below {:.0} mg/dL.",
            reading.level, HIGH_GLUCOSE_EXERCISE_MG_DL
        )];
        let outcome = self
            .retriever
            .retrieve(
                "exercise with high blood sugar safety",
                CorpusId::ExerciseSafety,
                RETRIEVAL_TOP_K,
            )
            .await;
        let (guidance, degraded) = guidance_lines("fitness", outcome);
        lines.extend(guidance);
        if degraded {
            lines.push(DEGRADED_NOTE.to_string());
        }
        lines
    }

    async fn weekly_lines(&self, user_id: i64) -> Vec<String> {
        let sessions = match self.exercise.recent(user_id, WEEKLY_FETCH_LIMIT).await {
            Ok(sessions) => sessions,
            Err(error) => {
                tracing::warn!(event_name = "agent.degraded", specialist = "fitness", reason = %error);
                return Vec::new();
            }
        };
        let cutoff = Utc::now() - Duration::days(7);
        let total: i64 = sessions
            .iter()
            .filter(|session| session.timestamp >= cutoff)
            .map(|session| session.duration_minutes)
            .sum();

        let mut lines = vec![format!("That's {total} minutes of activity in the last 7 days.")];
        if let Some(tier) = Self::weekly_tier(total) {
            lines.push(tier.to_string());
        }
        lines
    }
}

#[async_trait]
impl Specialist for FitnessSpecialist {
    fn name(&self) -> &'static str {
        "fitness"
    }

    async fn handle(&self, user_id: i64, intent: &Intent) -> Result<SpecialistReply, AgentError> {
        let Intent::LogExercise { activity, duration_minutes, intensity } = intent else {
            return Err(AgentError::Classification);
        };

        let Some(minutes) = *duration_minutes else {
            return Ok(SpecialistReply::say(format!(
                "How long did you spend {activity}? Tell me the minutes and I'll log it."
            )));
        };
        let intensity = intensity.unwrap_or_default();
        let calories = estimates::estimate_burned_calories(activity, minutes, intensity);

        let session = NewExerciseSession {
            user_id,
            timestamp: Utc::now(),
            activity_type: activity.clone(),
            duration_minutes: minutes,
            calories_burned: calories,
            intensity,
            is_demo_data: false,
        };
        session.validate()?;
        let stored = self.exercise.add(session).await?;
        tracing::info!(
            event_name = "agent.persist",
            record = "exercise_session",
            id = stored.id,
            user_id,
            minutes,
            activity = activity.as_str()
        );

        let mut lines = vec![format!(
            "Logged {minutes} minutes of {activity} - about {calories:.0} calories burned."
        )];
        lines.extend(self.safety_lines(user_id).await);
        lines.push(Self::motivation(minutes).to_string());
        lines.extend(self.weekly_lines(user_id).await);

        Ok(SpecialistReply { text: lines.join("\n"), persisted_id: Some(stored.id) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use carelog_core::{Intensity, Intent, NewExerciseSession, NewGlucoseReading};
    use carelog_db::repositories::{
        ExerciseRepository, GlucoseRepository, InMemoryExerciseRepository,
        InMemoryGlucoseRepository,
    };
    use carelog_rag::{
        CorpusId, KnowledgeRetriever, Passage, RetrievalError, ScoredPassage,
    };

    use super::*;

    struct SafetyRetriever;

    #[async_trait]
    impl KnowledgeRetriever for SafetyRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            corpus: CorpusId,
            _top_k: usize,
        ) -> Result<Vec<ScoredPassage>, RetrievalError> {
            Ok(vec![ScoredPassage {
                passage: Passage {
                    id: "stub".to_string(),
                    corpus,
                    source: "ADA Exercise Guidelines".to_string(),
                    text: "Check for ketones before exercising above 250 mg/dL.".to_string(),
                },
                score: 0.5,
            }])
        }
    }

    struct Fixture {
        exercise: Arc<InMemoryExerciseRepository>,
        glucose: Arc<InMemoryGlucoseRepository>,
        agent: FitnessSpecialist,
    }

    fn fixture() -> Fixture {
        let exercise = Arc::new(InMemoryExerciseRepository::default());
        let glucose = Arc::new(InMemoryGlucoseRepository::default());
        let agent = FitnessSpecialist::new(
            Arc::clone(&exercise) as Arc<dyn ExerciseRepository>,
            Arc::clone(&glucose) as Arc<dyn GlucoseRepository>,
            Arc::new(SafetyRetriever),
        );
        Fixture { exercise, glucose, agent }
    }

    fn log(activity: &str, minutes: Option<i64>, intensity: Option<Intensity>) -> Intent {
        Intent::LogExercise {
            activity: activity.to_string(),
            duration_minutes: minutes,
            intensity,
        }
    }

    async fn seed_glucose(repo: &InMemoryGlucoseRepository, level: f64) {
        repo.add(NewGlucoseReading {
            user_id: 1,
            timestamp: Utc::now(),
            level,
            notes: None,
            is_demo_data: false,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn missing_duration_asks_instead_of_writing() {
        let fx = fixture();

        let reply = fx.agent.handle(1, &log("running", None, None)).await.unwrap();

        assert_eq!(reply.persisted_id, None);
        assert!(reply.text.contains("How long did you spend running?"), "reply: {}", reply.text);
        assert!(fx.exercise.recent(1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn session_logs_with_estimated_burn() {
        let fx = fixture();

        let reply = fx.agent.handle(1, &log("running", Some(30), None)).await.unwrap();

        assert!(reply.text.contains("Logged 30 minutes of running - about 300 calories burned."));
        assert!(reply.text.contains("Great job getting a solid workout in!"));
        let stored = fx.exercise.recent(1, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].intensity, Intensity::Moderate);
        assert_eq!(stored[0].calories_burned, 300.0);
    }

    #[tokio::test]
    async fn intensity_scales_the_burn_estimate() {
        let fx = fixture();

        let reply = fx
            .agent
            .handle(1, &log("running", Some(20), Some(Intensity::High)))
            .await
            .unwrap();

        assert!(reply.text.contains("about 250 calories burned"), "reply: {}", reply.text);
    }

    #[tokio::test]
    async fn high_glucose_triggers_a_safety_warning() {
        let fx = fixture();
        seed_glucose(&fx.glucose, 280.0).await;

        let reply = fx.agent.handle(1, &log("running", Some(30), None)).await.unwrap();

        assert!(reply.text.contains("280 mg/dL"), "reply: {}", reply.text);
        assert!(reply.text.contains("below 250 mg/dL"));
        assert!(reply.text.contains("Check for ketones before exercising above 250 mg/dL."));
    }

    #[tokio::test]
    async fn normal_glucose_skips_the_warning() {
        let fx = fixture();
        seed_glucose(&fx.glucose, 120.0).await;

        let reply = fx.agent.handle(1, &log("walking", Some(20), None)).await.unwrap();

        assert!(!reply.text.contains("Heads up"), "reply: {}", reply.text);
    }

    #[tokio::test]
    async fn weekly_total_counts_recent_sessions_only() {
        let fx = fixture();
        for (minutes, days_ago) in [(60_i64, 1_i64), (70, 3), (40, 20)] {
            fx.exercise
                .add(NewExerciseSession {
                    user_id: 1,
                    timestamp: Utc::now() - Duration::days(days_ago),
                    activity_type: "cycling".to_string(),
                    duration_minutes: minutes,
                    calories_burned: 100.0,
                    intensity: Intensity::Moderate,
                    is_demo_data: false,
                })
                .await
                .unwrap();
        }

        let reply = fx.agent.handle(1, &log("running", Some(30), None)).await.unwrap();

        assert!(
            reply.text.contains("That's 160 minutes of activity in the last 7 days."),
            "the 20-day-old session must not count: {}",
            reply.text
        );
        assert!(reply.text.contains("recommended 150 minutes per week. Outstanding!"));
    }

    #[tokio::test]
    async fn out_of_range_durations_never_reach_the_store() {
        let fx = fixture();

        let error = fx.agent.handle(1, &log("running", Some(500), None)).await.unwrap_err();

        assert!(matches!(error, AgentError::Validation(_)));
        assert!(fx.exercise.recent(1, 10).await.unwrap().is_empty());
    }
}
