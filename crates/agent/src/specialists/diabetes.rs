//! Glucose logging specialist. Classifies each reading against the
//! configured bands, flags urgent lows, and folds a 7-day average into
//! the reply when enough history exists.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use carelog_core::{GlucoseBands, GlucoseStats, GlucoseZone, Intent, NewGlucoseReading};
use carelog_db::repositories::GlucoseRepository;
use carelog_rag::{CorpusId, KnowledgeRetriever};

use crate::error::AgentError;
use crate::specialists::{guidance_lines, Specialist, SpecialistReply, DEGRADED_NOTE};

/// Below this a reading needs treatment now, whatever the configured bands say.
const URGENT_LOW_MG_DL: f64 = 70.0;
const AVERAGE_WINDOW_DAYS: u32 = 7;
const RETRIEVAL_TOP_K: usize = 1;

pub struct DiabetesSpecialist {
    glucose: Arc<dyn GlucoseRepository>,
    retriever: Arc<dyn KnowledgeRetriever>,
    bands: GlucoseBands,
}

impl DiabetesSpecialist {
    pub fn new(
        glucose: Arc<dyn GlucoseRepository>,
        retriever: Arc<dyn KnowledgeRetriever>,
        bands: GlucoseBands,
    ) -> Self {
        Self { glucose, retriever, bands }
    }

    fn zone_phrase(&self, zone: GlucoseZone) -> String {
        match zone {
            GlucoseZone::Low => "below your target range".to_string(),
            GlucoseZone::InRange => format!(
                "in your target range ({:.0}-{:.0} mg/dL)",
                self.bands.low_below, self.bands.in_range_max
            ),
            GlucoseZone::Elevated => format!(
                "above your target range (over {:.0} mg/dL)",
                self.bands.in_range_max
            ),
            GlucoseZone::High => format!(
                "well above your target range (over {:.0} mg/dL)",
                self.bands.elevated_max
            ),
        }
    }

    fn fallback_advice(&self, level: f64, zone: GlucoseZone) -> String {
        if level < URGENT_LOW_MG_DL {
            return "Treat this now: take 15 grams of fast-acting carbs and recheck in 15 minutes."
                .to_string();
        }
        match zone {
            GlucoseZone::Low => {
                "You're running a little low. A small snack now and a recheck in 15 minutes is a good idea."
                    .to_string()
            }
            GlucoseZone::InRange => "Keep doing what you're doing.".to_string(),
            GlucoseZone::Elevated => {
                "Drink some water and consider a 15 minute walk to help bring it down.".to_string()
            }
            GlucoseZone::High => format!(
                "Drink water and keep an eye on it. If it stays above {:.0} mg/dL, contact your care provider.",
                self.bands.elevated_max
            ),
        }
    }

    fn retrieval_query(zone: GlucoseZone) -> &'static str {
        match zone {
            GlucoseZone::Low => "treat low blood sugar hypoglycemia fast acting carbs",
            GlucoseZone::InRange => "blood glucose target range before meals",
            GlucoseZone::Elevated => "elevated glucose after meals lower naturally",
            GlucoseZone::High => "very high blood sugar hyperglycemia what to do",
        }
    }

    fn average_line(stats: &GlucoseStats) -> String {
        format!(
            "Your {}-day average is {:.0} mg/dL across {} readings.",
            AVERAGE_WINDOW_DAYS, stats.average, stats.reading_count
        )
    }
}

#[async_trait]
impl Specialist for DiabetesSpecialist {
    fn name(&self) -> &'static str {
        "diabetes"
    }

    async fn handle(&self, user_id: i64, intent: &Intent) -> Result<SpecialistReply, AgentError> {
        let Intent::LogGlucose { level, notes } = intent else {
            return Err(AgentError::Classification);
        };
        let level = *level;

        let reading = NewGlucoseReading {
            user_id,
            timestamp: Utc::now(),
            level,
            notes: notes.clone(),
            is_demo_data: false,
        };
        reading.validate()?;
        let stored = self.glucose.add(reading).await?;
        tracing::info!(
            event_name = "agent.persist",
            record = "glucose_reading",
            id = stored.id,
            user_id,
            level
        );

        let zone = self.bands.classify(level);
        let mut lines = vec![format!(
            "Logged your glucose reading of {:.0} mg/dL - that's {}.",
            level,
            self.zone_phrase(zone)
        )];

        // Skip the average while there is only the reading we just wrote.
        match self.glucose.stats(user_id, AVERAGE_WINDOW_DAYS).await {
            Ok(Some(stats)) if stats.reading_count >= 2 => lines.push(Self::average_line(&stats)),
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(event_name = "agent.degraded", specialist = "diabetes", reason = %error);
            }
        }

        lines.push(self.fallback_advice(level, zone));

        let outcome = self
            .retriever
            .retrieve(Self::retrieval_query(zone), CorpusId::AdaGuidelines, RETRIEVAL_TOP_K)
            .await;
        let (guidance, degraded) = guidance_lines("diabetes", outcome);
        lines.extend(guidance);
        if degraded {
            lines.push(DEGRADED_NOTE.to_string());
        }

        Ok(SpecialistReply { text: lines.join("\n"), persisted_id: Some(stored.id) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use carelog_core::{GlucoseBands, Intent};
    use carelog_db::repositories::{GlucoseRepository, InMemoryGlucoseRepository};
    use carelog_rag::{
        CorpusId, KnowledgeRetriever, Passage, RetrievalError, ScoredPassage,
    };

    use super::*;

    struct StaticRetriever;

    #[async_trait]
    impl KnowledgeRetriever for StaticRetriever {
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
                    source: "ADA Standards of Care".to_string(),
                    text: "Check again before driving.".to_string(),
                },
                score: 0.5,
            }])
        }
    }

    struct FailingRetriever;

    #[async_trait]
    impl KnowledgeRetriever for FailingRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            _corpus: CorpusId,
            _top_k: usize,
        ) -> Result<Vec<ScoredPassage>, RetrievalError> {
            Err(RetrievalError::Unavailable("index offline".to_string()))
        }
    }

    fn specialist(
        glucose: Arc<InMemoryGlucoseRepository>,
        retriever: Arc<dyn KnowledgeRetriever>,
    ) -> DiabetesSpecialist {
        DiabetesSpecialist::new(glucose, retriever, GlucoseBands::default())
    }

    fn log(level: f64) -> Intent {
        Intent::LogGlucose { level, notes: None }
    }

    #[tokio::test]
    async fn in_range_ceiling_is_inclusive() {
        let repo = Arc::new(InMemoryGlucoseRepository::default());
        let agent = specialist(repo, Arc::new(StaticRetriever));

        let at_ceiling = agent.handle(1, &log(130.0)).await.unwrap();
        let past_ceiling = agent.handle(1, &log(131.0)).await.unwrap();

        assert!(
            at_ceiling.text.contains("in your target range (80-130 mg/dL)"),
            "130 should read as in range: {}",
            at_ceiling.text
        );
        assert!(
            past_ceiling.text.contains("above your target range (over 130 mg/dL)"),
            "131 should read as elevated: {}",
            past_ceiling.text
        );
    }

    #[tokio::test]
    async fn urgent_lows_get_treatment_advice() {
        let repo = Arc::new(InMemoryGlucoseRepository::default());
        let agent = specialist(repo, Arc::new(StaticRetriever));

        let urgent = agent.handle(1, &log(62.0)).await.unwrap();
        let mild = agent.handle(1, &log(75.0)).await.unwrap();

        assert!(urgent.text.contains("Treat this now"), "62 is urgent: {}", urgent.text);
        assert!(mild.text.contains("small snack"), "75 is a mild low: {}", mild.text);
        assert!(!mild.text.contains("Treat this now"));
    }

    #[tokio::test]
    async fn average_appears_once_history_exists() {
        let repo = Arc::new(InMemoryGlucoseRepository::default());
        let agent = specialist(Arc::clone(&repo), Arc::new(StaticRetriever));

        let first = agent.handle(1, &log(120.0)).await.unwrap();
        assert!(
            !first.text.contains("7-day average"),
            "first reading has no history to average: {}",
            first.text
        );

        let second = agent.handle(1, &log(100.0)).await.unwrap();
        assert!(
            second.text.contains("Your 7-day average is 110 mg/dL across 2 readings."),
            "second reading should summarize both: {}",
            second.text
        );
    }

    #[tokio::test]
    async fn reading_persists_with_the_reply() {
        let repo = Arc::new(InMemoryGlucoseRepository::default());
        let agent = specialist(Arc::clone(&repo), Arc::new(StaticRetriever));

        let reply = agent.handle(7, &log(118.0)).await.unwrap();

        assert!(reply.persisted_id.is_some());
        assert!(reply.text.contains("Check again before driving."));
        let stored = repo.recent(7, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].level, 118.0);
    }

    #[tokio::test]
    async fn invalid_readings_never_reach_the_store() {
        let repo = Arc::new(InMemoryGlucoseRepository::default());
        let agent = specialist(Arc::clone(&repo), Arc::new(StaticRetriever));

        let error = agent.handle(1, &log(-5.0)).await.unwrap_err();

        assert!(matches!(error, AgentError::Validation(_)));
        assert!(repo.recent(1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retrieval_outage_degrades_but_still_answers() {
        let repo = Arc::new(InMemoryGlucoseRepository::default());
        let agent = specialist(Arc::clone(&repo), Arc::new(FailingRetriever));

        let reply = agent.handle(1, &log(152.0)).await.unwrap();

        assert!(reply.persisted_id.is_some(), "the write must not depend on retrieval");
        assert!(reply.text.contains("built-in guidance"), "reply: {}", reply.text);
        assert!(reply.text.contains("15 minute walk"));
    }
}
