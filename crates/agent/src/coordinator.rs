//! Fan-out across specialists and cross-domain insight assembly. Every
//! branch runs under its own timeout; one failing branch never takes the
//! others down with it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::Instrument;

use carelog_core::Intent;
use carelog_rag::{CorpusId, KnowledgeRetriever};

use crate::analyzer::PatternAnalyzer;
use crate::error::AgentError;
use crate::router;
use crate::specialists::Specialist;
use crate::text::{normalize, tokenize};

/// One branch that could not contribute to the reply.
#[derive(Debug)]
pub struct BranchFailure {
    pub branch: &'static str,
    pub error: AgentError,
}

/// What the fan-out produced: reply sections in request order plus the
/// branches that failed outright.
#[derive(Debug, Default)]
pub struct CoordinationOutcome {
    pub sections: Vec<String>,
    pub failures: Vec<BranchFailure>,
}

impl CoordinationOutcome {
    /// Folds partial failures into the reply. Only a turn with nothing to
    /// say at all surfaces as an error.
    pub fn into_reply(self) -> Result<String, AgentError> {
        if self.sections.is_empty() {
            return Err(self
                .failures
                .into_iter()
                .next()
                .map(|failure| failure.error)
                .unwrap_or(AgentError::Classification));
        }

        let mut reply = self.sections.join("\n\n");
        for failure in &self.failures {
            reply.push_str("\n\n");
            reply.push_str(&format!(
                "I couldn't finish the {} part: {}",
                failure.branch,
                failure.error.user_message()
            ));
        }
        Ok(reply)
    }
}

pub struct InsightsCoordinator {
    diabetes: Arc<dyn Specialist>,
    nutrition: Arc<dyn Specialist>,
    fitness: Arc<dyn Specialist>,
    analyzer: Arc<PatternAnalyzer>,
    retriever: Arc<dyn KnowledgeRetriever>,
    specialist_timeout: Duration,
    top_k: usize,
}

impl InsightsCoordinator {
    pub fn new(
        diabetes: Arc<dyn Specialist>,
        nutrition: Arc<dyn Specialist>,
        fitness: Arc<dyn Specialist>,
        analyzer: Arc<PatternAnalyzer>,
        retriever: Arc<dyn KnowledgeRetriever>,
        specialist_timeout: Duration,
        top_k: usize,
    ) -> Self {
        Self { diabetes, nutrition, fitness, analyzer, retriever, specialist_timeout, top_k }
    }

    fn specialist_for(&self, intent: &Intent) -> Option<Arc<dyn Specialist>> {
        match intent {
            Intent::LogGlucose { .. } => Some(Arc::clone(&self.diabetes)),
            Intent::LogMeal { .. } => Some(Arc::clone(&self.nutrition)),
            Intent::LogExercise { .. } => Some(Arc::clone(&self.fitness)),
            Intent::PatternQuery { .. } | Intent::GeneralQuestion { .. } => None,
        }
    }

    /// Runs one specialist per structured intent, concurrently. Sections
    /// come back in the order the intents appeared in the message, with
    /// validation problems rendered as feedback instead of failures.
    pub async fn run_specialists(&self, user_id: i64, intents: Vec<Intent>) -> CoordinationOutcome {
        let timeout_secs = self.specialist_timeout.as_secs();
        let mut tasks = JoinSet::new();

        for (index, intent) in intents.into_iter().enumerate() {
            let Some(specialist) = self.specialist_for(&intent) else {
                continue;
            };
            let branch = specialist.name();
            let timeout = self.specialist_timeout;
            tasks.spawn(
                async move {
                    let result =
                        match tokio::time::timeout(timeout, specialist.handle(user_id, &intent))
                            .await
                        {
                            Ok(result) => result,
                            Err(_) => Err(AgentError::Timeout { secs: timeout_secs }),
                        };
                    (index, branch, result)
                }
                .instrument(tracing::Span::current()),
            );
        }

        let mut branches = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(branch) => branches.push(branch),
                Err(error) => {
                    tracing::error!(event_name = "coordination.partial", reason = %error, "specialist task aborted");
                }
            }
        }
        branches.sort_by_key(|(index, _, _)| *index);

        let mut outcome = CoordinationOutcome::default();
        for (_, branch, result) in branches {
            match result {
                Ok(reply) => outcome.sections.push(reply.text),
                Err(AgentError::Validation(problem)) => {
                    outcome.sections.push(problem.user_message());
                }
                Err(error) => outcome.failures.push(BranchFailure { branch, error }),
            }
        }
        outcome
    }

    /// Answers a pattern question: findings from the analyzer first, then
    /// reference passages for whichever topics the question touches.
    pub async fn cross_domain(&self, user_id: i64, question: &str) -> CoordinationOutcome {
        let mut outcome = CoordinationOutcome::default();

        match self.analyzer.analyze(user_id).await {
            Ok(findings) => {
                for finding in findings {
                    outcome.sections.push(format!("{}:\n{}", finding.title, finding.body));
                }
            }
            Err(error) => outcome.failures.push(BranchFailure { branch: "analysis", error }),
        }

        let tokens = tokenize(&normalize(question));
        let corpora = [
            (router::DIABETES_TOPIC, CorpusId::AdaGuidelines),
            (router::NUTRITION_TOPIC, CorpusId::GlycemicIndex),
            (router::FITNESS_TOPIC, CorpusId::ExerciseSafety),
        ];

        let mut seen = HashSet::new();
        let mut guidance = Vec::new();
        for (topic, corpus) in corpora {
            if !router::mentions_any(&tokens, topic) {
                continue;
            }
            match self.retriever.retrieve(question, corpus, self.top_k).await {
                Ok(passages) => {
                    for scored in passages {
                        if seen.insert(scored.passage.id.clone()) {
                            guidance.push(format!(
                                "- {}: {}",
                                scored.passage.source, scored.passage.text
                            ));
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(event_name = "agent.degraded", specialist = "coordinator", reason = %error);
                }
            }
        }
        if !guidance.is_empty() {
            outcome.sections.push(format!("From my references:\n{}", guidance.join("\n")));
        }

        outcome
    }
}
