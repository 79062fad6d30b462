//! Wires router, specialists, analyzer and responder into one entry
//! point. `process_message` is the only call sites need: text in, reply
//! text out, every turn under a correlation id.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::Instrument;
use uuid::Uuid;

use carelog_core::{AgentConfig, AppConfig, Intent, KnowledgeConfig};
use carelog_db::repositories::{
    ExerciseRepository, GlucoseRepository, MealRepository, SqlExerciseRepository,
    SqlGlucoseRepository, SqlMealRepository,
};
use carelog_db::DbPool;
use carelog_rag::{KnowledgeRetriever, LexicalIndex};

use crate::analyzer::PatternAnalyzer;
use crate::coordinator::InsightsCoordinator;
use crate::error::AgentError;
use crate::llm::{client_from_config, LlmClient};
use crate::responder::GeneralResponder;
use crate::router::Router;
use crate::specialists::{DiabetesSpecialist, FitnessSpecialist, NutritionSpecialist, Specialist};

/// The three record stores the agents write to and read from.
pub struct RuntimeStores {
    pub glucose: Arc<dyn GlucoseRepository>,
    pub meals: Arc<dyn MealRepository>,
    pub exercise: Arc<dyn ExerciseRepository>,
}

impl RuntimeStores {
    pub fn from_pool(pool: &DbPool) -> Self {
        Self {
            glucose: Arc::new(SqlGlucoseRepository::new(pool.clone())),
            meals: Arc::new(SqlMealRepository::new(pool.clone())),
            exercise: Arc::new(SqlExerciseRepository::new(pool.clone())),
        }
    }
}

pub struct AgentRuntime {
    router: Router,
    coordinator: InsightsCoordinator,
    responder: GeneralResponder,
}

impl AgentRuntime {
    pub fn new(
        stores: RuntimeStores,
        retriever: Arc<dyn KnowledgeRetriever>,
        llm: Arc<dyn LlmClient>,
        knowledge: &KnowledgeConfig,
        agent: &AgentConfig,
    ) -> Self {
        let top_k = knowledge.top_k as usize;

        let diabetes: Arc<dyn Specialist> = Arc::new(DiabetesSpecialist::new(
            Arc::clone(&stores.glucose),
            Arc::clone(&retriever),
            agent.bands,
        ));
        let nutrition: Arc<dyn Specialist> = Arc::new(NutritionSpecialist::new(
            Arc::clone(&stores.meals),
            Arc::clone(&retriever),
        ));
        let fitness: Arc<dyn Specialist> = Arc::new(FitnessSpecialist::new(
            Arc::clone(&stores.exercise),
            Arc::clone(&stores.glucose),
            Arc::clone(&retriever),
        ));
        let analyzer = Arc::new(PatternAnalyzer::new(
            stores.glucose,
            stores.meals,
            stores.exercise,
            agent.min_history as usize,
        ));
        let coordinator = InsightsCoordinator::new(
            diabetes,
            nutrition,
            fitness,
            analyzer,
            Arc::clone(&retriever),
            Duration::from_secs(agent.specialist_timeout_secs.max(1)),
            top_k,
        );

        Self {
            router: Router::new(Arc::clone(&llm)),
            coordinator,
            responder: GeneralResponder::new(retriever, llm, top_k),
        }
    }

    /// Builds the production wiring: SQL stores over `pool`, the builtin
    /// knowledge corpus, and whichever language model the config names.
    pub fn from_config(pool: &DbPool, config: &AppConfig) -> Result<Self> {
        let retriever: Arc<dyn KnowledgeRetriever> =
            Arc::new(LexicalIndex::with_builtin_corpus(config.knowledge.min_score));
        let llm = client_from_config(&config.llm)?;
        Ok(Self::new(
            RuntimeStores::from_pool(pool),
            retriever,
            llm,
            &config.knowledge,
            &config.agent,
        ))
    }

    /// Handles one user turn end to end. Partial failures degrade the
    /// reply; only a turn that produced nothing at all comes back as an
    /// error.
    pub async fn process_message(
        &self,
        user_id: i64,
        message: &str,
    ) -> Result<String, AgentError> {
        let correlation_id = Uuid::new_v4();
        let span = tracing::info_span!("message", %correlation_id, user_id);
        self.process_inner(user_id, message).instrument(span).await
    }

    async fn process_inner(&self, user_id: i64, message: &str) -> Result<String, AgentError> {
        if message.trim().is_empty() {
            return Ok(GeneralResponder::help());
        }

        let intents = self.router.route(message).await;
        tracing::info!(
            event_name = "agent.route",
            kinds = intents.iter().map(Intent::kind).collect::<Vec<_>>().join(","),
            count = intents.len()
        );

        let (structured, questions): (Vec<Intent>, Vec<Intent>) =
            intents.into_iter().partition(|intent| {
                !matches!(intent, Intent::PatternQuery { .. } | Intent::GeneralQuestion { .. })
            });

        let outcome = if !structured.is_empty() {
            self.coordinator.run_specialists(user_id, structured).await
        } else {
            match questions.into_iter().next() {
                Some(Intent::PatternQuery { question }) => {
                    self.coordinator.cross_domain(user_id, &question).await
                }
                Some(Intent::GeneralQuestion { question }) => {
                    return Ok(self.responder.respond(&question).await);
                }
                _ => return Err(AgentError::Classification),
            }
        };

        if !outcome.failures.is_empty() {
            tracing::warn!(
                event_name = "coordination.partial",
                failed = outcome.failures.len(),
                branches = outcome
                    .failures
                    .iter()
                    .map(|failure| failure.branch)
                    .collect::<Vec<_>>()
                    .join(",")
            );
        }
        outcome.into_reply()
    }
}
