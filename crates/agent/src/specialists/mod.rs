//! Specialist agents. Each one turns a routed intent into at most one
//! persisted record plus feedback text, grounded in retrieved guidance
//! when the knowledge backend cooperates and in built-in thresholds when
//! it does not.

use async_trait::async_trait;

use carelog_core::Intent;
use carelog_rag::{RetrievalError, ScoredPassage};

use crate::error::AgentError;

pub mod diabetes;
pub mod fitness;
pub mod nutrition;

pub use diabetes::DiabetesSpecialist;
pub use fitness::FitnessSpecialist;
pub use nutrition::NutritionSpecialist;

/// Outcome of one specialist run. `persisted_id` is `None` when the turn
/// ended in a clarification question instead of a write.
#[derive(Clone, Debug, PartialEq)]
pub struct SpecialistReply {
    pub text: String,
    pub persisted_id: Option<i64>,
}

impl SpecialistReply {
    pub fn say(text: String) -> Self {
        Self { text, persisted_id: None }
    }
}

#[async_trait]
pub trait Specialist: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extracts, validates, persists and explains one entry. Validation
    /// runs before any write; a failed write surfaces as
    /// [`AgentError::Persistence`] without affecting sibling intents.
    async fn handle(&self, user_id: i64, intent: &Intent) -> Result<SpecialistReply, AgentError>;
}

pub(crate) const DEGRADED_NOTE: &str =
    "Note: I couldn't check the reference guidelines just now, so this is built-in guidance.";

/// Renders retrieval results into reply lines. An empty result set counts
/// as degraded the same as a failing backend: the reply still goes out,
/// built on static thresholds, and says so.
pub(crate) fn guidance_lines(
    specialist: &'static str,
    outcome: Result<Vec<ScoredPassage>, RetrievalError>,
) -> (Vec<String>, bool) {
    match outcome {
        Ok(passages) if !passages.is_empty() => (
            passages
                .iter()
                .map(|scored| format!("{}: {}", scored.passage.source, scored.passage.text))
                .collect(),
            false,
        ),
        Ok(_) => {
            tracing::warn!(event_name = "agent.degraded", specialist, reason = "no_passages");
            (Vec::new(), true)
        }
        Err(error) => {
            tracing::warn!(event_name = "agent.degraded", specialist, reason = %error);
            (Vec::new(), true)
        }
    }
}
