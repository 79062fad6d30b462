use thiserror::Error;

use carelog_core::errors::ValidationError;
use carelog_db::repositories::RepositoryError;
use carelog_rag::RetrievalError;

/// Failures while handling a single message. All of these are scoped to
/// one request; none of them takes the process down. Most are caught and
/// rendered into the reply rather than propagated.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("message could not be classified")]
    Classification,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("knowledge retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),
    #[error("persistence failed: {0}")]
    Persistence(#[from] RepositoryError),
    #[error("language model call failed: {0}")]
    Llm(String),
    #[error("handler did not finish within {secs}s")]
    Timeout { secs: u64 },
}

impl AgentError {
    /// Phrasing safe to echo into a chat reply. Never leaks SQL, URLs or
    /// provider error bodies.
    pub fn user_message(&self) -> String {
        match self {
            Self::Classification => {
                "I couldn't work out what you meant there.".to_string()
            }
            Self::Validation(err) => err.user_message(),
            Self::Retrieval(_) => {
                "I couldn't reach the knowledge base just now, so this answer may be \
                 less specific than usual."
                    .to_string()
            }
            Self::Persistence(_) => {
                "I couldn't save that entry right now. Please try again in a moment.".to_string()
            }
            Self::Llm(_) => {
                "The language model is unavailable right now, so I answered from \
                 built-in guidance."
                    .to_string()
            }
            Self::Timeout { .. } => {
                "That took too long to process. Please try again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use carelog_core::errors::ValidationError;
    use carelog_db::repositories::RepositoryError;

    use super::AgentError;

    #[test]
    fn validation_messages_pass_through_verbatim() {
        let err = AgentError::Validation(ValidationError::GlucoseOutOfRange {
            level: -5.0,
            max: 600.0,
        });

        assert!(err.user_message().contains("-5 mg/dL"));
    }

    #[test]
    fn persistence_messages_hide_the_database() {
        let err = AgentError::Persistence(RepositoryError::Decode("bad row".to_string()));

        let message = err.user_message();
        assert!(message.contains("couldn't save"));
        assert!(!message.contains("bad row"));
    }

    #[test]
    fn llm_messages_hide_the_provider_error() {
        let err = AgentError::Llm("connect error: dns failure".to_string());

        assert!(!err.user_message().contains("dns"));
    }
}
