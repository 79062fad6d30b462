//! General question answering. Picks a corpus from the question's
//! vocabulary, grounds the language model in the retrieved passages, and
//! degrades to direct excerpts or a capabilities note rather than failing
//! the turn.

use std::sync::Arc;

use carelog_rag::{CorpusId, KnowledgeRetriever, ScoredPassage};

use crate::llm::LlmClient;
use crate::prompts;
use crate::router;
use crate::text::{normalize, tokenize};

const MEDICATION_WORDS: &[&str] = &[
    "medication",
    "medications",
    "med",
    "meds",
    "metformin",
    "insulin",
    "prescription",
    "steroid",
    "prednisone",
];

pub struct GeneralResponder {
    retriever: Arc<dyn KnowledgeRetriever>,
    llm: Arc<dyn LlmClient>,
    top_k: usize,
}

impl GeneralResponder {
    pub fn new(
        retriever: Arc<dyn KnowledgeRetriever>,
        llm: Arc<dyn LlmClient>,
        top_k: usize,
    ) -> Self {
        Self { retriever, llm, top_k }
    }

    /// Capabilities note, also used verbatim for blank messages.
    pub fn help() -> String {
        [
            "I can log glucose readings, meals and exercise, and answer questions about your patterns.",
            "Try one of these:",
            "- \"My blood sugar is 120\"",
            "- \"I ate oatmeal for breakfast\"",
            "- \"I walked for 30 minutes\"",
            "- \"Why is my glucose high in the morning?\"",
        ]
        .join("\n")
    }

    /// Always produces an answer. Retrieval misses fall back to the
    /// capabilities note, a dead language model to direct excerpts.
    pub async fn respond(&self, question: &str) -> String {
        let tokens = tokenize(&normalize(question));
        let corpus = corpus_for_question(&tokens);

        let passages = match self.retriever.retrieve(question, corpus, self.top_k).await {
            Ok(passages) if !passages.is_empty() => passages,
            Ok(_) => return Self::help(),
            Err(error) => {
                tracing::warn!(event_name = "agent.degraded", specialist = "responder", reason = %error);
                return Self::help();
            }
        };

        let prompt = prompts::grounded_answer(question, &passages);
        match self.llm.complete(&prompt).await {
            Ok(answer) => answer,
            Err(error) => {
                tracing::warn!(event_name = "agent.degraded", specialist = "responder", reason = %error);
                quoted_passages(&passages)
            }
        }
    }
}

fn corpus_for_question(tokens: &[String]) -> CorpusId {
    if router::mentions_any(tokens, MEDICATION_WORDS) {
        CorpusId::MedicationInteractions
    } else if router::mentions_any(tokens, router::NUTRITION_TOPIC) {
        CorpusId::GlycemicIndex
    } else if router::mentions_any(tokens, router::FITNESS_TOPIC) {
        CorpusId::ExerciseSafety
    } else {
        CorpusId::AdaGuidelines
    }
}

fn quoted_passages(passages: &[ScoredPassage]) -> String {
    let mut lines = vec!["Here's what I found:".to_string()];
    lines.extend(
        passages
            .iter()
            .map(|scored| format!("- {}: {}", scored.passage.source, scored.passage.text)),
    );
    lines.push("Ask your care team how this applies to you.".to_string());
    lines.join("\n")
}
