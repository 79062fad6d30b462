use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four knowledge corpora specialists draw on. Each carries a source
/// label that responders print next to retrieved guidance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusId {
    AdaGuidelines,
    GlycemicIndex,
    ExerciseSafety,
    MedicationInteractions,
}

impl CorpusId {
    pub const ALL: [CorpusId; 4] = [
        CorpusId::AdaGuidelines,
        CorpusId::GlycemicIndex,
        CorpusId::ExerciseSafety,
        CorpusId::MedicationInteractions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdaGuidelines => "ada_guidelines",
            Self::GlycemicIndex => "glycemic_index",
            Self::ExerciseSafety => "exercise_safety",
            Self::MedicationInteractions => "medication_interactions",
        }
    }

    pub fn source_label(&self) -> &'static str {
        match self {
            Self::AdaGuidelines => "ADA Standards of Care",
            Self::GlycemicIndex => "Glycemic Index Database",
            Self::ExerciseSafety => "ADA Exercise Guidelines",
            Self::MedicationInteractions => "Medication Database",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Passage {
    pub id: String,
    pub corpus: CorpusId,
    pub source: String,
    pub text: String,
}

/// A passage plus its relevance score, so callers can treat weak matches
/// as misses.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f64,
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("knowledge backend unavailable: {0}")]
    Unavailable(String),
    #[error("corpus {} holds no passages", .0.as_str())]
    EmptyCorpus(CorpusId),
}
