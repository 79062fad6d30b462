//! Corpus-grounded retrieval for specialist responses.

pub mod corpus;
pub mod index;
pub mod seed;

use async_trait::async_trait;

pub use corpus::{CorpusId, Passage, RetrievalError, ScoredPassage};
pub use index::LexicalIndex;
pub use seed::builtin_passages;

/// Backend seam for knowledge lookup. The default backend is the
/// in-process [`LexicalIndex`] seeded with the built-in corpus.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        corpus: CorpusId,
        top_k: usize,
    ) -> Result<Vec<ScoredPassage>, RetrievalError>;
}
