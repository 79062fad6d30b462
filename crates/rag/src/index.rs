use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;

use crate::corpus::{CorpusId, Passage, RetrievalError, ScoredPassage};
use crate::seed::builtin_passages;
use crate::KnowledgeRetriever;

/// Function words that would otherwise dominate the similarity signal.
const STOPWORDS: &[&str] = &[
    "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "for", "from", "how",
    "if", "in", "is", "it", "my", "of", "on", "or", "such", "than", "that", "the", "then",
    "this", "to", "was", "what", "when", "which", "while", "with", "you", "your",
];

/// In-process retrieval over token-frequency vectors.
///
/// Passages and queries are reduced to term-frequency maps; relevance is
/// the cosine between them. Scores below `min_score` are dropped so weak
/// lexical overlap reads as a miss, not a match.
pub struct LexicalIndex {
    min_score: f64,
    entries: Vec<IndexedPassage>,
}

struct IndexedPassage {
    passage: Passage,
    terms: HashMap<String, f64>,
    norm: f64,
}

impl LexicalIndex {
    pub fn new(min_score: f64) -> Self {
        Self { min_score, entries: Vec::new() }
    }

    pub fn with_builtin_corpus(min_score: f64) -> Self {
        let mut index = Self::new(min_score);
        for passage in builtin_passages() {
            index.insert(passage);
        }
        index
    }

    pub fn insert(&mut self, passage: Passage) {
        let terms = term_frequencies(&passage.text);
        let norm = norm_of(&terms);
        self.entries.push(IndexedPassage { passage, terms, norm });
    }

    fn search(
        &self,
        query: &str,
        corpus: CorpusId,
        top_k: usize,
    ) -> Result<Vec<ScoredPassage>, RetrievalError> {
        if !self.entries.iter().any(|e| e.passage.corpus == corpus) {
            return Err(RetrievalError::EmptyCorpus(corpus));
        }

        let query_terms = term_frequencies(query);
        let query_norm = norm_of(&query_terms);

        let mut scored: Vec<ScoredPassage> = self
            .entries
            .iter()
            .filter(|e| e.passage.corpus == corpus)
            .filter_map(|e| {
                let score = cosine(&query_terms, query_norm, &e.terms, e.norm);
                (score >= self.min_score)
                    .then(|| ScoredPassage { passage: e.passage.clone(), score })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[async_trait]
impl KnowledgeRetriever for LexicalIndex {
    async fn retrieve(
        &self,
        query: &str,
        corpus: CorpusId,
        top_k: usize,
    ) -> Result<Vec<ScoredPassage>, RetrievalError> {
        self.search(query, corpus, top_k)
    }
}

fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut terms = HashMap::new();
    for token in text.split(|c: char| !c.is_alphanumeric()) {
        if token.len() < 2 {
            continue;
        }
        let token = token.to_lowercase();
        if STOPWORDS.contains(&token.as_str()) {
            continue;
        }
        *terms.entry(token).or_insert(0.0) += 1.0;
    }
    terms
}

fn norm_of(terms: &HashMap<String, f64>) -> f64 {
    terms.values().map(|v| v * v).sum::<f64>().sqrt()
}

fn cosine(
    query: &HashMap<String, f64>,
    query_norm: f64,
    passage: &HashMap<String, f64>,
    passage_norm: f64,
) -> f64 {
    if query_norm == 0.0 || passage_norm == 0.0 {
        return 0.0;
    }
    let dot: f64 = query
        .iter()
        .filter_map(|(term, weight)| passage.get(term).map(|pw| weight * pw))
        .sum();
    dot / (query_norm * passage_norm)
}
