//! Prompt builders. The model is only ever asked to do two things:
//! arbitrate what kind of question it is looking at, and phrase an answer
//! from retrieved passages. It never produces values that get persisted.

use carelog_rag::ScoredPassage;

/// Tiebreak prompt used when the lexical pass finds nothing to log and no
/// clear question signal. The reply is parsed for a single keyword.
pub fn question_kind(message: &str) -> String {
    format!(
        "You route messages for a health logging assistant. Decide whether the \
         message below asks about the user's own logged history and trends, or \
         about general health knowledge.\n\
         Reply with exactly one word: PATTERN or GENERAL.\n\n\
         Message: {message}"
    )
}

/// Answer prompt grounded in retrieved corpus passages.
pub fn grounded_answer(question: &str, passages: &[ScoredPassage]) -> String {
    let mut context = String::new();
    for scored in passages {
        context.push_str("- [");
        context.push_str(&scored.passage.source);
        context.push_str("] ");
        context.push_str(&scored.passage.text);
        context.push('\n');
    }

    format!(
        "You are a careful assistant for someone tracking glucose, meals and \
         exercise. Answer the question using only the context below, in under \
         120 words, and remind the user to confirm any change with their care \
         team. If the context does not cover the question, say so plainly.\n\n\
         Context:\n{context}\nQuestion: {question}"
    )
}
