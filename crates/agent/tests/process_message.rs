//! End-to-end turns through `AgentRuntime::process_message` over
//! in-memory stores, the builtin knowledge corpus, and (by default) no
//! language model.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use carelog_agent::{AgentRuntime, DisabledLlmClient, LlmClient, RuntimeStores};
use carelog_core::{
    AgentConfig, GlucoseBands, GlucoseReading, GlucoseStats, KnowledgeConfig, NewGlucoseReading,
};
use carelog_db::repositories::{
    ExerciseRepository, GlucoseRepository, InMemoryExerciseRepository, InMemoryGlucoseRepository,
    InMemoryMealRepository, MealRepository, RepositoryError,
};
use carelog_rag::{CorpusId, KnowledgeRetriever, LexicalIndex, RetrievalError, ScoredPassage};

struct ScriptedLlm(&'static str);

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

struct BrokenLlm;

#[async_trait]
impl LlmClient for BrokenLlm {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!("connection refused"))
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

struct FailingGlucoseStore;

#[async_trait]
impl GlucoseRepository for FailingGlucoseStore {
    async fn add(&self, _reading: NewGlucoseReading) -> Result<GlucoseReading, RepositoryError> {
        Err(RepositoryError::Decode("store offline".to_string()))
    }

    async fn recent(
        &self,
        _user_id: i64,
        _limit: u32,
    ) -> Result<Vec<GlucoseReading>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn stats(
        &self,
        _user_id: i64,
        _days: u32,
    ) -> Result<Option<GlucoseStats>, RepositoryError> {
        Ok(None)
    }
}

struct Harness {
    glucose: Arc<InMemoryGlucoseRepository>,
    meals: Arc<InMemoryMealRepository>,
    exercise: Arc<InMemoryExerciseRepository>,
    runtime: AgentRuntime,
}

fn knowledge() -> KnowledgeConfig {
    KnowledgeConfig { top_k: 3, min_score: 0.1 }
}

fn agent_config() -> AgentConfig {
    AgentConfig {
        min_history: 5,
        specialist_timeout_secs: 10,
        bands: GlucoseBands::default(),
    }
}

fn build(retriever: Arc<dyn KnowledgeRetriever>, llm: Arc<dyn LlmClient>) -> Harness {
    let glucose = Arc::new(InMemoryGlucoseRepository::default());
    let meals = Arc::new(InMemoryMealRepository::default());
    let exercise = Arc::new(InMemoryExerciseRepository::default());
    let stores = RuntimeStores {
        glucose: Arc::clone(&glucose) as Arc<dyn GlucoseRepository>,
        meals: Arc::clone(&meals) as Arc<dyn MealRepository>,
        exercise: Arc::clone(&exercise) as Arc<dyn ExerciseRepository>,
    };
    let runtime = AgentRuntime::new(stores, retriever, llm, &knowledge(), &agent_config());
    Harness { glucose, meals, exercise, runtime }
}

fn harness() -> Harness {
    build(Arc::new(LexicalIndex::with_builtin_corpus(0.1)), Arc::new(DisabledLlmClient))
}

async fn seed_reading(repo: &InMemoryGlucoseRepository, days_ago: i64, hour: u32, level: f64) {
    let base = Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).single().unwrap();
    repo.add(NewGlucoseReading {
        user_id: 1,
        timestamp: base - Duration::days(days_ago),
        level,
        notes: None,
        is_demo_data: false,
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn one_message_can_log_a_meal_and_a_reading() {
    let fx = harness();

    let reply = fx
        .runtime
        .process_message(1, "I ate pasta and my blood sugar is 160")
        .await
        .unwrap();

    let glucose_at = reply.find("160 mg/dL").expect("glucose section");
    let meal_at = reply.find("Logged pasta").expect("meal section");
    assert!(glucose_at < meal_at, "glucose feedback comes first: {reply}");

    let readings = fx.glucose.recent(1, 10).await.unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].level, 160.0);
    let meals = fx.meals.recent(1, 10).await.unwrap();
    assert_eq!(meals.len(), 1);
    assert_eq!(meals[0].name, "pasta");
}

#[tokio::test]
async fn an_in_range_reading_round_trips() {
    let fx = harness();

    let reply = fx.runtime.process_message(1, "my glucose is 125").await.unwrap();

    assert!(
        reply.contains("in your target range (80-130 mg/dL)"),
        "reply: {reply}"
    );
    assert_eq!(fx.glucose.recent(1, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn repeating_a_log_message_records_it_twice() {
    let fx = harness();

    fx.runtime.process_message(1, "my glucose is 119").await.unwrap();
    fx.runtime.process_message(1, "my glucose is 119").await.unwrap();

    let readings = fx.glucose.recent(1, 10).await.unwrap();
    assert_eq!(readings.len(), 2, "logging is additive, never deduplicated");
    assert!(readings.iter().all(|reading| reading.level == 119.0));
}

#[tokio::test]
async fn impossible_readings_come_back_as_feedback_not_errors() {
    let fx = harness();

    let reply = fx.runtime.process_message(1, "my glucose is -5").await.unwrap();

    assert!(reply.contains("doesn't look right"), "reply: {reply}");
    assert!(
        fx.glucose.recent(1, 10).await.unwrap().is_empty(),
        "nothing may be stored for a rejected reading"
    );
}

#[tokio::test]
async fn thin_history_answers_pattern_questions_honestly() {
    let fx = harness();
    seed_reading(&fx.glucose, 0, 9, 110.0).await;
    seed_reading(&fx.glucose, 1, 9, 115.0).await;

    let reply = fx.runtime.process_message(1, "what are my trends").await.unwrap();

    assert!(reply.contains("Not enough data yet"), "reply: {reply}");
    assert!(reply.contains("need at least 5"), "reply: {reply}");
}

#[tokio::test]
async fn knowledge_outage_still_logs_and_says_so() {
    let fx = build(Arc::new(FailingRetriever), Arc::new(DisabledLlmClient));

    let reply = fx.runtime.process_message(1, "my blood sugar is 130").await.unwrap();

    assert!(reply.contains("in your target range"), "reply: {reply}");
    assert!(reply.contains("built-in guidance"), "degradation note expected: {reply}");
    assert_eq!(fx.glucose.recent(1, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn a_dead_model_never_blocks_a_reply() {
    let fx = build(Arc::new(LexicalIndex::with_builtin_corpus(0.1)), Arc::new(BrokenLlm));

    let reply = fx
        .runtime
        .process_message(1, "tell me something interesting")
        .await
        .unwrap();

    assert!(reply.contains("Try one of these"), "fallback help expected: {reply}");
}

#[tokio::test]
async fn a_model_verdict_can_send_a_vague_question_to_analysis() {
    let fx = build(
        Arc::new(LexicalIndex::with_builtin_corpus(0.1)),
        Arc::new(ScriptedLlm("PATTERN")),
    );

    let reply = fx.runtime.process_message(1, "am i doing ok").await.unwrap();

    assert!(reply.contains("Not enough data yet"), "reply: {reply}");
}

#[tokio::test]
async fn one_failing_store_leaves_the_other_entry_standing() {
    let meals = Arc::new(InMemoryMealRepository::default());
    let stores = RuntimeStores {
        glucose: Arc::new(FailingGlucoseStore),
        meals: Arc::clone(&meals) as Arc<dyn MealRepository>,
        exercise: Arc::new(InMemoryExerciseRepository::default()),
    };
    let runtime = AgentRuntime::new(
        stores,
        Arc::new(LexicalIndex::with_builtin_corpus(0.1)),
        Arc::new(DisabledLlmClient),
        &knowledge(),
        &agent_config(),
    );

    let reply = runtime
        .process_message(1, "I ate pasta and my glucose is 160")
        .await
        .unwrap();

    assert!(reply.contains("Logged pasta"), "reply: {reply}");
    assert!(reply.contains("I couldn't finish the diabetes part"), "reply: {reply}");
    assert!(!reply.contains("store offline"), "internal detail leaked: {reply}");
    assert_eq!(meals.recent(1, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn exercise_without_a_duration_asks_instead_of_guessing() {
    let fx = harness();

    let reply = fx.runtime.process_message(1, "went for a run").await.unwrap();

    assert!(reply.contains("How long did you spend running?"), "reply: {reply}");
    assert!(fx.exercise.recent(1, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn a_timed_run_logs_with_burned_calories() {
    let fx = harness();

    let reply = fx.runtime.process_message(1, "I ran for 30 minutes").await.unwrap();

    assert!(
        reply.contains("Logged 30 minutes of running - about 300 calories burned."),
        "reply: {reply}"
    );
    let sessions = fx.exercise.recent(1, 10).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].duration_minutes, 30);
}

#[tokio::test]
async fn a_recent_high_reading_flags_the_workout() {
    let fx = harness();
    fx.runtime.process_message(1, "my glucose is 280").await.unwrap();

    let reply = fx.runtime.process_message(1, "I ran for 30 minutes").await.unwrap();

    assert!(reply.contains("280 mg/dL"), "reply: {reply}");
    assert!(reply.contains("hold off on intense exercise"), "reply: {reply}");
}

#[tokio::test]
async fn pattern_questions_surface_real_findings() {
    let fx = harness();
    for day in 0..6 {
        seed_reading(&fx.glucose, day, 8, 100.0).await;
        seed_reading(&fx.glucose, day, 20, 145.0).await;
    }

    let reply = fx
        .runtime
        .process_message(1, "why is my glucose high in the evening")
        .await
        .unwrap();

    assert!(reply.contains("Time of day"), "reply: {reply}");
    assert!(reply.contains("mg/dL spread"), "reply: {reply}");
}

#[tokio::test]
async fn general_questions_answer_from_the_corpus_without_a_model() {
    let fx = harness();

    let reply = fx
        .runtime
        .process_message(1, "tell me about metformin side effects")
        .await
        .unwrap();

    assert!(
        reply.contains("metformin") || reply.contains("Metformin"),
        "reply should quote medication guidance: {reply}"
    );
}

#[tokio::test]
async fn blank_messages_get_the_capabilities_note() {
    let fx = harness();

    let reply = fx.runtime.process_message(1, "   ").await.unwrap();

    assert!(reply.contains("Try one of these"), "reply: {reply}");
    assert!(reply.contains("My blood sugar is 120"));
}
