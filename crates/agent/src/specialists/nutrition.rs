//! Meal logging specialist. Estimates nutrition from the description,
//! slots the meal into a category, and pulls glycemic guidance for
//! carb-heavy entries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, Timelike, Utc};

use carelog_core::estimates;
use carelog_core::{Intent, MealCategory, NewMeal};
use carelog_db::repositories::MealRepository;
use carelog_rag::{CorpusId, KnowledgeRetriever};

use crate::error::AgentError;
use crate::specialists::{guidance_lines, Specialist, SpecialistReply, DEGRADED_NOTE};

const HIGH_CARBS_G: f64 = 60.0;
const GOOD_PROTEIN_G: f64 = 20.0;
const LIGHT_MEAL_CALORIES: f64 = 300.0;
const RETRIEVAL_TOP_K: usize = 1;

pub struct NutritionSpecialist {
    meals: Arc<dyn MealRepository>,
    retriever: Arc<dyn KnowledgeRetriever>,
}

impl NutritionSpecialist {
    pub fn new(meals: Arc<dyn MealRepository>, retriever: Arc<dyn KnowledgeRetriever>) -> Self {
        Self { meals, retriever }
    }

    fn insight(estimate: &estimates::MealEstimate) -> &'static str {
        if estimate.protein >= GOOD_PROTEIN_G {
            "Good protein content supports stable blood sugar."
        } else if estimate.carbs > HIGH_CARBS_G {
            "This meal is high in carbs - consider pairing it with protein or fiber."
        } else if estimate.calories < LIGHT_MEAL_CALORIES {
            "A light meal. Make sure you're eating enough across the day."
        } else {
            "A balanced choice."
        }
    }
}

/// Explicit slot words beat the clock. A bare "I ate eggs" falls back to
/// whatever mealtime the local hour suggests.
fn category_for(explicit: Option<MealCategory>, description: &str, hour: u32) -> MealCategory {
    explicit.unwrap_or_else(|| estimates::categorize_meal(description, hour))
}

#[async_trait]
impl Specialist for NutritionSpecialist {
    fn name(&self) -> &'static str {
        "nutrition"
    }

    async fn handle(&self, user_id: i64, intent: &Intent) -> Result<SpecialistReply, AgentError> {
        let Intent::LogMeal { description, category } = intent else {
            return Err(AgentError::Classification);
        };

        let estimate = estimates::estimate_meal(description);
        let category = category_for(*category, description, Local::now().hour());

        let meal = NewMeal {
            user_id,
            timestamp: Utc::now(),
            name: description.clone(),
            category,
            calories: estimate.calories,
            carbs: estimate.carbs,
            protein: estimate.protein,
            fat: estimate.fat,
            is_demo_data: false,
        };
        meal.validate()?;
        let stored = self.meals.add(meal).await?;
        tracing::info!(
            event_name = "agent.persist",
            record = "meal",
            id = stored.id,
            user_id,
            category = category.label()
        );

        let mut lines = vec![
            format!(
                "Logged {} as {}: about {:.0} calories ({:.0}g carbs, {:.0}g protein, {:.0}g fat). These numbers are estimates.",
                description,
                category.label(),
                estimate.calories,
                estimate.carbs,
                estimate.protein,
                estimate.fat
            ),
            Self::insight(&estimate).to_string(),
        ];

        if estimate.carbs > HIGH_CARBS_G {
            let outcome = self
                .retriever
                .retrieve(description, CorpusId::GlycemicIndex, RETRIEVAL_TOP_K)
                .await;
            let (guidance, degraded) = guidance_lines("nutrition", outcome);
            lines.extend(guidance);
            if degraded {
                lines.push(DEGRADED_NOTE.to_string());
            }
        }

        Ok(SpecialistReply { text: lines.join("\n"), persisted_id: Some(stored.id) })
    }
}
