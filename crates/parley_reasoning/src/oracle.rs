use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::BTreeMap;

use parley_core::interest::InterestScore;
use parley_core::persona::{OrganizationPersona, ProductCategory};
use parley_dynamics::InterestScorer;

use crate::api_types::ChatMessage;
use crate::extraction::{generate_structured, GenerationSettings};
use crate::llm::LlmClient;
use crate::prompts;

/// The collaborator's reading of how interested the contact is.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InterestEstimate {
    /// 興味度（0-100）
    pub score: f64,
    /// 判断理由
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Interest scoring delegated to the collaborator, with the keyword model as
/// the fallback for any failure.
pub struct InterestOracle<'a> {
    client: &'a dyn LlmClient,
    settings: &'a GenerationSettings,
    scorer: &'a InterestScorer,
}

impl<'a> InterestOracle<'a> {
    pub fn new(
        client: &'a dyn LlmClient,
        settings: &'a GenerationSettings,
        scorer: &'a InterestScorer,
    ) -> Self {
        Self {
            client,
            settings,
            scorer,
        }
    }

    pub async fn estimate(
        &self,
        org: &OrganizationPersona,
        message: &str,
        category: Option<ProductCategory>,
        at: DateTime<Utc>,
    ) -> InterestScore {
        let messages = [
            ChatMessage::system(prompts::INTEREST_SYSTEM_PROMPT),
            ChatMessage::user(prompts::interest_estimate(org, message)),
        ];
        match generate_structured::<InterestEstimate>(
            self.client,
            &messages,
            "InterestEstimate",
            self.settings,
        )
        .await
        {
            Ok(estimate) if estimate.score.is_finite() => {
                let score = estimate.score.clamp(0.0, 100.0);
                let mut factors = BTreeMap::new();
                factors.insert("llm_estimate".to_string(), score);
                tracing::debug!(
                    "{} interest estimated at {:.1}: {}",
                    org.id,
                    score,
                    estimate.reasoning.as_deref().unwrap_or("-")
                );
                InterestScore {
                    score,
                    product_category: category,
                    level: self.scorer.thresholds().classify(score),
                    factors,
                    timestamp: at,
                }
            }
            Ok(_) => {
                tracing::warn!("interest estimate for {} was not a number, using keyword model", org.id);
                self.keyword_score(org, message, category, at)
            }
            Err(e) => {
                tracing::warn!("interest estimate for {} failed ({}), using keyword model", org.id, e);
                self.keyword_score(org, message, category, at)
            }
        }
    }

    fn keyword_score(
        &self,
        org: &OrganizationPersona,
        message: &str,
        category: Option<ProductCategory>,
        at: DateTime<Utc>,
    ) -> InterestScore {
        self.scorer.score_at(
            message,
            category,
            &org.personality_traits,
            &org.product_interest,
            at,
        )
    }
}
