//! Keyword-and-trait interest scoring.
//!
//! This is the deterministic scorer: given well-typed inputs it cannot fail,
//! which makes it the fallback for any external scoring collaborator.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use parley_core::config::ScoringConfig;
use parley_core::interest::{InterestScore, InterestThresholds, KeywordWeights};
use parley_core::persona::{CustomerTrait, ProductCategory};

pub const BASE_SCORE: f64 = 50.0;

/// Product of per-trait multipliers; duplicate traits count once.
pub fn trait_multiplier(traits: &[CustomerTrait]) -> f64 {
    let mut multiplier = 1.0;
    for (i, t) in traits.iter().enumerate() {
        if traits[..i].contains(t) {
            continue;
        }
        multiplier *= match t {
            CustomerTrait::Cooperative => 1.2,
            CustomerTrait::Skeptical => 0.8,
            CustomerTrait::Analytical => 0.9,
            _ => 1.0,
        };
    }
    multiplier
}

#[derive(Debug, Clone)]
pub struct InterestScorer {
    positive_keywords: Vec<String>,
    negative_keywords: Vec<String>,
    weights: KeywordWeights,
    thresholds: InterestThresholds,
}

impl Default for InterestScorer {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl InterestScorer {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            positive_keywords: config.positive_keywords.clone(),
            negative_keywords: config.negative_keywords.clone(),
            weights: config.keyword_weights(),
            thresholds: config.interest_thresholds(),
        }
    }

    pub fn thresholds(&self) -> &InterestThresholds {
        &self.thresholds
    }

    /// Sum of keyword weights present in `message`, each keyword counted once.
    pub fn content_delta(&self, message: &str) -> f64 {
        let positive = self
            .positive_keywords
            .iter()
            .filter(|k| !k.is_empty() && message.contains(k.as_str()))
            .count() as f64;
        let negative = self
            .negative_keywords
            .iter()
            .filter(|k| !k.is_empty() && message.contains(k.as_str()))
            .count() as f64;
        positive * self.weights.positive + negative * self.weights.negative
    }

    pub fn score(
        &self,
        message: &str,
        category: Option<ProductCategory>,
        traits: &[CustomerTrait],
        product_interest: &BTreeMap<ProductCategory, f64>,
    ) -> InterestScore {
        self.score_at(message, category, traits, product_interest, Utc::now())
    }

    pub fn score_at(
        &self,
        message: &str,
        category: Option<ProductCategory>,
        traits: &[CustomerTrait],
        product_interest: &BTreeMap<ProductCategory, f64>,
        at: DateTime<Utc>,
    ) -> InterestScore {
        let mut factors = BTreeMap::new();
        let multiplier = trait_multiplier(traits);
        factors.insert("trait_multiplier".to_string(), multiplier);

        let mut base = BASE_SCORE;
        if let Some(interest) = category.and_then(|c| product_interest.get(&c)) {
            let product_factor = 0.5 + interest.clamp(0.0, 1.0);
            base *= product_factor;
            factors.insert("product_interest".to_string(), product_factor);
        }
        factors.insert("base_score".to_string(), base);

        let delta = self.content_delta(message);
        factors.insert("content_analysis".to_string(), delta / 10.0);

        let score = ((base + delta) * multiplier).clamp(0.0, 100.0);
        tracing::debug!(
            "interest score {:.1} (base {:.1}, delta {:+.1}, x{:.2})",
            score,
            base,
            delta,
            multiplier
        );

        InterestScore {
            score,
            product_category: category,
            level: self.thresholds.classify(score),
            factors,
            timestamp: at,
        }
    }
}
