use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::proposal::{Decision, EvaluationCriterion, EvaluationResult};

/// Phases of a multi-visit negotiation, in their only permitted order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStage {
    #[default]
    Initial,
    InformationGathering,
    DetailedReview,
    FinalEvaluation,
    DecisionMaking,
}

impl NegotiationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationStage::Initial => "initial",
            NegotiationStage::InformationGathering => "information_gathering",
            NegotiationStage::DetailedReview => "detailed_review",
            NegotiationStage::FinalEvaluation => "final_evaluation",
            NegotiationStage::DecisionMaking => "decision_making",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationProgress {
    pub stage: NegotiationStage,
    #[serde(default)]
    pub key_concerns: Vec<String>,
    #[serde(default)]
    pub required_info: Vec<String>,
    #[serde(default)]
    pub evaluation_points: BTreeMap<EvaluationCriterion, f64>,
    pub last_updated: DateTime<Utc>,
}

impl Default for NegotiationProgress {
    fn default() -> Self {
        Self {
            stage: NegotiationStage::Initial,
            key_concerns: Vec::new(),
            required_info: Vec::new(),
            evaluation_points: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

impl NegotiationProgress {
    /// Moves to `next` if it is strictly later. Returns whether the stage changed.
    pub fn advance_to(&mut self, next: NegotiationStage) -> bool {
        if next <= self.stage {
            return false;
        }
        tracing::debug!(
            "negotiation stage {} -> {}",
            self.stage.as_str(),
            next.as_str()
        );
        self.stage = next;
        self.last_updated = Utc::now();
        true
    }

    /// Records scores, concerns and outstanding information from an evaluation.
    /// A rendered success or failure moves the negotiation into decision making.
    pub fn absorb_evaluation(&mut self, result: &EvaluationResult) {
        for (criterion, score) in &result.scores {
            self.evaluation_points.insert(*criterion, *score);
        }
        for concern in &result.concerns {
            if !self.key_concerns.contains(concern) {
                self.key_concerns.push(concern.clone());
            }
        }
        self.required_info = result.required_info.clone().unwrap_or_default();
        self.last_updated = result.evaluated_at;

        if matches!(result.decision, Decision::Success | Decision::Failed) {
            self.advance_to(NegotiationStage::DecisionMaking);
        }
    }
}

/// The organization's latest rendered judgement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision: Option<Decision>,
    pub reason: String,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl DecisionRecord {
    pub fn from_evaluation(result: &EvaluationResult) -> Self {
        let mut reason = match result.final_score {
            Some(score) => format!("総合スコア{:.2}", score),
            None => "判断材料不足".to_string(),
        };
        reason.push_str(&format!("、基準充足率{:.0}%", result.met_ratio * 100.0));
        if !result.concerns.is_empty() {
            reason.push_str(&format!("、懸念事項: {}", result.concerns.join("・")));
        }
        Self {
            decision: Some(result.decision),
            reason,
            recorded_at: Some(result.evaluated_at),
        }
    }
}
