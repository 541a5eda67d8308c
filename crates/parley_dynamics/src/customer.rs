use chrono::{DateTime, Utc};

use parley_core::config::ScoringConfig;
use parley_core::context::ContextRetention;
use parley_core::entropy::Entropy;
use parley_core::interest::InterestScore;
use parley_core::persona::{OrganizationPersona, ProductCategory};
use parley_core::proposal::{EvaluationResult, Proposal};
use parley_core::response::{RejectionReason, ResponseType};

use crate::evaluation::ProposalEvaluator;
use crate::rejection::RejectionReasonSelector;
use crate::response::ResponseClassifier;
use crate::scoring::InterestScorer;
use crate::situation::{SituationChange, SituationEvolver};
use crate::stage::NegotiationStageMachine;

/// The simulated organization's decision rules, applied to its persona.
///
/// Every method records its outcome on the organization it is handed.
#[derive(Debug, Clone, Default)]
pub struct CustomerModel {
    pub scorer: InterestScorer,
    pub classifier: ResponseClassifier,
    pub selector: RejectionReasonSelector,
    pub evaluator: ProposalEvaluator,
    pub stages: NegotiationStageMachine,
    pub evolver: SituationEvolver,
}

impl CustomerModel {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            scorer: InterestScorer::from_config(config),
            classifier: ResponseClassifier::from_config(config),
            ..Default::default()
        }
    }

    /// Scores a seller message with the keyword model, then classifies the reply.
    pub fn react(
        &self,
        org: &mut OrganizationPersona,
        message: &str,
        category: Option<ProductCategory>,
        at: DateTime<Utc>,
        entropy: &mut dyn Entropy,
    ) -> (InterestScore, ResponseType) {
        let score = self.scorer.score_at(
            message,
            category,
            &org.personality_traits,
            &org.product_interest,
            at,
        );
        let response = self.react_with_score(org, score.clone(), entropy);
        (score, response)
    }

    /// Records an externally obtained score and classifies the reply.
    pub fn react_with_score(
        &self,
        org: &mut OrganizationPersona,
        score: InterestScore,
        entropy: &mut dyn Entropy,
    ) -> ResponseType {
        let response = self
            .classifier
            .classify(score.score, &org.personality_traits, entropy);
        org.record_interest(score);
        org.record_response(response);
        response
    }

    pub fn reject(&self, org: &mut OrganizationPersona, entropy: &mut dyn Entropy) -> RejectionReason {
        let reason = self
            .selector
            .select(&org.personality_traits, org.rejection_history(), entropy);
        org.record_rejection(reason);
        reason
    }

    pub fn review_proposal(
        &self,
        org: &mut OrganizationPersona,
        proposal: &Proposal,
        at: DateTime<Utc>,
    ) -> EvaluationResult {
        let result = self
            .evaluator
            .evaluate_at(proposal, &org.financial_snapshot(), at);
        org.record_evaluation(&result);
        result
    }

    /// Housekeeping at the start of a visit: bound the context memory and
    /// take the per-visit negotiation step.
    pub fn begin_visit(
        &self,
        org: &mut OrganizationPersona,
        visit: u32,
        now: DateTime<Utc>,
        retention: &ContextRetention,
    ) {
        org.context.last_contact = Some(now);
        org.context.prune(retention, now);
        let score = org.current_score();
        if self.stages.advance(&mut org.negotiation, visit, score) {
            tracing::info!(
                "{} entered stage {} on visit {}",
                org.id,
                org.negotiation.stage.as_str(),
                visit
            );
        }
    }

    pub fn evolve(
        &self,
        org: &mut OrganizationPersona,
        days_elapsed: u32,
        entropy: &mut dyn Entropy,
    ) -> SituationChange {
        self.evolver.evolve(org, days_elapsed, entropy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::entropy::ScriptedEntropy;
    use parley_core::negotiation::NegotiationStage;
    use parley_core::persona::CustomerTrait;
    use parley_core::proposal::Decision;

    fn org() -> OrganizationPersona {
        serde_json::from_value(serde_json::json!({
            "id": "org_1",
            "name": "北斗精機株式会社",
            "industry": "製造業",
            "employee_count": 100,
            "annual_revenue": "10.0億円",
            "personality_traits": ["skeptical"],
            "risk_tolerance": 0.5,
            "financial_literacy": 0.5
        }))
        .unwrap()
    }

    #[test]
    fn test_react_records_history() {
        let model = CustomerModel::default();
        let mut o = org();
        let mut e = ScriptedEntropy::constant(0.9);
        let (score, response) = model.react(&mut o, "予算が難しい", None, Utc::now(), &mut e);
        assert!((score.score - 32.0).abs() < 1e-9);
        assert_eq!(response, ResponseType::Neutral);
        assert_eq!(o.response_history, vec![ResponseType::Neutral]);
        assert_eq!(o.context.interest_history.len(), 1);
        assert_eq!(o.current_score(), Some(score.score));
    }

    #[test]
    fn test_reject_appends_reason() {
        let model = CustomerModel::default();
        let mut o = org();
        let mut e = ScriptedEntropy::constant(0.0);
        let reason = model.reject(&mut o, &mut e);
        assert_eq!(reason, RejectionReason::BudgetConstraint);
        assert_eq!(o.rejection_history(), &[RejectionReason::BudgetConstraint]);
    }

    #[test]
    fn test_review_records_decision() {
        let model = CustomerModel::default();
        let mut o = org();
        let result = model.review_proposal(&mut o, &Proposal::new(ProductCategory::Loan), Utc::now());
        assert_eq!(result.decision, Decision::Pending);
        assert_eq!(o.decision.decision, Some(Decision::Pending));
        assert!(!o.negotiation.required_info.is_empty());
    }

    #[test]
    fn test_begin_visit_steps_stage() {
        let model = CustomerModel::default();
        let mut o = org();
        let retention = ContextRetention::default();
        model.begin_visit(&mut o, 1, Utc::now(), &retention);
        assert_eq!(o.negotiation.stage, NegotiationStage::Initial);
        model.begin_visit(&mut o, 2, Utc::now(), &retention);
        assert_eq!(o.negotiation.stage, NegotiationStage::InformationGathering);
        assert!(o.context.last_contact.is_some());
        assert!(o.has_trait(CustomerTrait::Skeptical));
    }
}
