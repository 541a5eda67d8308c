//! Multi-criteria proposal evaluation.
//!
//! Six independent scorers, each clamped to `[0, 1]`, feed a readiness gate.
//! Proposals that pass the gate receive a composite score and a decision;
//! the rest stay pending with a list of what the organization still needs.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use parley_core::persona::{CustomerTrait, ProductCategory};
use parley_core::proposal::{
    is_truthy, value_as_f64, Decision, EvaluationCriterion, EvaluationResult, FinancialSnapshot,
    Proposal,
};

/// Criterion score below which a concern is raised.
pub const CONCERN_THRESHOLD: f64 = 0.6;
/// Criterion score at or above which the criterion counts as met.
pub const MET_THRESHOLD: f64 = 0.7;
/// Lowest single score the readiness gate tolerates.
pub const FLOOR_THRESHOLD: f64 = 0.4;
pub const MAX_CONCERNS: usize = 2;
pub const SUCCESS_SCORE: f64 = 0.8;
pub const FAILURE_SCORE: f64 = 0.4;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProposalEvaluator;

impl ProposalEvaluator {
    pub fn evaluate(&self, proposal: &Proposal, org: &FinancialSnapshot) -> EvaluationResult {
        self.evaluate_at(proposal, org, Utc::now())
    }

    pub fn evaluate_at(
        &self,
        proposal: &Proposal,
        org: &FinancialSnapshot,
        at: DateTime<Utc>,
    ) -> EvaluationResult {
        let scores = self.scores(proposal, org);
        let concerns = concerns(&scores);
        let met_count = scores.values().filter(|s| **s >= MET_THRESHOLD).count();
        let met_ratio = met_count as f64 / scores.len() as f64;

        if !is_ready(&scores, &concerns) {
            return EvaluationResult {
                decision: Decision::Pending,
                required_info: Some(required_information(proposal, org)),
                scores,
                concerns,
                final_score: None,
                met_ratio,
                evaluated_at: at,
            };
        }

        let mean = scores.values().sum::<f64>() / scores.len() as f64;
        let mut final_score = mean * (1.0 - 0.1 * concerns.len() as f64) * met_ratio;
        if org.has_trait(CustomerTrait::Cautious) {
            final_score *= 0.9;
        }
        if org.has_trait(CustomerTrait::Cooperative) {
            final_score *= 1.1;
        }

        let decision = if final_score >= SUCCESS_SCORE {
            Decision::Success
        } else if final_score <= FAILURE_SCORE {
            Decision::Failed
        } else {
            Decision::Pending
        };
        tracing::debug!(
            "proposal for {} scored {:.3} -> {}",
            proposal.product_category,
            final_score,
            decision.as_str()
        );

        EvaluationResult {
            decision,
            required_info: (decision == Decision::Pending)
                .then(|| required_information(proposal, org)),
            scores,
            concerns,
            final_score: Some(final_score),
            met_ratio,
            evaluated_at: at,
        }
    }

    pub fn scores(
        &self,
        proposal: &Proposal,
        org: &FinancialSnapshot,
    ) -> BTreeMap<EvaluationCriterion, f64> {
        let mut scores = BTreeMap::new();
        scores.insert(EvaluationCriterion::Cost, cost_score(proposal, org));
        scores.insert(EvaluationCriterion::Risk, risk_score(proposal, org));
        scores.insert(EvaluationCriterion::Benefit, benefit_score(proposal, org));
        scores.insert(
            EvaluationCriterion::Feasibility,
            feasibility_score(proposal, org),
        );
        scores.insert(EvaluationCriterion::Support, support_score(proposal));
        scores.insert(
            EvaluationCriterion::TrackRecord,
            track_record_score(proposal, org),
        );
        scores
    }
}

fn tolerance_factor(risk_tolerance: f64) -> f64 {
    0.5 + 0.5 * risk_tolerance
}

fn cost_score(proposal: &Proposal, org: &FinancialSnapshot) -> f64 {
    let mut score: f64 = 0.5;
    if let Some(cost) = proposal.cost_information.get("total_cost") {
        let ratio = match (value_as_f64(cost), org.annual_revenue) {
            (Some(cost), Some(revenue)) if revenue > 0.0 => cost / revenue,
            _ => {
                tracing::debug!("cost ratio unavailable, using neutral cost score");
                return score;
            }
        };
        if ratio < 0.01 {
            score += 0.3;
        } else if ratio < 0.05 {
            score += 0.1;
        } else {
            score -= 0.2;
        }
    }
    (score * tolerance_factor(org.risk_tolerance)).clamp(0.0, 1.0)
}

fn risk_score(proposal: &Proposal, org: &FinancialSnapshot) -> f64 {
    let mut score: f64 = 0.5;
    match proposal.risks.len() {
        0 => score += 0.3,
        1..=2 => score += 0.1,
        n => score -= 0.1 * n as f64,
    }
    (score * tolerance_factor(org.risk_tolerance)).clamp(0.0, 1.0)
}

fn benefit_score(proposal: &Proposal, org: &FinancialSnapshot) -> f64 {
    let score = 0.5 + 0.1 * proposal.benefits.len() as f64;
    (score * (0.5 + 0.5 * org.financial_literacy)).clamp(0.0, 1.0)
}

fn feasibility_score(proposal: &Proposal, org: &FinancialSnapshot) -> f64 {
    let mut score: f64 = 0.7;
    if proposal.product_category == ProductCategory::Loan {
        let amount = proposal
            .terms
            .get("amount")
            .or_else(|| proposal.terms.get("annual_sales"));
        if let Some(amount) = amount {
            match (value_as_f64(amount), org.annual_revenue) {
                (Some(amount), Some(revenue)) if revenue > 0.0 => {
                    let ratio = amount / revenue;
                    if ratio > 0.5 {
                        score -= 0.3;
                    } else if ratio > 0.3 {
                        score -= 0.1;
                    }
                }
                _ => tracing::debug!("loan amount ratio unavailable, feasibility unchanged"),
            }
        }
    }
    score.clamp(0.0, 1.0)
}

fn support_score(proposal: &Proposal) -> f64 {
    let flag = |key: &str| proposal.support_details.get(key).is_some_and(is_truthy);
    let mut score: f64 = 0.5;
    if flag("dedicated_support") {
        score += 0.2;
    }
    if flag("online_support") {
        score += 0.1;
    }
    if flag("24h_support") {
        score += 0.1;
    }
    score.clamp(0.0, 1.0)
}

fn matches_industry(proposal: &Proposal, org: &FinancialSnapshot) -> bool {
    proposal
        .track_record
        .iter()
        .any(|r| r.industry.as_deref() == Some(org.industry.as_str()))
}

fn track_record_score(proposal: &Proposal, org: &FinancialSnapshot) -> f64 {
    let records = &proposal.track_record;
    if records.is_empty() {
        return 0.5;
    }
    let successes = records.iter().filter(|r| r.success).count();
    let mut score = 0.5 + 0.3 * successes as f64 / records.len() as f64;
    if matches_industry(proposal, org) {
        score += 0.2;
    }
    score.clamp(0.0, 1.0)
}

fn concerns(scores: &BTreeMap<EvaluationCriterion, f64>) -> Vec<String> {
    scores
        .iter()
        .filter(|(_, s)| **s < CONCERN_THRESHOLD)
        .filter_map(|(c, _)| c.concern_label())
        .map(str::to_string)
        .collect()
}

fn is_ready(scores: &BTreeMap<EvaluationCriterion, f64>, concerns: &[String]) -> bool {
    let essentials_met = EvaluationCriterion::ESSENTIAL
        .iter()
        .all(|c| scores.get(c).copied().unwrap_or(0.0) >= MET_THRESHOLD);
    let floor = scores.values().copied().fold(f64::INFINITY, f64::min);
    essentials_met && concerns.len() <= MAX_CONCERNS && floor >= FLOOR_THRESHOLD
}

/// Information the organization would ask for before deciding.
pub fn required_information(proposal: &Proposal, org: &FinancialSnapshot) -> Vec<String> {
    let cost_field = |key: &str| proposal.cost_information.get(key).is_some_and(is_truthy);
    let mut required = Vec::new();
    if !cost_field("total_cost") {
        required.push("総コストの詳細".to_string());
    }
    if !cost_field("payment_terms") {
        required.push("支払条件の詳細".to_string());
    }
    if proposal.risks.is_empty() {
        required.push("リスク評価の詳細".to_string());
    }
    if proposal.support_details.is_empty() {
        required.push("サポート体制の詳細".to_string());
    }
    if proposal.track_record.is_empty() {
        required.push("導入実績の詳細".to_string());
    } else if !matches_industry(proposal, org) {
        required.push("同業種での導入実績".to_string());
    }
    required
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::proposal::TrackRecord;
    use serde_json::json;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn snapshot(traits: Vec<CustomerTrait>) -> FinancialSnapshot {
        FinancialSnapshot {
            annual_revenue: Some(50.0),
            industry: "製造業".into(),
            risk_tolerance: 1.0,
            financial_literacy: 1.0,
            personality_traits: traits,
        }
    }

    fn strong_proposal() -> Proposal {
        let mut p = Proposal::new(ProductCategory::Loan);
        p.terms.insert("amount".into(), json!(5.0));
        p.benefits = vec!["低金利".into(), "据置期間".into(), "迅速審査".into()];
        p.cost_information.insert("total_cost".into(), json!(0.2));
        p.cost_information.insert("payment_terms".into(), json!("元利均等"));
        p.support_details.insert("dedicated_support".into(), json!(true));
        p.support_details.insert("online_support".into(), json!(true));
        p.support_details.insert("24h_support".into(), json!(true));
        p.track_record = vec![
            TrackRecord {
                success: true,
                industry: Some("製造業".into()),
                summary: String::new(),
            },
            TrackRecord {
                success: true,
                industry: Some("小売業".into()),
                summary: String::new(),
            },
        ];
        p
    }

    #[test]
    fn test_strong_proposal_succeeds() {
        let r = ProposalEvaluator.evaluate(&strong_proposal(), &snapshot(vec![]));
        assert!(approx(r.score(EvaluationCriterion::Cost), 0.8));
        assert!(approx(r.score(EvaluationCriterion::Risk), 0.8));
        assert!(approx(r.score(EvaluationCriterion::Feasibility), 0.7));
        assert!(approx(r.score(EvaluationCriterion::Support), 0.9));
        assert!(approx(r.score(EvaluationCriterion::TrackRecord), 1.0));
        assert!(r.concerns.is_empty());
        assert_eq!(r.decision, Decision::Success);
        assert!(r.required_info.is_none());
        assert_eq!(r.met_ratio, 1.0);
    }

    #[test]
    fn test_cautious_trait_can_hold_decision() {
        let mut p = strong_proposal();
        p.support_details.clear();
        p.support_details.insert("online_support".into(), json!(true));
        let plain = ProposalEvaluator.evaluate(&p, &snapshot(vec![]));
        let cautious = ProposalEvaluator.evaluate(&p, &snapshot(vec![CustomerTrait::Cautious]));
        assert!(cautious.final_score.unwrap() < plain.final_score.unwrap());
        assert_eq!(cautious.decision, Decision::Pending);
        assert!(cautious.required_info.is_some());
    }

    #[test]
    fn test_empty_proposal_stays_pending_with_requirements() {
        let p = Proposal::new(ProductCategory::Deposit);
        let mut org = snapshot(vec![]);
        org.risk_tolerance = 0.0;
        let r = ProposalEvaluator.evaluate(&p, &org);
        assert_eq!(r.decision, Decision::Pending);
        assert!(r.final_score.is_none());
        let required = r.required_info.unwrap();
        assert_eq!(
            required,
            vec![
                "総コストの詳細",
                "支払条件の詳細",
                "リスク評価の詳細",
                "サポート体制の詳細",
                "導入実績の詳細",
            ]
        );
        assert!(r.concerns.contains(&"コストが高い".to_string()));
    }

    #[test]
    fn test_cost_ratio_brackets() {
        let org = snapshot(vec![]);
        let mut p = Proposal::new(ProductCategory::Other);
        p.cost_information.insert("total_cost".into(), json!(2.0));
        assert!(approx(cost_score(&p, &org), 0.6));
        p.cost_information.insert("total_cost".into(), json!(10.0));
        assert!(approx(cost_score(&p, &org), 0.3));
    }

    #[test]
    fn test_unparseable_cost_is_neutral() {
        let mut org = snapshot(vec![]);
        org.annual_revenue = None;
        org.risk_tolerance = 0.0;
        let mut p = Proposal::new(ProductCategory::Other);
        p.cost_information.insert("total_cost".into(), json!(1.0));
        assert_eq!(cost_score(&p, &org), 0.5);
    }

    #[test]
    fn test_many_risks_and_large_loans_penalized() {
        let org = snapshot(vec![]);
        let mut p = Proposal::new(ProductCategory::Loan);
        p.risks = (0..4).map(|i| format!("risk{i}")).collect();
        assert!(approx(risk_score(&p, &org), 0.1));

        p.terms.insert("amount".into(), json!(30.0));
        assert!(approx(feasibility_score(&p, &org), 0.4));
        p.terms.insert("amount".into(), json!(20.0));
        assert!(approx(feasibility_score(&p, &org), 0.6));

        let mut deposit = p.clone();
        deposit.product_category = ProductCategory::Deposit;
        assert!(approx(feasibility_score(&deposit, &org), 0.7));
    }

    #[test]
    fn test_missing_same_industry_record_is_requested() {
        let mut p = strong_proposal();
        p.track_record.retain(|r| r.industry.as_deref() != Some("製造業"));
        let required = required_information(&p, &snapshot(vec![]));
        assert_eq!(required, vec!["リスク評価の詳細", "同業種での導入実績"]);
    }

    #[test]
    fn test_evaluation_is_pure() {
        let p = strong_proposal();
        let org = snapshot(vec![CustomerTrait::Cooperative]);
        let at = Utc::now();
        assert_eq!(
            ProposalEvaluator.evaluate_at(&p, &org, at),
            ProposalEvaluator.evaluate_at(&p, &org, at)
        );
    }
}
