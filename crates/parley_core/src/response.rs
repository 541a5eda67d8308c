use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the organization replies to a seller message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Acceptance,
    Positive,
    Question,
    Neutral,
    Rejection,
    NoResponse,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Acceptance => "acceptance",
            ResponseType::Positive => "positive",
            ResponseType::Question => "question",
            ResponseType::Neutral => "neutral",
            ResponseType::Rejection => "rejection",
            ResponseType::NoResponse => "no_response",
        }
    }

    /// Ordinal used to compare outcomes: higher is better for the seller.
    pub fn favorability(&self) -> u8 {
        match self {
            ResponseType::Acceptance => 5,
            ResponseType::Positive => 4,
            ResponseType::Question => 3,
            ResponseType::Neutral => 2,
            ResponseType::NoResponse => 1,
            ResponseType::Rejection => 0,
        }
    }
}

/// Score cut-offs for the four deterministic response types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseThresholds {
    pub acceptance: f64,
    pub positive: f64,
    pub question: f64,
    pub neutral: f64,
    /// Below `neutral`: chance of silence instead of an explicit rejection.
    pub no_response_probability: f64,
}

impl Default for ResponseThresholds {
    fn default() -> Self {
        Self {
            acceptance: 80.0,
            positive: 60.0,
            question: 40.0,
            neutral: 20.0,
            no_response_probability: 0.3,
        }
    }
}

impl ResponseThresholds {
    pub fn with_overrides(overrides: &BTreeMap<String, f64>) -> Self {
        let mut t = Self::default();
        for (key, value) in overrides {
            match key.as_str() {
                "acceptance" => t.acceptance = *value,
                "positive" => t.positive = *value,
                "question" => t.question = *value,
                "neutral" => t.neutral = *value,
                "no_response_probability" => t.no_response_probability = value.clamp(0.0, 1.0),
                other => tracing::debug!("ignoring unknown response threshold `{}`", other),
            }
        }
        t
    }
}

/// Why the organization turned the seller down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    BudgetConstraint,
    CostConcern,
    RiskConcern,
    AlternativeSolution,
    TimingIssue,
    NoImmediateNeed,
    ExistingRelationship,
    InternalApproval,
    InsufficientInformation,
    TrustConcern,
}

impl RejectionReason {
    pub const ALL: [RejectionReason; 10] = [
        RejectionReason::BudgetConstraint,
        RejectionReason::CostConcern,
        RejectionReason::RiskConcern,
        RejectionReason::AlternativeSolution,
        RejectionReason::TimingIssue,
        RejectionReason::NoImmediateNeed,
        RejectionReason::ExistingRelationship,
        RejectionReason::InternalApproval,
        RejectionReason::InsufficientInformation,
        RejectionReason::TrustConcern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::BudgetConstraint => "budget_constraint",
            RejectionReason::CostConcern => "cost_concern",
            RejectionReason::RiskConcern => "risk_concern",
            RejectionReason::AlternativeSolution => "alternative_solution",
            RejectionReason::TimingIssue => "timing_issue",
            RejectionReason::NoImmediateNeed => "no_immediate_need",
            RejectionReason::ExistingRelationship => "existing_relationship",
            RejectionReason::InternalApproval => "internal_approval",
            RejectionReason::InsufficientInformation => "insufficient_information",
            RejectionReason::TrustConcern => "trust_concern",
        }
    }

    /// Phrase handed to the reply prompt.
    pub fn label(&self) -> &'static str {
        match self {
            RejectionReason::BudgetConstraint => "今期の予算に余裕がない",
            RejectionReason::CostConcern => "コスト負担が大きい",
            RejectionReason::RiskConcern => "リスクが許容範囲を超える",
            RejectionReason::AlternativeSolution => "他の手段を検討している",
            RejectionReason::TimingIssue => "導入の時期ではない",
            RejectionReason::NoImmediateNeed => "当面の必要性がない",
            RejectionReason::ExistingRelationship => "既存の取引先で足りている",
            RejectionReason::InternalApproval => "社内の承認が得られない",
            RejectionReason::InsufficientInformation => "判断材料が不足している",
            RejectionReason::TrustConcern => "提案内容に確信が持てない",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorability_orders_outcomes() {
        assert!(ResponseType::Acceptance.favorability() > ResponseType::Positive.favorability());
        assert!(ResponseType::Neutral.favorability() > ResponseType::NoResponse.favorability());
        assert!(ResponseType::NoResponse.favorability() > ResponseType::Rejection.favorability());
    }

    #[test]
    fn test_response_threshold_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("acceptance".to_string(), 90.0);
        overrides.insert("no_response_probability".to_string(), 2.0);
        let t = ResponseThresholds::with_overrides(&overrides);
        assert_eq!(t.acceptance, 90.0);
        assert_eq!(t.no_response_probability, 1.0);
        assert_eq!(t.neutral, 20.0);
    }

    #[test]
    fn test_rejection_reason_serde_names() {
        let json = serde_json::to_string(&RejectionReason::NoImmediateNeed).unwrap();
        assert_eq!(json, "\"no_immediate_need\"");
        assert_eq!(RejectionReason::ALL.len(), 10);
    }
}
