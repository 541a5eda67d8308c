use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::persona::{CustomerTrait, ProductCategory};

/// A prior deal cited in support of a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrackRecord {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub summary: String,
}

/// A formal offer. Treated as immutable input to evaluation.
///
/// `cost_information` recognises `total_cost` (same unit as the organization's
/// annual revenue) and `payment_terms`; `support_details` recognises
/// `dedicated_support`, `online_support` and `24h_support`; loan `terms` may
/// carry the requested `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Proposal {
    pub product_category: ProductCategory,
    #[serde(default)]
    pub terms: BTreeMap<String, Value>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub cost_information: BTreeMap<String, Value>,
    #[serde(default)]
    pub support_details: BTreeMap<String, Value>,
    #[serde(default)]
    pub track_record: Vec<TrackRecord>,
}

impl Proposal {
    pub fn new(product_category: ProductCategory) -> Self {
        Self {
            product_category,
            terms: BTreeMap::new(),
            benefits: Vec::new(),
            risks: Vec::new(),
            cost_information: BTreeMap::new(),
            support_details: BTreeMap::new(),
            track_record: Vec::new(),
        }
    }
}

/// Numeric view of a JSON value; numeric strings such as `"1.5億円"` included.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => crate::persona::parse_amount(s),
        _ => None,
    }
}

/// Loose truthiness: non-zero numbers, non-empty strings/collections, `true`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// The organization state a proposal is judged against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    /// Parsed annual revenue; `None` when the free text had no number.
    pub annual_revenue: Option<f64>,
    pub industry: String,
    pub risk_tolerance: f64,
    pub financial_literacy: f64,
    pub personality_traits: Vec<CustomerTrait>,
}

impl FinancialSnapshot {
    pub fn has_trait(&self, t: CustomerTrait) -> bool {
        self.personality_traits.contains(&t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationCriterion {
    Cost,
    Risk,
    Benefit,
    Feasibility,
    Support,
    TrackRecord,
}

impl EvaluationCriterion {
    pub const ALL: [EvaluationCriterion; 6] = [
        EvaluationCriterion::Cost,
        EvaluationCriterion::Risk,
        EvaluationCriterion::Benefit,
        EvaluationCriterion::Feasibility,
        EvaluationCriterion::Support,
        EvaluationCriterion::TrackRecord,
    ];

    /// Criteria that must all be met before a decision is rendered.
    pub const ESSENTIAL: [EvaluationCriterion; 3] = [
        EvaluationCriterion::Cost,
        EvaluationCriterion::Risk,
        EvaluationCriterion::Benefit,
    ];

    /// Concern raised when this criterion scores low. Benefit never raises one.
    pub fn concern_label(&self) -> Option<&'static str> {
        match self {
            EvaluationCriterion::Cost => Some("コストが高い"),
            EvaluationCriterion::Risk => Some("リスクが高い"),
            EvaluationCriterion::Benefit => None,
            EvaluationCriterion::Feasibility => Some("実現可能性に不安がある"),
            EvaluationCriterion::Support => Some("サポート体制が不十分"),
            EvaluationCriterion::TrackRecord => Some("実績が不十分"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Success,
    Pending,
    Failed,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Success => "success",
            Decision::Pending => "pending",
            Decision::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub decision: Decision,
    pub scores: BTreeMap<EvaluationCriterion, f64>,
    pub concerns: Vec<String>,
    /// Present exactly when `decision` is `Pending`.
    pub required_info: Option<Vec<String>>,
    /// Composite score; only computed once the readiness gate passes.
    pub final_score: Option<f64>,
    /// Fraction of criteria scoring at or above the "met" bar.
    pub met_ratio: f64,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn score(&self, criterion: EvaluationCriterion) -> f64 {
        self.scores.get(&criterion).copied().unwrap_or(0.0)
    }
}
