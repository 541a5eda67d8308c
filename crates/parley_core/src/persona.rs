//! Seller and organization personas.
//!
//! The organization persona is the single mutable root of a campaign: its
//! conversation context, negotiation progress, interest history and contact
//! are owned by it and mutated in place by the orchestrator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::context::ConversationContext;
use crate::error::{Result, SimulationError};
use crate::interest::InterestScore;
use crate::negotiation::{DecisionRecord, NegotiationProgress};
use crate::proposal::{EvaluationResult, FinancialSnapshot};
use crate::response::{RejectionReason, ResponseType};

// ============================================================================
// Enumerations
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Loan,
    Investment,
    Deposit,
    Insurance,
    Other,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 5] = [
        ProductCategory::Loan,
        ProductCategory::Investment,
        ProductCategory::Deposit,
        ProductCategory::Insurance,
        ProductCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Loan => "loan",
            ProductCategory::Investment => "investment",
            ProductCategory::Deposit => "deposit",
            ProductCategory::Insurance => "insurance",
            ProductCategory::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProductCategory::Loan => "融資",
            ProductCategory::Investment => "投資商品",
            ProductCategory::Deposit => "預金商品",
            ProductCategory::Insurance => "保険商品",
            ProductCategory::Other => "その他",
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seller tenure, ordered from least to most experienced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Junior,
    Middle,
    Senior,
    Veteran,
}

impl ExperienceLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "入社1-3年目",
            ExperienceLevel::Middle => "入社4-7年目",
            ExperienceLevel::Senior => "入社8-15年目",
            ExperienceLevel::Veteran => "入社16年以上",
        }
    }

    fn success_multiplier(&self) -> f64 {
        match self {
            ExperienceLevel::Junior => 0.7,
            ExperienceLevel::Middle => 0.85,
            ExperienceLevel::Senior => 1.0,
            ExperienceLevel::Veteran => 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SellerTrait {
    Aggressive,
    Cautious,
    Friendly,
    Professional,
    Inexperienced,
    Knowledgeable,
    Impatient,
    Patient,
}

impl SellerTrait {
    pub fn label(&self) -> &'static str {
        match self {
            SellerTrait::Aggressive => "積極的",
            SellerTrait::Cautious => "慎重",
            SellerTrait::Friendly => "友好的",
            SellerTrait::Professional => "プロフェッショナル",
            SellerTrait::Inexperienced => "未熟",
            SellerTrait::Knowledgeable => "知識豊富",
            SellerTrait::Impatient => "せっかち",
            SellerTrait::Patient => "忍耐強い",
        }
    }

    fn success_multiplier(&self) -> f64 {
        match self {
            SellerTrait::Aggressive => 1.1,
            SellerTrait::Cautious => 0.9,
            SellerTrait::Friendly => 1.05,
            SellerTrait::Professional => 1.15,
            SellerTrait::Inexperienced => 0.8,
            SellerTrait::Knowledgeable => 1.1,
            SellerTrait::Impatient => 0.9,
            SellerTrait::Patient => 1.05,
        }
    }
}

/// Traits shared by organizations and their contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTrait {
    Authoritative,
    Cooperative,
    Skeptical,
    Trusting,
    DetailOriented,
    BigPicture,
    Impulsive,
    Analytical,
    Cautious,
}

impl CustomerTrait {
    pub fn label(&self) -> &'static str {
        match self {
            CustomerTrait::Authoritative => "高圧的",
            CustomerTrait::Cooperative => "協力的",
            CustomerTrait::Skeptical => "懐疑的",
            CustomerTrait::Trusting => "信頼的",
            CustomerTrait::DetailOriented => "細部重視",
            CustomerTrait::BigPicture => "大局的",
            CustomerTrait::Impulsive => "衝動的",
            CustomerTrait::Analytical => "分析的",
            CustomerTrait::Cautious => "慎重",
        }
    }
}

// ============================================================================
// Persona variants
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaKind {
    Seller,
    Organization,
}

/// A persona of either kind, tagged by `type` when serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Persona {
    Seller(SellerPersona),
    Organization(OrganizationPersona),
}

impl Persona {
    pub fn id(&self) -> &str {
        match self {
            Persona::Seller(s) => &s.id,
            Persona::Organization(o) => &o.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Persona::Seller(s) => &s.name,
            Persona::Organization(o) => &o.name,
        }
    }

    pub fn kind(&self) -> PersonaKind {
        match self {
            Persona::Seller(_) => PersonaKind::Seller,
            Persona::Organization(_) => PersonaKind::Organization,
        }
    }
}

// ============================================================================
// Seller
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SellerPersona {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub area: String,
    pub experience_level: ExperienceLevel,
    pub personality_traits: Vec<SellerTrait>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub specialties: Vec<ProductCategory>,
    #[serde(default)]
    pub communication_style: String,
    pub stress_tolerance: f64,
    pub adaptability: f64,
    pub product_knowledge: f64,
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
}

fn default_success_rate() -> f64 {
    0.5
}

impl SellerPersona {
    /// Expected success rate derived from tenure, traits and aptitudes.
    pub fn calculate_success_rate(&self) -> f64 {
        let mut rate = 0.5 * self.experience_level.success_multiplier();
        for t in &self.personality_traits {
            rate *= t.success_multiplier();
        }
        for aptitude in [
            self.stress_tolerance,
            self.adaptability,
            self.product_knowledge,
        ] {
            rate *= 0.3 + 0.7 * aptitude.clamp(0.0, 1.0);
        }
        rate.clamp(0.0, 1.0)
    }

    pub fn refresh_success_rate(&mut self) {
        self.success_rate = self.calculate_success_rate();
    }

    pub fn has_trait(&self, t: SellerTrait) -> bool {
        self.personality_traits.contains(&t)
    }
}

// ============================================================================
// Contact
// ============================================================================

/// The individual at the organization who receives the seller's messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContactPersona {
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub years_in_company: u32,
    pub personality_traits: Vec<CustomerTrait>,
    #[serde(default)]
    pub decision_making_style: String,
    pub risk_tolerance: f64,
    pub financial_literacy: f64,
    #[serde(default)]
    pub communication_style: String,
    pub stress_tolerance: f64,
    pub adaptability: f64,
}

/// How a contact tends to write back, each axis in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseStyle {
    pub formality: f64,
    pub detail: f64,
    pub speed: f64,
    pub cooperation: f64,
}

impl ResponseStyle {
    /// One-line Japanese rendering for reply prompts.
    pub fn describe(&self) -> String {
        format!(
            "フォーマル度{:.1}、詳細度{:.1}、返信速度{:.1}、協力度{:.1}",
            self.formality, self.detail, self.speed, self.cooperation
        )
    }
}

impl ContactPersona {
    pub fn has_trait(&self, t: CustomerTrait) -> bool {
        self.personality_traits.contains(&t)
    }

    pub fn response_style(&self) -> ResponseStyle {
        let mut s = ResponseStyle {
            formality: 0.5,
            detail: 0.5,
            speed: 0.5,
            cooperation: 0.5,
        };
        for t in &self.personality_traits {
            match t {
                CustomerTrait::Authoritative => {
                    s.formality += 0.2;
                    s.cooperation -= 0.1;
                }
                CustomerTrait::Cooperative | CustomerTrait::Trusting => {
                    s.cooperation += 0.2;
                    s.speed += 0.1;
                }
                CustomerTrait::Skeptical => {
                    s.detail += 0.2;
                    s.speed -= 0.1;
                }
                CustomerTrait::DetailOriented | CustomerTrait::Analytical => {
                    s.detail += 0.3;
                    s.speed -= 0.2;
                }
                CustomerTrait::BigPicture => {
                    s.detail -= 0.2;
                    s.speed += 0.1;
                }
                CustomerTrait::Impulsive => {
                    s.speed += 0.3;
                    s.detail -= 0.2;
                }
                CustomerTrait::Cautious => {}
            }
        }
        s.formality += 0.1 * f64::from(self.years_in_company) / 10.0;
        s.detail += 0.2 * self.financial_literacy;
        s.speed += 0.2 * self.adaptability;
        s.cooperation += 0.2 * self.stress_tolerance;

        ResponseStyle {
            formality: s.formality.clamp(0.0, 1.0),
            detail: s.detail.clamp(0.0, 1.0),
            speed: s.speed.clamp(0.0, 1.0),
            cooperation: s.cooperation.clamp(0.0, 1.0),
        }
    }
}

// ============================================================================
// Organization
// ============================================================================

fn default_product_interest() -> BTreeMap<ProductCategory, f64> {
    ProductCategory::ALL.iter().map(|c| (*c, 0.5)).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationPersona {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub industry: String,
    #[serde(default)]
    pub business_description: String,
    pub employee_count: u32,
    /// Free text such as `"12.5億円"`.
    pub annual_revenue: String,
    #[serde(default)]
    pub funding_status: String,
    #[serde(default)]
    pub future_plans: String,
    #[serde(default)]
    pub banking_relationships: String,
    #[serde(default)]
    pub financial_needs: String,
    pub personality_traits: Vec<CustomerTrait>,
    #[serde(default)]
    pub decision_making_style: String,
    pub risk_tolerance: f64,
    pub financial_literacy: f64,
    #[serde(default = "default_product_interest")]
    pub product_interest: BTreeMap<ProductCategory, f64>,
    #[serde(default)]
    pub contact: Option<ContactPersona>,

    #[serde(default)]
    pub context: ConversationContext,
    #[serde(default)]
    pub current_interest: Option<InterestScore>,
    #[serde(default)]
    pub response_history: Vec<ResponseType>,
    #[serde(default)]
    pub negotiation: NegotiationProgress,
    #[serde(default)]
    pub decision: DecisionRecord,
}

impl OrganizationPersona {
    pub fn has_trait(&self, t: CustomerTrait) -> bool {
        self.personality_traits.contains(&t)
    }

    /// The contact persona, or `MissingContact` when none is configured.
    pub fn contact(&self) -> Result<&ContactPersona> {
        self.contact
            .as_ref()
            .ok_or_else(|| SimulationError::MissingContact {
                organization: self.id.clone(),
            })
    }

    /// Leading number of `annual_revenue`, if any.
    pub fn revenue_amount(&self) -> Option<f64> {
        parse_amount(&self.annual_revenue)
    }

    pub fn interest_in(&self, category: ProductCategory) -> Option<f64> {
        self.product_interest.get(&category).copied()
    }

    pub fn current_score(&self) -> Option<f64> {
        self.current_interest.as_ref().map(|s| s.score)
    }

    pub fn record_interest(&mut self, score: InterestScore) {
        self.context.interest_history.push(score.clone());
        self.current_interest = Some(score);
    }

    pub fn record_response(&mut self, response: ResponseType) {
        self.response_history.push(response);
    }

    pub fn record_rejection(&mut self, reason: RejectionReason) {
        self.context.rejection_history.push(reason);
    }

    pub fn rejection_history(&self) -> &[RejectionReason] {
        &self.context.rejection_history
    }

    pub fn financial_snapshot(&self) -> FinancialSnapshot {
        FinancialSnapshot {
            annual_revenue: self.revenue_amount(),
            industry: self.industry.clone(),
            risk_tolerance: self.risk_tolerance,
            financial_literacy: self.financial_literacy,
            personality_traits: self.personality_traits.clone(),
        }
    }

    /// Folds an evaluation into negotiation progress and the decision record.
    pub fn record_evaluation(&mut self, result: &EvaluationResult) {
        self.negotiation.absorb_evaluation(result);
        self.decision = DecisionRecord::from_evaluation(result);
    }
}

/// Parses the first decimal number in `text`, ignoring thousands separators.
///
/// `"年商12.5億円"` yields `12.5`, `"1,200億円"` yields `1200.0`.
pub fn parse_amount(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    digits.trim_end_matches('.').parse().ok()
}
